//! Artifact encoding: turn a cropped raster region into a portable payload.

use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, ImageFormat};

use crate::CropError;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Output encoding for committed artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Png,
    /// JPEG at the given quality (1-100)
    Jpeg { quality: u8 },
}

/// Pluggable image-encoding capability.
#[allow(async_fn_in_trait)]
pub trait ArtifactEncoder {
    async fn encode(&self, image: &DynamicImage) -> Result<String, CropError>;
}

/// Encodes crops as self-describing `data:` URIs.
#[derive(Debug, Clone, Copy)]
pub struct DataUriEncoder {
    format: PayloadFormat,
}

impl DataUriEncoder {
    pub fn new(format: PayloadFormat) -> Self {
        Self { format }
    }

    pub fn png() -> Self {
        Self::new(PayloadFormat::Png)
    }

    fn encode_bytes(&self, image: &DynamicImage) -> Result<(Vec<u8>, &'static str), CropError> {
        match self.format {
            PayloadFormat::Png => {
                let mut bytes = Vec::new();
                image
                    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                    .map_err(|e| CropError::EncodingFailure(e.to_string()))?;
                Ok((bytes, "image/png"))
            }
            PayloadFormat::Jpeg { quality } => {
                if quality == 0 || quality > 100 {
                    return Err(CropError::EncodingFailure(
                        "quality must be between 1 and 100".to_string(),
                    ));
                }
                let rgb = image.to_rgb8();
                let (width, height) = rgb.dimensions();

                let mut bytes = Vec::new();
                let mut encoder = jpeg_encoder::Encoder::new(&mut bytes, quality);
                encoder.set_sampling_factor(jpeg_encoder::SamplingFactor::R_4_2_0);
                encoder
                    .encode(
                        rgb.as_raw(),
                        width as u16,
                        height as u16,
                        jpeg_encoder::ColorType::Rgb,
                    )
                    .map_err(|e| CropError::EncodingFailure(e.to_string()))?;
                Ok((bytes, "image/jpeg"))
            }
        }
    }
}

impl ArtifactEncoder for DataUriEncoder {
    async fn encode(&self, image: &DynamicImage) -> Result<String, CropError> {
        let (bytes, media_type) = self.encode_bytes(image)?;
        if bytes.is_empty() {
            return Err(CropError::EncodingFailure(
                "encoder produced no output".to_string(),
            ));
        }
        Ok(format!(
            "data:{};base64,{}",
            media_type,
            BASE64.encode(&bytes)
        ))
    }
}

/// Decode a `data:` URI payload back into raw image bytes.
pub fn decode_data_uri(payload: &str) -> Result<Vec<u8>, CropError> {
    let encoded = payload
        .split_once(";base64,")
        .map(|(_, rest)| rest)
        .ok_or_else(|| {
            CropError::EncodingFailure("payload is not a base64 data URI".to_string())
        })?;
    BASE64
        .decode(encoded)
        .map_err(|e| CropError::EncodingFailure(e.to_string()))
}
