//! First-page rasterization: the renderer contract, a lopdf-based document
//! probe, and the pdfium rendering backend.

use image::{DynamicImage, GenericImageView};
use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::CropError;

/// Raster image of a document's first page.
///
/// Immutable once produced; owned by the session for the duration of one
/// crop interaction and dropped when the session ends.
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
}

impl RasterImage {
    pub fn new(image: DynamicImage) -> Result<Self, CropError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CropError::RenderFailure(
                "renderer produced an empty image".to_string(),
            ));
        }
        Ok(Self { image })
    }

    pub fn natural_width(&self) -> u32 {
        self.image.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Pluggable page-1 rasterizer.
///
/// Identical input bytes must produce a raster of identical dimensions on
/// repeated calls. Implementations must not mutate the input and must render
/// only the first page; further pages are ignored.
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    async fn render_first_page(&self, bytes: &[u8]) -> Result<RasterImage, CropError>;
}

/// Document geometry reported by [`probe_document`].
#[derive(Debug, Clone, Copy)]
pub struct DocumentInfo {
    pub page_count: usize,
    /// First-page width in PDF points (72 points = 1 inch)
    pub page_width_pts: f32,
    /// First-page height in PDF points
    pub page_height_pts: f32,
}

/// Parse and sanity-check the document without rendering it.
///
/// Rejects anything lopdf cannot load as `UnsupportedDocument`. Multi-page
/// documents are accepted; only page 1 is ever rasterized.
pub fn probe_document(bytes: &[u8]) -> Result<DocumentInfo, CropError> {
    let doc =
        Document::load_mem(bytes).map_err(|e| CropError::UnsupportedDocument(e.to_string()))?;

    let pages = doc.get_pages();
    let (_, &first_page) = pages
        .iter()
        .next()
        .ok_or_else(|| CropError::UnsupportedDocument("document has no pages".to_string()))?;

    if pages.len() > 1 {
        debug!(
            "document has {} pages, truncating to page 1",
            pages.len()
        );
    }

    // US Letter fallback when the page carries no usable MediaBox
    let (page_width_pts, page_height_pts) =
        page_media_box(&doc, first_page).unwrap_or((612.0, 792.0));

    Ok(DocumentInfo {
        page_count: pages.len(),
        page_width_pts,
        page_height_pts,
    })
}

/// Read a page's MediaBox, checking the parent page-tree node if the page
/// itself doesn't carry one.
fn page_media_box(doc: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let page_dict = match doc.get_object(page_id) {
        Ok(Object::Dictionary(d)) => d.clone(),
        _ => return None,
    };

    if let Some(size) = media_box_from_dict(doc, &page_dict) {
        return Some(size);
    }

    if let Ok(Object::Reference(parent_id)) = page_dict.get(b"Parent") {
        if let Ok(Object::Dictionary(parent_dict)) = doc.get_object(*parent_id) {
            return media_box_from_dict(doc, parent_dict);
        }
    }

    None
}

fn media_box_from_dict(doc: &Document, dict: &Dictionary) -> Option<(f32, f32)> {
    let media_box = dict.get(b"MediaBox").ok()?;
    let media_box = match media_box {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };

    let arr = match media_box {
        Object::Array(arr) if arr.len() >= 4 => arr,
        _ => return None,
    };

    let get_num = |obj: &Object| -> Option<f32> {
        match obj {
            Object::Integer(n) => Some(*n as f32),
            Object::Real(n) => Some(*n),
            _ => None,
        }
    };

    let x0 = get_num(&arr[0])?;
    let y0 = get_num(&arr[1])?;
    let x1 = get_num(&arr[2])?;
    let y1 = get_num(&arr[3])?;

    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((width, height))
}

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRenderer;

#[cfg(feature = "pdfium")]
mod pdfium {
    use std::time::Duration;

    use log::debug;
    use pdfium_render::prelude::*;

    use super::{probe_document, PageRenderer, RasterImage};
    use crate::CropError;

    /// Renders page 1 through the pdfium library.
    ///
    /// The blocking pdfium call runs on the tokio blocking pool and is
    /// bounded by a timeout; expiry surfaces as `RenderFailure`.
    #[derive(Debug, Clone)]
    pub struct PdfiumRenderer {
        target_width: u32,
        timeout: Duration,
    }

    impl PdfiumRenderer {
        pub fn new(target_width: u32, timeout: Duration) -> Self {
            Self {
                target_width: target_width.max(1),
                timeout,
            }
        }

        fn render_sync(bytes: &[u8], target_width: u32) -> Result<RasterImage, CropError> {
            let pdfium = Pdfium::new(
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|e| CropError::RenderFailure(format!("pdfium unavailable: {e}")))?,
            );

            let document = pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|e| CropError::RenderFailure(format!("failed to load document: {e}")))?;

            let page = document
                .pages()
                .get(0)
                .map_err(|e| CropError::RenderFailure(format!("failed to get page 1: {e}")))?;

            let config = PdfRenderConfig::new().set_target_width(target_width as i32);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| CropError::RenderFailure(format!("failed to render page: {e}")))?;

            RasterImage::new(bitmap.as_image())
        }
    }

    impl PageRenderer for PdfiumRenderer {
        async fn render_first_page(&self, bytes: &[u8]) -> Result<RasterImage, CropError> {
            let info = probe_document(bytes)?;
            debug!(
                "rendering page 1 of {} ({:.1}x{:.1} pt) at {} px wide",
                info.page_count, info.page_width_pts, info.page_height_pts, self.target_width
            );

            let bytes = bytes.to_vec();
            let target_width = self.target_width;
            let render = tokio::task::spawn_blocking(move || {
                Self::render_sync(&bytes, target_width)
            });

            match tokio::time::timeout(self.timeout, render).await {
                Ok(Ok(result)) => result,
                Ok(Err(join)) => Err(CropError::RenderFailure(format!(
                    "renderer task failed: {join}"
                ))),
                Err(_) => Err(CropError::RenderFailure(format!(
                    "rendering timed out after {:?}",
                    self.timeout
                ))),
            }
        }
    }
}
