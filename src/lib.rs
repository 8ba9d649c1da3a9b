//! Letterhead Crop Library
//!
//! Core logic for turning the first page of a PDF into a raster image and
//! cutting a selected region of it into a reusable header asset.
//!
//! The pipeline is: [`raster::PageRenderer`] renders page 1 into a
//! [`raster::RasterImage`]; a [`session::CropSession`] tracks the selection a
//! user makes over the displayed image at some zoom level; on commit,
//! [`extract::extract_region`] maps the displayed-space rectangle back into
//! the raster's own pixel grid and an [`encode::ArtifactEncoder`] turns the
//! region into a portable payload. [`workflow::CropWorkflow`] sequences the
//! whole thing and owns the sessions.

pub mod encode;
pub mod extract;
pub mod geometry;
pub mod raster;
pub mod session;
pub mod store;
pub mod workflow;

use encode::ArtifactEncoder;
use geometry::PixelCrop;
use raster::PageRenderer;
use workflow::CropWorkflow;

/// Options for a crop session
#[derive(Debug, Clone)]
pub struct CropOptions {
    /// Fraction of the displayed height pre-selected as the header band
    pub default_band_fraction: f32,
    /// Minimum selection width in displayed-space pixels
    pub min_selection_width: f32,
    /// Minimum selection height in displayed-space pixels
    pub min_selection_height: f32,
    /// Lowest accepted zoom factor
    pub min_zoom: f32,
    /// Highest accepted zoom factor
    pub max_zoom: f32,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            default_band_fraction: 0.25,
            min_selection_width: 50.0,
            min_selection_height: 30.0,
            min_zoom: 0.5,
            max_zoom: 2.0,
        }
    }
}

/// Error type for crop operations
#[derive(Debug, thiserror::Error)]
pub enum CropError {
    /// The input bytes are not a recognizable PDF document.
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),
    /// The rendering backend failed or timed out.
    #[error("failed to render document: {0}")]
    RenderFailure(String),
    /// Commit prerequisites are missing; the session is still usable.
    #[error("selection is incomplete: {0}")]
    IncompleteSelection(&'static str),
    /// The selection maps to an empty region of the rendered page.
    #[error("crop region lies outside the rendered page")]
    DegenerateCrop,
    /// The encoding capability produced no usable payload.
    #[error("failed to encode cropped image: {0}")]
    EncodingFailure(String),
    /// The call is not allowed in the session's current phase.
    #[error("{op} is not valid while the session is {phase}")]
    InvalidStateTransition {
        op: &'static str,
        phase: &'static str,
    },
    /// Cancel arrived while a commit was still in flight.
    #[error("cannot cancel while a commit is in progress")]
    CommitInProgress,
}

/// Final named artifact handed to the caller on a successful commit.
#[derive(Debug, Clone)]
pub struct CropArtifact {
    pub name: String,
    /// Self-describing encoded image, e.g. a `data:image/png;base64,` URI.
    pub payload: String,
    /// Output width in natural-space pixels
    pub width: u32,
    /// Output height in natural-space pixels
    pub height: u32,
}

/// Render, select and commit in one call, at 100% zoom.
///
/// `rect` is a displayed-space rectangle; when `None`, the default header
/// band from `options` is used. Interactive callers that need zoom or
/// incremental selection updates should drive [`workflow::CropWorkflow`]
/// directly.
pub async fn crop_first_page<R, E>(
    renderer: R,
    encoder: E,
    bytes: &[u8],
    rect: Option<PixelCrop>,
    name: &str,
    options: CropOptions,
) -> Result<CropArtifact, CropError>
where
    R: PageRenderer,
    E: ArtifactEncoder,
{
    let mut workflow = CropWorkflow::new(renderer, encoder, options);
    let id = workflow.start(bytes).await?;
    let rect = match rect {
        Some(rect) => rect,
        None => workflow.selection(id)?.to_pixels(&workflow.display(id)?),
    };
    workflow.complete_selection(id, rect)?;
    workflow.commit(id, name).await
}
