//! End-to-end workflow tests over a synthetic renderer.

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use letterhead_crop::encode::{decode_data_uri, ArtifactEncoder, DataUriEncoder};
use letterhead_crop::geometry::{PercentCrop, PixelCrop};
use letterhead_crop::raster::{PageRenderer, RasterImage};
use letterhead_crop::session::SessionPhase;
use letterhead_crop::workflow::CropWorkflow;
use letterhead_crop::{crop_first_page, CropError, CropOptions};

/// Renders a deterministic 800x1000 gradient regardless of the input bytes.
struct GradientRenderer;

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8, 255])
    }))
}

impl PageRenderer for GradientRenderer {
    async fn render_first_page(&self, _bytes: &[u8]) -> Result<RasterImage, CropError> {
        RasterImage::new(gradient(800, 1000))
    }
}

/// Renderer that always reports an unreadable document.
struct RejectingRenderer;

impl PageRenderer for RejectingRenderer {
    async fn render_first_page(&self, _bytes: &[u8]) -> Result<RasterImage, CropError> {
        Err(CropError::UnsupportedDocument("not a PDF".to_string()))
    }
}

/// Encoder that always fails, for exercising commit rollback.
struct BrokenEncoder;

impl ArtifactEncoder for BrokenEncoder {
    async fn encode(&self, _image: &DynamicImage) -> Result<String, CropError> {
        Err(CropError::EncodingFailure("no backing surface".to_string()))
    }
}

fn workflow() -> CropWorkflow<GradientRenderer, DataUriEncoder> {
    CropWorkflow::new(GradientRenderer, DataUriEncoder::png(), CropOptions::default())
}

#[tokio::test]
async fn commit_produces_the_exact_natural_region() {
    let mut wf = workflow();
    let id = wf.start(b"%PDF").await.unwrap();
    assert_eq!(wf.phase(id).unwrap(), SessionPhase::Ready);

    wf.complete_selection(id, PixelCrop::new(50.0, 50.0, 700.0, 200.0))
        .unwrap();
    let artifact = wf.commit(id, "header").await.unwrap();

    assert_eq!(artifact.name, "header");
    assert_eq!((artifact.width, artifact.height), (700, 200));

    let decoded = image::load_from_memory(&decode_data_uri(&artifact.payload).unwrap()).unwrap();
    assert_eq!(decoded.dimensions(), (700, 200));
    // Top-left output pixel comes from (50, 50) of the raster.
    assert_eq!(decoded.get_pixel(0, 0), gradient(800, 1000).get_pixel(50, 50));
}

#[tokio::test]
async fn zoomed_selection_produces_the_same_artifact() {
    // At 50% zoom the display is 400x500; the half-size rectangle covers the
    // same natural-space region and must yield the same 700x200 output.
    let mut wf = workflow();

    let full = wf.start(b"%PDF").await.unwrap();
    wf.complete_selection(full, PixelCrop::new(50.0, 50.0, 700.0, 200.0))
        .unwrap();
    let at_full = wf.commit(full, "header").await.unwrap();

    let half = wf.start(b"%PDF").await.unwrap();
    wf.set_zoom(half, 0.5).unwrap();
    assert_eq!(wf.display(half).unwrap().displayed_width, 400.0);
    wf.complete_selection(half, PixelCrop::new(25.0, 25.0, 350.0, 100.0))
        .unwrap();
    let at_half = wf.commit(half, "header").await.unwrap();

    assert_eq!((at_half.width, at_half.height), (700, 200));
    assert_eq!(at_full.payload, at_half.payload);
}

#[tokio::test]
async fn commit_without_a_completed_rect_never_produces_an_artifact() {
    let mut wf = workflow();
    let id = wf.start(b"%PDF").await.unwrap();

    let err = wf.commit(id, "header").await.unwrap_err();
    assert!(matches!(err, CropError::IncompleteSelection(_)));

    // The session stays usable: complete a selection and commit again.
    wf.complete_selection(id, PixelCrop::new(0.0, 0.0, 400.0, 100.0))
        .unwrap();
    assert!(wf.commit(id, "header").await.is_ok());
}

#[tokio::test]
async fn commit_with_a_blank_name_is_rejected() {
    let mut wf = workflow();
    let id = wf.start(b"%PDF").await.unwrap();
    wf.complete_selection(id, PixelCrop::new(0.0, 0.0, 400.0, 100.0))
        .unwrap();

    let err = wf.commit(id, "   ").await.unwrap_err();
    assert!(matches!(err, CropError::IncompleteSelection(_)));
}

#[tokio::test]
async fn cancel_kills_the_handle() {
    let mut wf = workflow();
    let id = wf.start(b"%PDF").await.unwrap();
    wf.update_selection(id, PercentCrop::new(0.0, 0.0, 50.0, 50.0))
        .unwrap();

    wf.cancel(id).unwrap();

    assert!(matches!(
        wf.update_selection(id, PercentCrop::new(0.0, 0.0, 50.0, 50.0)),
        Err(CropError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        wf.set_zoom(id, 1.5),
        Err(CropError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        wf.commit(id, "header").await,
        Err(CropError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        wf.cancel(id),
        Err(CropError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn committed_sessions_release_their_handle() {
    let mut wf = workflow();
    let id = wf.start(b"%PDF").await.unwrap();
    wf.complete_selection(id, PixelCrop::new(0.0, 0.0, 400.0, 100.0))
        .unwrap();
    wf.commit(id, "header").await.unwrap();

    assert!(matches!(
        wf.display(id),
        Err(CropError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn reset_restores_the_default_band() {
    let mut wf = workflow();
    let id = wf.start(b"%PDF").await.unwrap();
    let default = wf.selection(id).unwrap();

    wf.update_selection(id, PercentCrop::new(20.0, 40.0, 30.0, 10.0))
        .unwrap();
    wf.complete_selection(id, PixelCrop::new(160.0, 400.0, 240.0, 100.0))
        .unwrap();

    wf.reset(id).unwrap();
    assert_eq!(wf.selection(id).unwrap(), default);

    // Without re-confirming a selection, commit is rejected again.
    let err = wf.commit(id, "header").await.unwrap_err();
    assert!(matches!(err, CropError::IncompleteSelection(_)));
}

#[tokio::test]
async fn zoom_change_forces_reconfirmation() {
    let mut wf = workflow();
    let id = wf.start(b"%PDF").await.unwrap();
    wf.complete_selection(id, PixelCrop::new(0.0, 0.0, 400.0, 100.0))
        .unwrap();

    wf.set_zoom(id, 0.5).unwrap();

    let err = wf.commit(id, "header").await.unwrap_err();
    assert!(matches!(err, CropError::IncompleteSelection(_)));
}

#[tokio::test]
async fn render_failure_surfaces_from_start() {
    let mut wf = CropWorkflow::new(
        RejectingRenderer,
        DataUriEncoder::png(),
        CropOptions::default(),
    );
    let err = wf.start(b"garbage").await.unwrap_err();
    assert!(matches!(err, CropError::UnsupportedDocument(_)));
}

#[tokio::test]
async fn encoding_failure_rolls_the_session_back() {
    let mut wf = CropWorkflow::new(GradientRenderer, BrokenEncoder, CropOptions::default());
    let id = wf.start(b"%PDF").await.unwrap();
    wf.complete_selection(id, PixelCrop::new(0.0, 0.0, 400.0, 100.0))
        .unwrap();

    let err = wf.commit(id, "header").await.unwrap_err();
    assert!(matches!(err, CropError::EncodingFailure(_)));

    // Pre-commit state is restored; cancel still works on the live handle.
    wf.cancel(id).unwrap();
}

#[tokio::test]
async fn one_shot_crop_uses_the_default_band() {
    let artifact = crop_first_page(
        GradientRenderer,
        DataUriEncoder::png(),
        b"%PDF",
        None,
        "letterhead",
        CropOptions::default(),
    )
    .await
    .unwrap();

    // Full width, top quarter of the 800x1000 raster.
    assert_eq!((artifact.width, artifact.height), (800, 250));
}
