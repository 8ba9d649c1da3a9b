//! Interactive crop session state machine.

use log::debug;

use crate::geometry::{DisplayGeometry, PercentCrop, PixelCrop};
use crate::raster::RasterImage;
use crate::{CropError, CropOptions};

/// Lifecycle phase of a crop session.
///
/// `Ready` and `Adjusting` are the interactive phases; `Committing` is held
/// across the encode suspend point; `Committed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Ready,
    Adjusting,
    Committing,
    Committed,
    Cancelled,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Committed | SessionPhase::Cancelled)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            SessionPhase::Ready => "ready",
            SessionPhase::Adjusting => "adjusting",
            SessionPhase::Committing => "committing",
            SessionPhase::Committed => "committed",
            SessionPhase::Cancelled => "cancelled",
        }
    }
}

/// State for one interactive crop over a rendered first page.
///
/// Owns the raster for the duration of the interaction. The in-progress
/// selection lives in percent space and survives zoom changes; the completed
/// rectangle is displayed-space pixels and is invalidated by them.
pub struct CropSession {
    raster: RasterImage,
    display: DisplayGeometry,
    selection: PercentCrop,
    completed: Option<PixelCrop>,
    phase: SessionPhase,
    options: CropOptions,
}

impl CropSession {
    pub fn new(raster: RasterImage, options: CropOptions) -> Self {
        let display =
            DisplayGeometry::at_scale(raster.natural_width(), raster.natural_height(), 1.0);
        let selection = PercentCrop::band(options.default_band_fraction);
        Self {
            raster,
            display,
            selection,
            completed: None,
            phase: SessionPhase::Ready,
            options,
        }
    }

    pub fn raster(&self) -> &RasterImage {
        &self.raster
    }

    pub fn display(&self) -> DisplayGeometry {
        self.display
    }

    pub fn selection(&self) -> PercentCrop {
        self.selection
    }

    pub fn completed(&self) -> Option<PixelCrop> {
        self.completed
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn invalid(&self, op: &'static str) -> CropError {
        CropError::InvalidStateTransition {
            op,
            phase: self.phase.name(),
        }
    }

    /// Continuous drag update; percent-space, clamped into the display.
    pub fn update_selection(&mut self, rect: PercentCrop) -> Result<(), CropError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Adjusting => {
                self.selection = rect.clamped();
                self.phase = SessionPhase::Adjusting;
                Ok(())
            }
            _ => Err(self.invalid("update_selection")),
        }
    }

    /// Drag end: fix the selection as a displayed-space pixel rectangle.
    pub fn complete_selection(&mut self, rect: PixelCrop) -> Result<(), CropError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Adjusting => {
                let rect = rect.clamp_to_display(&self.display);
                let min_width = self
                    .options
                    .min_selection_width
                    .min(self.display.displayed_width);
                let min_height = self
                    .options
                    .min_selection_height
                    .min(self.display.displayed_height);
                if rect.width < min_width || rect.height < min_height {
                    return Err(CropError::IncompleteSelection(
                        "selection is below the minimum size",
                    ));
                }
                self.completed = Some(rect);
                self.phase = SessionPhase::Ready;
                Ok(())
            }
            _ => Err(self.invalid("complete_selection")),
        }
    }

    /// Change the display zoom.
    ///
    /// The percent-space selection is display-relative and stays valid; a
    /// previously completed pixel rectangle refers to the old display size
    /// and is discarded, forcing re-confirmation before commit.
    pub fn set_scale(&mut self, scale: f32) -> Result<(), CropError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Adjusting => {
                let scale = scale.clamp(self.options.min_zoom, self.options.max_zoom);
                self.display = DisplayGeometry::at_scale(
                    self.raster.natural_width(),
                    self.raster.natural_height(),
                    scale,
                );
                if self.completed.take().is_some() {
                    debug!("zoom changed to {scale}, completed selection invalidated");
                }
                Ok(())
            }
            _ => Err(self.invalid("set_zoom")),
        }
    }

    /// Restore the default header band and clear the completed rectangle.
    pub fn reset(&mut self) -> Result<(), CropError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Adjusting => {
                self.selection = PercentCrop::band(self.options.default_band_fraction);
                self.completed = None;
                self.phase = SessionPhase::Ready;
                Ok(())
            }
            _ => Err(self.invalid("reset")),
        }
    }

    /// Validate commit prerequisites and enter `Committing`.
    ///
    /// Returns the trimmed name and the rectangle to extract. On rejection
    /// the session keeps its current phase.
    pub fn begin_commit(&mut self, name: &str) -> Result<(String, PixelCrop), CropError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Adjusting => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(CropError::IncompleteSelection("output name is empty"));
                }
                let rect = self
                    .completed
                    .ok_or(CropError::IncompleteSelection("no completed crop rectangle"))?;
                if !rect.has_area() {
                    return Err(CropError::IncompleteSelection("crop rectangle has no area"));
                }
                self.phase = SessionPhase::Committing;
                Ok((name.to_string(), rect))
            }
            SessionPhase::Committing => Err(CropError::CommitInProgress),
            _ => Err(self.invalid("commit")),
        }
    }

    /// Mark the in-flight commit as done.
    pub fn finish_commit(&mut self) {
        debug_assert_eq!(self.phase, SessionPhase::Committing);
        self.phase = SessionPhase::Committed;
    }

    /// Roll back a failed commit; the completed rectangle is kept for retry.
    pub fn abort_commit(&mut self) {
        if self.phase == SessionPhase::Committing {
            self.phase = SessionPhase::Ready;
        }
    }

    /// End the session without producing an artifact.
    pub fn cancel(&mut self) -> Result<(), CropError> {
        match self.phase {
            SessionPhase::Committing => Err(CropError::CommitInProgress),
            SessionPhase::Committed | SessionPhase::Cancelled => Err(self.invalid("cancel")),
            _ => {
                self.completed = None;
                self.phase = SessionPhase::Cancelled;
                Ok(())
            }
        }
    }
}
