//! Orchestration of the render -> select -> extract -> encode pipeline.

use std::collections::HashMap;

use image::GenericImageView;
use log::{debug, info};

use crate::encode::ArtifactEncoder;
use crate::extract::extract_region;
use crate::geometry::{DisplayGeometry, PercentCrop, PixelCrop};
use crate::raster::PageRenderer;
use crate::session::{CropSession, SessionPhase};
use crate::{CropArtifact, CropError, CropOptions};

/// Opaque handle for one crop session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// Drives crop sessions from document bytes to committed artifacts.
///
/// All mutation goes through `&mut self`, so calls against one workflow are
/// serialized by construction; a conflicting call cannot interleave with an
/// in-flight commit. Sessions and their rasters are released on commit and
/// on cancel, after which the handle is dead.
pub struct CropWorkflow<R, E> {
    renderer: R,
    encoder: E,
    options: CropOptions,
    sessions: HashMap<SessionId, CropSession>,
    next_id: u64,
}

impl<R, E> CropWorkflow<R, E>
where
    R: PageRenderer,
    E: ArtifactEncoder,
{
    pub fn new(renderer: R, encoder: E, options: CropOptions) -> Self {
        Self {
            renderer,
            encoder,
            options,
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Render page 1 of `bytes` and open a session over the raster.
    ///
    /// Render errors are terminal: no session is created and the caller must
    /// start over with a new document.
    pub async fn start(&mut self, bytes: &[u8]) -> Result<SessionId, CropError> {
        let raster = self.renderer.render_first_page(bytes).await?;
        let id = SessionId(self.next_id);
        self.next_id += 1;

        debug!(
            "session {}: raster {}x{}",
            id.0,
            raster.natural_width(),
            raster.natural_height()
        );
        self.sessions
            .insert(id, CropSession::new(raster, self.options.clone()));
        Ok(id)
    }

    fn session(&self, id: SessionId, op: &'static str) -> Result<&CropSession, CropError> {
        self.sessions
            .get(&id)
            .ok_or(CropError::InvalidStateTransition { op, phase: "closed" })
    }

    fn session_mut(
        &mut self,
        id: SessionId,
        op: &'static str,
    ) -> Result<&mut CropSession, CropError> {
        self.sessions
            .get_mut(&id)
            .ok_or(CropError::InvalidStateTransition { op, phase: "closed" })
    }

    /// Current display geometry; the ready notification equivalent.
    pub fn display(&self, id: SessionId) -> Result<DisplayGeometry, CropError> {
        Ok(self.session(id, "display")?.display())
    }

    /// Current in-progress percent-space selection.
    pub fn selection(&self, id: SessionId) -> Result<PercentCrop, CropError> {
        Ok(self.session(id, "selection")?.selection())
    }

    pub fn phase(&self, id: SessionId) -> Result<SessionPhase, CropError> {
        Ok(self.session(id, "phase")?.phase())
    }

    pub fn update_selection(&mut self, id: SessionId, rect: PercentCrop) -> Result<(), CropError> {
        self.session_mut(id, "update_selection")?.update_selection(rect)
    }

    pub fn complete_selection(&mut self, id: SessionId, rect: PixelCrop) -> Result<(), CropError> {
        self.session_mut(id, "complete_selection")?
            .complete_selection(rect)
    }

    pub fn set_zoom(&mut self, id: SessionId, scale: f32) -> Result<(), CropError> {
        self.session_mut(id, "set_zoom")?.set_scale(scale)
    }

    pub fn reset(&mut self, id: SessionId) -> Result<(), CropError> {
        self.session_mut(id, "reset")?.reset()
    }

    /// Extract and encode the completed selection.
    ///
    /// On success the artifact is handed to the caller and the session is
    /// released. `DegenerateCrop` and `EncodingFailure` roll the session back
    /// so the user can adjust the rectangle and retry.
    pub async fn commit(&mut self, id: SessionId, name: &str) -> Result<CropArtifact, CropError> {
        let (name, region) = {
            let session = self.session_mut(id, "commit")?;
            let (name, rect) = session.begin_commit(name)?;
            let display = session.display();
            match extract_region(session.raster(), &display, &rect) {
                Ok(region) => (name, region),
                Err(e) => {
                    session.abort_commit();
                    return Err(e);
                }
            }
        };

        let payload = match self.encoder.encode(&region).await {
            Ok(payload) => payload,
            Err(e) => {
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.abort_commit();
                }
                return Err(e);
            }
        };

        if let Some(mut session) = self.sessions.remove(&id) {
            session.finish_commit();
        }

        let (width, height) = region.dimensions();
        info!("committed '{}' ({}x{})", name, width, height);
        Ok(CropArtifact {
            name,
            payload,
            width,
            height,
        })
    }

    /// Discard the session and release its resources.
    ///
    /// Rejected with `CommitInProgress` while a commit is in flight. After a
    /// successful cancel the handle is invalid for every other call.
    pub fn cancel(&mut self, id: SessionId) -> Result<(), CropError> {
        self.session_mut(id, "cancel")?.cancel()?;
        self.sessions.remove(&id);
        info!("session {} cancelled", id.0);
        Ok(())
    }
}
