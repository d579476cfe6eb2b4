// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/pipeline.rs
//
// Async orchestration: upload -> crop -> preview -> download, one session at a time.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::spawn_blocking;

use super::frame::FrameHandle;
use super::message::{PipelineEvent, RenderStep};
use super::session::{ErrorNotice, Session, SessionId, Stage};
use crate::constant::{
    CIRCLE_RADIUS_FRACTION, CROP_OUTPUT_SIZE, DOWNLOAD_SIZE, EVENT_CHANNEL_CAPACITY, PREVIEW_SIZE,
    VIEWPORT_SIZE,
};
use crate::domain::compose::{composite, render_crop};
use crate::domain::{
    CircleGeometry, Composite, CropSelector, CropSpec, ResampleQuality, SourceImage,
    ViewportSelector, export,
};
use crate::domain::source::is_image_content_type;
use crate::error::{DecodeError, PipelineError, RenderError};

/// Output sizes and drawing parameters shared by every render of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Minimum side of the cropped photo bitmap.
    pub crop_output_size: u32,
    pub preview_size: u32,
    pub download_size: u32,
    /// Side of the default crop viewport, in screen pixels.
    pub viewport_size: f32,
    pub geometry: CircleGeometry,
    pub quality: ResampleQuality,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            crop_output_size: CROP_OUTPUT_SIZE,
            preview_size: PREVIEW_SIZE,
            download_size: DOWNLOAD_SIZE,
            viewport_size: VIEWPORT_SIZE,
            geometry: CircleGeometry::new(CIRCLE_RADIUS_FRACTION),
            quality: ResampleQuality::default(),
        }
    }
}

/// Owns the current session and runs every step against it.
///
/// Each async step captures the session id when it starts and only applies
/// its result if that id is still current. A new upload or a start over
/// bumps the id, so anything still in flight for the old session comes back
/// as [`PipelineError::Superseded`] and leaves the new session alone.
pub struct Pipeline {
    session: Mutex<Session>,
    frame: FrameHandle,
    settings: RenderSettings,
    events: broadcast::Sender<PipelineEvent>,
}

impl Pipeline {
    pub fn new(frame: FrameHandle, settings: RenderSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: Mutex::new(Session::new(SessionId::first())),
            frame,
            settings,
            events,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Receive stage transitions and render steps from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn frame(&self) -> &FrameHandle {
        &self.frame
    }

    pub fn session_id(&self) -> SessionId {
        self.lock().id()
    }

    pub fn stage(&self) -> Stage {
        self.lock().stage()
    }

    pub fn source(&self) -> Option<Arc<SourceImage>> {
        self.lock().source().cloned()
    }

    pub fn crop(&self) -> Option<CropSpec> {
        self.lock().crop()
    }

    /// Preview of the current session, if one has been rendered.
    pub fn preview(&self) -> Option<Arc<Composite>> {
        self.lock().preview().cloned()
    }

    pub fn error(&self) -> Option<ErrorNotice> {
        self.lock().error().cloned()
    }

    /// A pan/zoom selector bound to the current upload, at its default position.
    pub fn default_selector(&self) -> Option<ViewportSelector> {
        let (width, height) = self.lock().source()?.dimensions();
        Some(ViewportSelector::new(width, height, self.settings.viewport_size))
    }

    // -------------------------------------------------------------------------
    // Session control
    // -------------------------------------------------------------------------

    /// Drop everything and return to an empty session.
    pub fn start_over(&self) -> SessionId {
        self.begin_session()
    }

    /// Dismiss the pending error notice, returning to the step that failed.
    pub fn acknowledge_error(&self) -> Option<ErrorNotice> {
        let mut session = self.lock();
        let notice = session.acknowledge_error()?;
        self.emit(PipelineEvent::StageChanged {
            session: session.id(),
            stage: session.stage(),
        });
        Some(notice)
    }

    /// Forget the original upload while keeping the preview. Downloads then
    /// upscale the preview instead of re-rendering.
    pub fn discard_source(&self) -> bool {
        let mut session = self.lock();
        let discarded = session.discard_source();
        if discarded {
            log::info!("Session {}: original photo released", session.id());
        }
        discarded
    }

    // -------------------------------------------------------------------------
    // Steps
    // -------------------------------------------------------------------------

    /// Decode an upload into a fresh session.
    ///
    /// Non-image content types and empty uploads are refused up front and
    /// leave the current session as it was. Anything else invalidates the
    /// previous session immediately, before decoding finishes.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<SessionId, PipelineError> {
        if let Some(ct) = content_type.as_deref()
            && !is_image_content_type(ct)
        {
            log::warn!("Rejected upload of type {ct}");
            return Err(DecodeError::UnsupportedType(ct.to_string()).into());
        }
        if bytes.is_empty() {
            log::warn!("Rejected empty upload");
            return Err(DecodeError::Empty.into());
        }

        let id = self.begin_session();
        let decoded =
            spawn_blocking(move || SourceImage::load(bytes, content_type.as_deref())).await?;

        let mut session = self.lock();
        if session.id() != id {
            return Err(PipelineError::Superseded(id));
        }

        match decoded {
            Ok(source) => {
                let (width, height) = source.dimensions();
                log::info!("Session {id}: photo loaded ({width}x{height})");
                session.set_source(Arc::new(source));
                self.enter(&mut session, Stage::Uploaded)?;
                Ok(id)
            }
            Err(e) => {
                let err = PipelineError::from(e);
                self.fail(&mut session, Stage::Idle, &err);
                Err(err)
            }
        }
    }

    /// Store the crop for the current upload, clamped into the image.
    pub fn set_crop(&self, crop: CropSpec) -> Result<CropSpec, PipelineError> {
        let mut session = self.lock();
        let (width, height) = session
            .source()
            .ok_or(PipelineError::NoSource)?
            .dimensions();

        let clamped = crop
            .clamped_to(width, height)
            .ok_or(RenderError::DegenerateCrop)?;
        if clamped != crop {
            log::warn!(
                "Crop {:?} clamped to {:?} for a {width}x{height} photo",
                crop.region.as_tuple(),
                clamped.region.as_tuple()
            );
        }

        self.enter(&mut session, Stage::Cropping)?;
        session.set_crop(clamped);
        Ok(clamped)
    }

    /// Take the selector's current crop.
    pub fn apply_selector(&self, selector: &dyn CropSelector) -> Result<CropSpec, PipelineError> {
        self.set_crop(selector.crop_spec())
    }

    /// Render the preview composite for the current crop.
    ///
    /// Without an explicit crop, the default viewport selection is used.
    pub async fn confirm_crop(&self) -> Result<Arc<Composite>, PipelineError> {
        let (id, source, crop) = {
            let mut session = self.lock();
            let source = session.source().cloned().ok_or(PipelineError::NoSource)?;
            let crop = match session.crop() {
                Some(crop) => crop,
                None => {
                    let (width, height) = source.dimensions();
                    ViewportSelector::new(width, height, self.settings.viewport_size).crop_spec()
                }
            };
            self.enter(&mut session, Stage::Rendering)?;
            session.set_crop(crop);
            (session.id(), source, crop)
        };

        let result = self
            .render(id, source, crop, self.settings.preview_size)
            .await;

        let mut session = self.lock();
        if session.id() != id {
            log::debug!("Discarding stale preview for session {id}");
            return Err(PipelineError::Superseded(id));
        }

        match result {
            Ok(composite) => {
                let preview = Arc::new(composite);
                session.set_preview(Arc::clone(&preview));
                self.enter(&mut session, Stage::Previewed)?;
                log::info!("Session {id}: preview ready ({0}x{0})", preview.side());
                Ok(preview)
            }
            Err(e) => {
                self.fail(&mut session, Stage::Cropping, &e);
                Err(e)
            }
        }
    }

    /// Re-render at download resolution and save it into `dir`.
    pub async fn download(&self, dir: &Path, product: &str) -> Result<PathBuf, PipelineError> {
        let (id, source, crop, preview) = {
            let mut session = self.lock();
            self.enter(&mut session, Stage::Exporting)?;
            (
                session.id(),
                session.source().cloned(),
                session.crop(),
                session.preview().cloned(),
            )
        };

        let result = self
            .export(id, source, crop, preview, dir.to_path_buf(), product.to_string())
            .await;

        let mut session = self.lock();
        if session.id() != id {
            log::debug!("Session {id} ended during export");
            return Err(PipelineError::Superseded(id));
        }

        match result {
            Ok(path) => {
                self.enter(&mut session, Stage::Previewed)?;
                Ok(path)
            }
            Err(e) => {
                self.fail(&mut session, Stage::Previewed, &e);
                Err(e)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn is_current(&self, id: SessionId) -> bool {
        self.lock().id() == id
    }

    fn begin_session(&self) -> SessionId {
        let id = {
            let mut session = self.lock();
            let id = session.id().next();
            *session = Session::new(id);
            id
        };
        log::debug!("Session {id} started");
        self.emit(PipelineEvent::StageChanged {
            session: id,
            stage: Stage::Idle,
        });
        id
    }

    fn enter(&self, session: &mut Session, stage: Stage) -> Result<(), PipelineError> {
        session.transition(stage)?;
        self.emit(PipelineEvent::StageChanged {
            session: session.id(),
            stage,
        });
        Ok(())
    }

    fn fail(&self, session: &mut Session, resume: Stage, error: &PipelineError) {
        log::error!("Session {}: {error}", session.id());
        session.fail(resume, error.to_string());
        self.emit(PipelineEvent::StageChanged {
            session: session.id(),
            stage: Stage::Error,
        });
    }

    fn step(&self, id: SessionId, step: RenderStep) {
        self.emit(PipelineEvent::Step { session: id, step });
    }

    /// Crop + composite at `output_size`, bailing out as soon as the session changes.
    async fn render(
        &self,
        id: SessionId,
        source: Arc<SourceImage>,
        crop: CropSpec,
        output_size: u32,
    ) -> Result<Composite, PipelineError> {
        let settings = self.settings;

        // Never crop below the photo circle's diameter, or the composite
        // would upscale a second time.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let diameter = (settings.geometry.radius(output_size) * 2.0).round() as u32;
        let crop_size = settings.crop_output_size.max(diameter);

        self.step(id, RenderStep::CroppingPhoto);
        let cropped =
            spawn_blocking(move || render_crop(&source, &crop, crop_size, settings.quality))
                .await??;
        if !self.is_current(id) {
            return Err(PipelineError::Superseded(id));
        }

        self.step(id, RenderStep::WaitingForFrame);
        let frame = self.frame.ready().await;
        if !self.is_current(id) {
            return Err(PipelineError::Superseded(id));
        }

        self.step(id, RenderStep::ApplyingFrame);
        let composite = spawn_blocking(move || {
            composite(
                &cropped,
                frame.as_deref(),
                output_size,
                &settings.geometry,
                settings.quality,
            )
        })
        .await??;
        Ok(composite)
    }

    async fn export(
        &self,
        id: SessionId,
        source: Option<Arc<SourceImage>>,
        crop: Option<CropSpec>,
        preview: Option<Arc<Composite>>,
        dir: PathBuf,
        product: String,
    ) -> Result<PathBuf, PipelineError> {
        let size = self.settings.download_size;
        let quality = self.settings.quality;

        let composite = match (source, crop) {
            (Some(source), Some(crop)) => self.render(id, source, crop, size).await?,
            _ => {
                let preview = preview.ok_or(PipelineError::NoSource)?;
                log::warn!(
                    "Original photo unavailable; upscaling the {0}x{0} preview to {size}x{size}",
                    preview.side()
                );
                spawn_blocking(move || preview.upscale(size, quality)).await??
            }
        };
        if !self.is_current(id) {
            return Err(PipelineError::Superseded(id));
        }

        self.step(id, RenderStep::Encoding);
        let bytes = spawn_blocking(move || export::encode_png(&composite)).await??;
        // Nothing is written for a session that ended while encoding.
        if !self.is_current(id) {
            return Err(PipelineError::Superseded(id));
        }

        let at = Utc::now();
        let path =
            spawn_blocking(move || export::write_png(&bytes, &dir, &product, at)).await??;
        Ok(path)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.lock();
        f.debug_struct("Pipeline")
            .field("session", &session.id())
            .field("stage", &session.stage())
            .field("frame", &self.frame)
            .finish()
    }
}
