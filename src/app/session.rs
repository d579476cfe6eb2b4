// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/session.rs
//
// Session state: one upload, its crop, its preview, and where the flow is.

use std::fmt;
use std::sync::Arc;

use crate::domain::{Composite, CropSpec, SourceImage};
use crate::error::PipelineError;

/// Identifies one upload-to-export flow. Bumped on every upload and start-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Uploaded,
    Cropping,
    Rendering,
    Previewed,
    Exporting,
    Error,
}

impl Stage {
    /// Transition table. Returning to `Idle` (start over) is always allowed.
    /// `Error` is only left through [`Session::acknowledge_error`] or a start over.
    pub fn can_transition_to(self, next: Stage) -> bool {
        use Stage::{Cropping, Error, Exporting, Idle, Previewed, Rendering, Uploaded};

        matches!(
            (self, next),
            (_, Idle)
                | (Idle, Uploaded | Error)
                | (Uploaded, Cropping | Rendering)
                | (Cropping, Cropping | Rendering)
                | (Rendering, Previewed | Error)
                | (Previewed, Cropping | Rendering | Exporting)
                | (Exporting, Previewed | Error)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Uploaded => "Uploaded",
            Self::Cropping => "Cropping",
            Self::Rendering => "Rendering",
            Self::Previewed => "Previewed",
            Self::Exporting => "Exporting",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

/// A failure waiting for the user to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub message: String,
    /// Stage to return to once acknowledged.
    pub resume: Stage,
}

/// State of a single flow. Replaced wholesale on upload and start-over.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    stage: Stage,
    source: Option<Arc<SourceImage>>,
    crop: Option<CropSpec>,
    preview: Option<Arc<Composite>>,
    error: Option<ErrorNotice>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            stage: Stage::Idle,
            source: None,
            crop: None,
            preview: None,
            error: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn source(&self) -> Option<&Arc<SourceImage>> {
        self.source.as_ref()
    }

    pub fn crop(&self) -> Option<CropSpec> {
        self.crop
    }

    pub fn preview(&self) -> Option<&Arc<Composite>> {
        self.preview.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorNotice> {
        self.error.as_ref()
    }

    /// Move to `next` if the transition table allows it.
    pub fn transition(&mut self, next: Stage) -> Result<(), PipelineError> {
        if !self.stage.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        log::debug!("Session {}: {} -> {}", self.id, self.stage, next);
        self.stage = next;
        Ok(())
    }

    pub(crate) fn set_source(&mut self, source: Arc<SourceImage>) {
        self.source = Some(source);
        self.crop = None;
        self.preview = None;
    }

    /// Forget the original upload. Later downloads fall back to upscaling
    /// the preview.
    pub(crate) fn discard_source(&mut self) -> bool {
        self.source.take().is_some()
    }

    pub(crate) fn set_crop(&mut self, crop: CropSpec) {
        self.crop = Some(crop);
    }

    pub(crate) fn set_preview(&mut self, preview: Arc<Composite>) {
        self.preview = Some(preview);
    }

    /// Enter `Error`, remembering which stage to return to. Prior state is kept.
    pub(crate) fn fail(&mut self, resume: Stage, message: String) {
        log::debug!("Session {}: {} -> Error ({message})", self.id, self.stage);
        self.stage = Stage::Error;
        self.error = Some(ErrorNotice { message, resume });
    }

    /// Dismiss the pending error and return to the stage that failed.
    pub fn acknowledge_error(&mut self) -> Option<ErrorNotice> {
        let notice = self.error.take()?;
        self.stage = notice.resume;
        Some(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Stage::*;

    const ALL: [Stage; 7] = [Idle, Uploaded, Cropping, Rendering, Previewed, Exporting, Error];

    #[test]
    fn test_start_over_always_allowed() {
        for stage in ALL {
            assert!(stage.can_transition_to(Idle), "{stage} -> Idle");
        }
    }

    #[test]
    fn test_happy_path() {
        let mut session = Session::new(SessionId::first());
        for next in [Uploaded, Cropping, Rendering, Previewed, Exporting, Previewed] {
            session.transition(next).unwrap();
        }
        assert_eq!(session.stage(), Previewed);
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Idle.can_transition_to(Rendering));
        assert!(!Uploaded.can_transition_to(Exporting));
        assert!(!Cropping.can_transition_to(Previewed));
        assert!(!Rendering.can_transition_to(Exporting));
        assert!(!Error.can_transition_to(Rendering));
        assert!(!Error.can_transition_to(Cropping));

        let mut session = Session::new(SessionId::first());
        let err = session.transition(Exporting).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition { from: Idle, to: Exporting }
        ));
        assert_eq!(session.stage(), Idle);
    }

    #[test]
    fn test_error_resumes_originating_stage() {
        let mut session = Session::new(SessionId::first());
        session.transition(Uploaded).unwrap();
        session.transition(Cropping).unwrap();
        session.transition(Rendering).unwrap();
        session.fail(Cropping, "bad crop".into());
        assert_eq!(session.stage(), Error);

        let notice = session.acknowledge_error().unwrap();
        assert_eq!(notice.message, "bad crop");
        assert_eq!(session.stage(), Cropping);
        assert!(session.acknowledge_error().is_none());
    }

    #[test]
    fn test_session_ids_increase() {
        let a = SessionId::first();
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.to_string(), "#2");
    }
}
