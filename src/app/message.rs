// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/message.rs
//
// Pipeline events: stage transitions and render steps, for progress display.

use super::session::{SessionId, Stage};

/// Work actually being done inside a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStep {
    CroppingPhoto,
    WaitingForFrame,
    ApplyingFrame,
    Encoding,
}

impl RenderStep {
    /// Short status text for a progress bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::CroppingPhoto => "Processing image...",
            Self::WaitingForFrame => "Loading frame...",
            Self::ApplyingFrame => "Applying frame...",
            Self::Encoding => "Saving photo...",
        }
    }

    /// Rough completion percentage once this step has started.
    pub fn percent(self) -> u8 {
        match self {
            Self::CroppingPhoto => 25,
            Self::WaitingForFrame => 50,
            Self::ApplyingFrame => 75,
            Self::Encoding => 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StageChanged { session: SessionId, stage: Stage },
    Step { session: SessionId, step: RenderStep },
}

impl PipelineEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::StageChanged { session, .. } | Self::Step { session, .. } => *session,
        }
    }

    /// Progress text for this event, if it has any.
    pub fn describe(&self) -> Option<(u8, &'static str)> {
        match self {
            Self::Step { step, .. } => Some((step.percent(), step.label())),
            Self::StageChanged {
                stage: Stage::Previewed,
                ..
            } => Some((100, "Complete!")),
            Self::StageChanged { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_increases_through_steps() {
        let steps = [
            RenderStep::CroppingPhoto,
            RenderStep::WaitingForFrame,
            RenderStep::ApplyingFrame,
            RenderStep::Encoding,
        ];
        assert!(steps.windows(2).all(|w| w[0].percent() < w[1].percent()));
    }

    #[test]
    fn test_describe() {
        let session = SessionId::first();
        let done = PipelineEvent::StageChanged {
            session,
            stage: Stage::Previewed,
        };
        assert_eq!(done.describe(), Some((100, "Complete!")));
        let idle = PipelineEvent::StageChanged {
            session,
            stage: Stage::Idle,
        };
        assert_eq!(idle.describe(), None);
        assert_eq!(idle.session(), session);
    }
}
