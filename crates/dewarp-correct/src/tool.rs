//! Interactive tools

use crate::error::CorrectionResult;
use crate::event::{SessionEvent, SessionOutcome};
use serde::{Deserialize, Serialize};

/// Available tool kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Guide-line driven perspective correction
    #[default]
    Perspective,
}

impl ToolKind {
    /// Stable name of the tool
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Perspective => "perspective",
        }
    }
}

/// A tool that consumes session events
pub trait Tool {
    /// Which tool this is
    fn kind(&self) -> ToolKind;

    /// Stable name of the tool
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Whether the tool currently accepts pointer input
    fn is_active(&self) -> bool;

    /// Start accepting input
    fn activate(&mut self) -> CorrectionResult<()>;

    /// Stop accepting input, discarding any work in progress
    fn deactivate(&mut self);

    /// Handle one event
    fn handle(&mut self, event: SessionEvent) -> CorrectionResult<SessionOutcome>;
}
