//! Input events and their outcomes
//!
//! Events are abstract: the engine knows nothing about keys or widgets.
//! Hosts translate their own input into [`SessionEvent`]s.

use crate::extend::CommittedLine;
use crate::session::{RectifiedImage, SessionState};
use dewarp_core::Point;
use serde::{Deserialize, Serialize};

/// Pointer buttons the session distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Places anchors and endpoints
    Primary,
    /// Commits the previewed line
    Secondary,
}

/// An input event delivered to a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Activate,
    PointerDown { button: PointerButton, pos: Point },
    PointerMove { pos: Point },
    PointerUp { button: PointerButton, pos: Point },
    Cancel,
    Finalize,
}

/// What handling an event did
#[derive(Debug)]
pub enum SessionOutcome {
    /// The event had no effect in the current state
    Ignored,
    /// The session entered `state`
    StateChanged(SessionState),
    /// A new anchor was placed
    AnchorPlaced(Point),
    /// The preview segment changed
    PreviewUpdated,
    /// The preview was frozen and awaits commit
    PreviewFrozen,
    /// A line was committed
    LineCommitted(CommittedLine),
    /// The previewed segment was degenerate and was dropped
    LineRejected,
    /// Finalize succeeded
    Finalized(Box<RectifiedImage>),
}

impl SessionOutcome {
    /// Whether the event changed anything
    pub fn is_ignored(&self) -> bool {
        matches!(self, SessionOutcome::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json() {
        let events: Vec<SessionEvent> = serde_json::from_str(
            r#"[
                {"type": "activate"},
                {"type": "pointer_down", "button": "primary", "pos": {"x": 1.0, "y": 2.0}},
                {"type": "pointer_move", "pos": {"x": 3.0, "y": 4.0}},
                {"type": "pointer_up", "button": "secondary", "pos": {"x": 3.0, "y": 4.0}},
                {"type": "cancel"},
                {"type": "finalize"}
            ]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0], SessionEvent::Activate);
        assert_eq!(
            events[1],
            SessionEvent::PointerDown {
                button: PointerButton::Primary,
                pos: Point::new(1.0, 2.0)
            }
        );
        assert_eq!(events[5], SessionEvent::Finalize);
    }
}
