//! dewarp-correct - Guide-line driven perspective correction
//!
//! The user draws lines over a photographed page that should be horizontal
//! after correction. Each committed line is extended across the canvas and
//! contributes two point correspondences; a homography fitted to them is
//! used to warp the source into a rectified image.
//!
//! # Modules
//!
//! - [`extend`] - Stretch a drawn segment across the canvas
//! - [`correspondence`] - Turn committed lines into point pairs
//! - [`session`] - The interactive state machine
//! - [`event`] / [`tool`] - Abstract input events and the tool interface
//! - [`config`] - JSON-backed settings
//!
//! # Example
//!
//! ```
//! use dewarp_core::{Pix, PixelDepth, Point};
//! use dewarp_correct::{CorrectionConfig, PointerButton, Session};
//!
//! let source = Pix::new(400, 300, PixelDepth::Bit8).unwrap();
//! let mut session = Session::new(source, CorrectionConfig::default()).unwrap();
//! session.activate().unwrap();
//!
//! for (a, b) in [((0.0, 100.0), (400.0, 120.0)), ((0.0, 250.0), (400.0, 230.0))] {
//!     session.pointer_down(PointerButton::Primary, Point::from(a));
//!     session.pointer_move(Point::from(b));
//!     session.pointer_down(PointerButton::Primary, Point::from(b));
//!     session.commit_line();
//! }
//!
//! let rectified = session.finalize().unwrap();
//! assert_eq!(rectified.pix.width(), 400);
//! ```

pub mod config;
pub mod correspondence;
pub mod error;
pub mod event;
pub mod extend;
pub mod session;
pub mod tool;

pub use config::CorrectionConfig;
pub use correspondence::{CorrespondencePair, LineSet, build_pairs, split_pairs};
pub use error::{CorrectionError, CorrectionResult};
pub use event::{PointerButton, SessionEvent, SessionOutcome};
pub use extend::{CommittedLine, extend};
pub use session::{
    CommitOutcome, FinalizeHandle, FinalizeJob, RectifiedImage, Session, SessionState,
};
pub use tool::{Tool, ToolKind};
