//! dewarp-test - Regression test harness for the dewarp workspace
//!
//! Two modes are supported:
//!
//! - **Compare** (default): checks run and failures are collected
//! - **Display**: checks run and every written image is reported so it can
//!   be inspected by eye
//!
//! # Usage
//!
//! ```ignore
//! use dewarp_test::RegParams;
//!
//! let mut rp = RegParams::new("homography");
//! rp.compare_values(400.0, mapped.x, 1e-6);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" or "display"
//!
//! Test images are synthesized by [`synth`] instead of being read from
//! binary fixtures.

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // dewarp-test is at crates/dewarp-test
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
