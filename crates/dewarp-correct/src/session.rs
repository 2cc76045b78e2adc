//! Correction session
//!
//! A [`Session`] collects guide lines drawn over a source image and turns
//! them into a rectified image. The state is derived from what the session
//! holds:
//!
//! | State        | Condition                                              |
//! |--------------|--------------------------------------------------------|
//! | `Idle`       | not activated                                          |
//! | `Drawing`    | active, and no lines yet or a line is in progress      |
//! | `Ready`      | active, at least one line, nothing in progress         |
//! | `Finalizing` | a finalize job has been handed out and not completed   |
//!
//! Drawing a line takes two primary presses: the first places an anchor,
//! pointer moves stretch a preview from it, and the second press freezes
//! the preview. A secondary press then extends the preview across the
//! canvas and commits it.

use crate::config::CorrectionConfig;
use crate::correspondence::{LineSet, build_pairs, split_pairs};
use crate::error::{CorrectionError, CorrectionResult};
use crate::event::{PointerButton, SessionEvent, SessionOutcome};
use crate::extend::{CommittedLine, extend};
use crate::tool::{Tool, ToolKind};
use dewarp_core::{Color, Pix, Point, Segment};
use dewarp_transform::{EstimateOptions, Homography, WarpOptions, estimate_with, warp_cancellable};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

/// Overlay stroke width in pixels
const OVERLAY_WIDTH: u32 = 2;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Drawing,
    Ready,
    Finalizing,
}

/// Result of a successful finalize
#[derive(Debug, Clone)]
pub struct RectifiedImage {
    /// Rectified raster, same size as the source
    pub pix: Pix,
    /// Homography mapping source canvas points to rectified points
    pub homography: Homography,
}

/// Result of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitOutcome {
    /// The preview was extended and appended
    Committed(CommittedLine),
    /// The preview was degenerate and has been discarded
    Rejected,
    /// There was nothing to commit
    NoPreview,
}

/// Interactive perspective correction over one source image
#[derive(Debug)]
pub struct Session {
    source: Pix,
    config: CorrectionConfig,
    active: bool,
    anchor: Option<Point>,
    preview: Option<Segment>,
    lines: LineSet,
    /// Cancel flag of the outstanding finalize job
    pending: Option<Arc<AtomicBool>>,
}

impl Session {
    /// Create an idle session over `source`.
    pub fn new(source: Pix, config: CorrectionConfig) -> CorrectionResult<Self> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            active: false,
            anchor: None,
            preview: None,
            lines: LineSet::new(),
            pending: None,
        })
    }

    /// Decode the image at `path` and create an idle session over it.
    ///
    /// # Errors
    ///
    /// Returns [`CorrectionError::ImageDecode`] if the image cannot be read.
    pub fn open<P: AsRef<Path>>(path: P, config: CorrectionConfig) -> CorrectionResult<Self> {
        let path = path.as_ref();
        let source = dewarp_io::read_image(path)?;
        tracing::info!(
            path = %path.display(),
            width = source.width(),
            height = source.height(),
            "opened source image"
        );
        Self::new(source, config)
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        if self.pending.is_some() {
            SessionState::Finalizing
        } else if !self.active {
            SessionState::Idle
        } else if self.lines.is_empty() || self.anchor.is_some() || self.preview.is_some() {
            SessionState::Drawing
        } else {
            SessionState::Ready
        }
    }

    /// The source image
    pub fn source(&self) -> &Pix {
        &self.source
    }

    /// The active configuration
    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Canvas `(width, height)`, equal to the source size
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.source.width(), self.source.height())
    }

    /// The in-progress line, if any
    pub fn preview(&self) -> Option<Segment> {
        self.preview
    }

    /// The pending anchor of a line being drawn
    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Committed lines in commit order
    pub fn lines(&self) -> &[CommittedLine] {
        self.lines.as_slice()
    }

    /// Start drawing, discarding lines left from an earlier run.
    pub fn activate(&mut self) -> CorrectionResult<()> {
        if self.pending.is_some() {
            return Err(self.invalid("activate"));
        }
        self.reset_drawing();
        self.active = true;
        tracing::debug!("perspective session activated");
        Ok(())
    }

    /// Handle a pointer press.
    pub fn pointer_down(&mut self, button: PointerButton, pos: Point) -> SessionOutcome {
        if !self.accepts_input() {
            return SessionOutcome::Ignored;
        }
        match button {
            PointerButton::Primary => match self.anchor.take() {
                None => {
                    self.anchor = Some(pos);
                    self.preview = None;
                    SessionOutcome::AnchorPlaced(pos)
                }
                Some(anchor) => {
                    self.preview = Some(Segment::new(anchor, pos));
                    SessionOutcome::PreviewFrozen
                }
            },
            PointerButton::Secondary => match self.commit_line() {
                CommitOutcome::Committed(line) => SessionOutcome::LineCommitted(line),
                CommitOutcome::Rejected => SessionOutcome::LineRejected,
                CommitOutcome::NoPreview => SessionOutcome::Ignored,
            },
        }
    }

    /// Handle pointer motion.
    pub fn pointer_move(&mut self, pos: Point) -> SessionOutcome {
        if !self.accepts_input() {
            return SessionOutcome::Ignored;
        }
        match self.anchor {
            Some(anchor) => {
                self.preview = Some(Segment::new(anchor, pos));
                SessionOutcome::PreviewUpdated
            }
            None => SessionOutcome::Ignored,
        }
    }

    /// Extend the preview across the canvas and append it.
    ///
    /// A degenerate preview is dropped and the committed lines are left
    /// untouched.
    pub fn commit_line(&mut self) -> CommitOutcome {
        if !self.accepts_input() {
            return CommitOutcome::NoPreview;
        }
        let Some(segment) = self.preview.take() else {
            return CommitOutcome::NoPreview;
        };
        self.anchor = None;

        let (width, _) = self.canvas_size();
        match extend(&segment, width) {
            Ok(line) => {
                self.lines.push(line);
                tracing::debug!(
                    count = self.lines.len(),
                    slope = line.slope,
                    intercept = line.intercept,
                    "line committed"
                );
                CommitOutcome::Committed(line)
            }
            Err(e) => {
                tracing::debug!(error = %e, ?segment, "preview rejected");
                CommitOutcome::Rejected
            }
        }
    }

    /// Discard everything and return to idle.
    ///
    /// An outstanding finalize job is signalled to stop; its result will
    /// be refused by [`Session::complete_finalize`].
    pub fn cancel(&mut self) {
        if let Some(flag) = self.pending.take() {
            flag.store(true, Ordering::Relaxed);
            tracing::debug!("outstanding finalize cancelled");
        }
        self.reset_drawing();
        self.active = false;
        tracing::debug!("perspective session cancelled");
    }

    /// Estimate and apply the correction synchronously.
    ///
    /// On failure the committed lines are kept and the session stays
    /// ready. On success the lines are cleared and the session is idle.
    pub fn finalize(&mut self) -> CorrectionResult<RectifiedImage> {
        let job = self.begin_finalize()?;
        let result = job.run();
        self.complete_finalize(result)
    }

    /// Validate and snapshot the session into a job that can run elsewhere.
    ///
    /// # Errors
    ///
    /// - [`CorrectionError::InvalidState`] if idle or already finalizing
    /// - [`CorrectionError::InsufficientLines`] with fewer than
    ///   `min_lines` committed lines; nothing is discarded
    pub fn begin_finalize(&mut self) -> CorrectionResult<FinalizeJob> {
        if !self.accepts_input() {
            return Err(self.invalid("finalize"));
        }
        let required = self.config.min_lines;
        if self.lines.len() < required {
            return Err(CorrectionError::InsufficientLines {
                found: self.lines.len(),
                required,
            });
        }
        let dropped = self.preview.take().is_some() | self.anchor.take().is_some();
        if dropped {
            tracing::debug!("line in progress discarded before finalize");
        }

        let cancel = Arc::new(AtomicBool::new(false));
        self.pending = Some(Arc::clone(&cancel));
        let (width, height) = self.canvas_size();
        tracing::info!(lines = self.lines.len(), width, height, "finalizing correction");

        Ok(FinalizeJob {
            source: self.source.clone(),
            lines: self.lines.as_slice().to_vec(),
            width,
            height,
            estimate: self.config.estimate_options(),
            warp: self.config.warp_options(),
            cancel,
        })
    }

    /// Apply the outcome of a job obtained from [`Session::begin_finalize`].
    ///
    /// The result is passed through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CorrectionError::InvalidState`] if no job is outstanding
    /// (for example after [`Session::cancel`]); the result is dropped.
    pub fn complete_finalize(
        &mut self,
        result: CorrectionResult<RectifiedImage>,
    ) -> CorrectionResult<RectifiedImage> {
        if self.pending.take().is_none() {
            return Err(self.invalid("complete_finalize"));
        }
        match result {
            Ok(image) => {
                self.reset_drawing();
                self.active = false;
                tracing::info!(
                    width = image.pix.width(),
                    height = image.pix.height(),
                    "correction applied"
                );
                Ok(image)
            }
            Err(e) => {
                tracing::warn!(error = %e, lines = self.lines.len(), "finalize failed; lines kept");
                Err(e)
            }
        }
    }

    /// Draw the committed lines and the preview over a 32 bpp copy of the
    /// source.
    pub fn render_overlay(&self) -> CorrectionResult<Pix> {
        let mut pm = self.source.convert_to_32().to_mut();
        for line in &self.lines {
            pm.render_segment_color(&line.segment(), OVERLAY_WIDTH, Color::GREEN)?;
        }
        if let Some(preview) = self.preview {
            pm.render_segment_color(&preview, OVERLAY_WIDTH, Color::RED)?;
        }
        Ok(pm.into())
    }

    fn accepts_input(&self) -> bool {
        self.active && self.pending.is_none()
    }

    fn reset_drawing(&mut self) {
        self.anchor = None;
        self.preview = None;
        self.lines.clear();
    }

    fn invalid(&self, operation: &'static str) -> CorrectionError {
        CorrectionError::InvalidState {
            operation,
            state: self.state(),
        }
    }
}

impl Tool for Session {
    fn kind(&self) -> ToolKind {
        ToolKind::Perspective
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self) -> CorrectionResult<()> {
        Session::activate(self)
    }

    fn deactivate(&mut self) {
        self.cancel();
    }

    fn handle(&mut self, event: SessionEvent) -> CorrectionResult<SessionOutcome> {
        let outcome = match event {
            SessionEvent::Activate => {
                Session::activate(self)?;
                SessionOutcome::StateChanged(self.state())
            }
            SessionEvent::PointerDown { button, pos } => self.pointer_down(button, pos),
            SessionEvent::PointerMove { pos } => self.pointer_move(pos),
            SessionEvent::PointerUp { .. } => SessionOutcome::Ignored,
            SessionEvent::Cancel => {
                self.cancel();
                SessionOutcome::StateChanged(self.state())
            }
            SessionEvent::Finalize => SessionOutcome::Finalized(Box::new(self.finalize()?)),
        };
        Ok(outcome)
    }
}

/// A finalize snapshot that owns everything it needs
#[derive(Debug)]
pub struct FinalizeJob {
    source: Pix,
    lines: Vec<CommittedLine>,
    width: u32,
    height: u32,
    estimate: EstimateOptions,
    warp: WarpOptions,
    cancel: Arc<AtomicBool>,
}

impl FinalizeJob {
    /// Build correspondences, estimate the homography and warp the source.
    pub fn run(self) -> CorrectionResult<RectifiedImage> {
        let pairs = build_pairs(&self.lines, self.width);
        let (src, dst) = split_pairs(&pairs);
        let homography = estimate_with(&src, &dst, &self.estimate)?;
        tracing::debug!(
            pairs = pairs.len(),
            rms = homography.reprojection_rms(&src, &dst),
            "homography estimated"
        );
        let pix = warp_cancellable(
            &self.source,
            &homography,
            self.width,
            self.height,
            &self.warp,
            &self.cancel,
        )?;
        Ok(RectifiedImage { pix, homography })
    }

    /// Run on a worker thread.
    pub fn spawn(self) -> FinalizeHandle {
        let cancel = Arc::clone(&self.cancel);
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            // The receiver may be gone if the caller lost interest
            let _ = tx.send(self.run());
        });
        FinalizeHandle {
            rx,
            cancel,
            worker: Some(worker),
        }
    }
}

/// Handle to a finalize running on a worker thread
#[derive(Debug)]
pub struct FinalizeHandle {
    rx: mpsc::Receiver<CorrectionResult<RectifiedImage>>,
    cancel: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl FinalizeHandle {
    /// Ask the worker to stop at the next row.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// The result, if the worker has finished.
    pub fn try_result(&mut self) -> Option<CorrectionResult<RectifiedImage>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.join();
                Some(Err(CorrectionError::WorkerDisconnected))
            }
        }
    }

    /// Block until the worker finishes.
    pub fn wait(mut self) -> CorrectionResult<RectifiedImage> {
        let result = self
            .rx
            .recv()
            .unwrap_or(Err(CorrectionError::WorkerDisconnected));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("finalize worker panicked");
            }
        }
    }
}
