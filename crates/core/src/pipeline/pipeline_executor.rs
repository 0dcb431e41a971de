use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::redaction_engine::RedactionEngine;
use crate::pipeline::redaction_report::RedactionReport;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

/// External controls for a run: an abort flag and a progress callback.
///
/// Both are consulted once per frame. The callback receives
/// `(frames_written, total_frames)`; returning `false` cancels the run.
pub struct RunControl {
    pub cancelled: Arc<AtomicBool>,
    pub on_progress: Option<ProgressCallback>,
}

impl RunControl {
    pub fn new(cancelled: Arc<AtomicBool>, on_progress: Option<ProgressCallback>) -> Self {
        Self {
            cancelled,
            on_progress,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Forwards progress to the callback. `false` means stop.
    pub fn report_progress(&self, current: usize, total: usize) -> bool {
        match &self.on_progress {
            Some(callback) => callback(current, total),
            None => true,
        }
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new(Arc::new(AtomicBool::new(false)), None)
    }
}

/// Decides where decode, redaction and encode run.
///
/// Both streams arrive already opened. The executor must close the reader;
/// the engine closes the writer once the last frame is out.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        engine: &mut RedactionEngine,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        control: RunControl,
        logger: &mut dyn PipelineLogger,
    ) -> RedactionReport;
}
