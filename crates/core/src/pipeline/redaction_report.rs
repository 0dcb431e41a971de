use std::fmt;

use crate::shared::error::RedactionError;

/// How a redaction run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Aborted => write!(f, "aborted"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Completion record returned by every run.
#[derive(Debug)]
pub struct RedactionReport {
    pub frames_written: usize,
    pub status: RunStatus,
    /// Index of the last frame handed to the output stream.
    pub last_frame_index: Option<usize>,
    /// Degenerate rectangles skipped, counted once per frame they would have touched.
    pub degenerate_regions: usize,
    /// Frames that had at least one region redacted.
    pub redacted_frames: usize,
    pub failure: Option<RedactionError>,
}

impl RedactionReport {
    pub(crate) fn new() -> Self {
        Self {
            frames_written: 0,
            status: RunStatus::Completed,
            last_frame_index: None,
            degenerate_regions: 0,
            redacted_frames: 0,
            failure: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub(crate) fn record_written(&mut self, frame_index: usize) {
        self.frames_written += 1;
        self.last_frame_index = Some(frame_index);
    }

    /// Marks the run failed. An earlier failure is kept.
    pub(crate) fn fail(&mut self, error: RedactionError) {
        self.status = RunStatus::Failed;
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    pub(crate) fn abort(&mut self) {
        if self.status != RunStatus::Failed {
            self.status = RunStatus::Aborted;
        }
    }
}

impl fmt::Display for RedactionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} frames written ({} redacted, {} degenerate regions skipped)",
            self.status, self.frames_written, self.redacted_frames, self.degenerate_regions
        )?;
        if let Some(err) = &self.failure {
            write!(f, ": {err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_completed_and_empty() {
        let report = RedactionReport::new();
        assert!(report.is_completed());
        assert_eq!(report.frames_written, 0);
        assert_eq!(report.last_frame_index, None);
    }

    #[test]
    fn test_record_written_tracks_last_index() {
        let mut report = RedactionReport::new();
        report.record_written(0);
        report.record_written(1);
        assert_eq!(report.frames_written, 2);
        assert_eq!(report.last_frame_index, Some(1));
    }

    #[test]
    fn test_first_failure_wins() {
        let mut report = RedactionReport::new();
        report.fail(RedactionError::Configuration("first".into()));
        report.fail(RedactionError::Configuration("second".into()));
        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.failure.unwrap().to_string().contains("first"));
    }

    #[test]
    fn test_abort_does_not_mask_failure() {
        let mut report = RedactionReport::new();
        report.fail(RedactionError::Configuration("boom".into()));
        report.abort();
        assert_eq!(report.status, RunStatus::Failed);
    }

    #[test]
    fn test_display_includes_counts() {
        let mut report = RedactionReport::new();
        report.record_written(0);
        report.redacted_frames = 1;
        let text = report.to_string();
        assert!(text.starts_with("completed"));
        assert!(text.contains("1 frames written"));
    }
}
