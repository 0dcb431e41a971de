use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for redaction-run events.
///
/// The engine and executors report through this trait so callers choose
/// where progress and diagnostics go.
pub trait PipelineLogger: Send {
    /// Frames written so far out of `total` (0 when unknown).
    fn progress(&mut self, current: usize, total: usize);

    /// Time spent in a named stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A point-in-time measurement, e.g. active regions on a frame.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: nothing.
    fn summary(&self) {}
}

/// Discards everything. Default for library callers and tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger for the command line: throttled progress through `log`, plus
/// per-stage timing and metric averages printed at the end.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    started: Instant,
    frames_seen: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames_seen: 0,
            messages: Vec::new(),
        }
    }

    /// Formatted summary, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Redaction summary ({} frames, {:.1}s):",
            self.frames_seen,
            elapsed_ms / 1000.0
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let share = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10}: avg {:6.2}ms  total {total_ms:7.0}ms  ({share:4.1}%)",
                mean(durations)
            ));
        }

        for (name, values) in &self.metrics {
            lines.push(format!(
                "  {name}: avg {:.1}, max {:.0}",
                mean(values),
                values.iter().cloned().fold(0.0, f64::max)
            ));
        }

        if self.frames_seen > 0 && elapsed_ms > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames_seen as f64 / (elapsed_ms / 1000.0)
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(Vec::as_slice)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(Vec::as_slice)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Redacting: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Redacting: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.messages.push(message.to_string());
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(3, 9);
        logger.timing("redact", 1.5);
        logger.metric("active_regions", 2.0);
        logger.info("done");
        logger.summary();
    }

    #[test]
    fn test_timings_accumulate_per_stage() {
        let mut logger = StdoutPipelineLogger::new(5);
        logger.timing("redact", 4.0);
        logger.timing("redact", 6.0);
        logger.timing("write", 1.0);

        assert_eq!(logger.timings_for("redact"), Some(&[4.0, 6.0][..]));
        assert_eq!(logger.timings_for("write").map(<[f64]>::len), Some(1));
        assert!(logger.timings_for("decode").is_none());
    }

    #[test]
    fn test_metric_average_in_summary() {
        let mut logger = StdoutPipelineLogger::new(5);
        logger.metric("active_regions", 1.0);
        logger.metric("active_regions", 4.0);
        assert_relative_eq!(mean(logger.metrics_for("active_regions").unwrap()), 2.5);

        let text = logger.summary_string().unwrap();
        assert!(text.contains("active_regions: avg 2.5, max 4"));
    }

    #[test]
    fn test_summary_lists_stages_and_frame_count() {
        let mut logger = StdoutPipelineLogger::new(5);
        logger.progress(12, 12);
        logger.timing("redact", 2.0);
        logger.timing("write", 3.0);

        let text = logger.summary_string().unwrap();
        assert!(text.starts_with("Redaction summary (12 frames"));
        assert!(text.contains("redact"));
        assert!(text.contains("write"));
    }

    #[test]
    fn test_nothing_recorded_gives_no_summary() {
        assert!(StdoutPipelineLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_with_unknown_total() {
        let mut logger = StdoutPipelineLogger::new(2);
        for i in 1..=7 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames_seen, 7);
    }

    #[test]
    fn test_info_keeps_messages() {
        let mut logger = StdoutPipelineLogger::default();
        logger.info("opened input");
        logger.info("opened output");
        assert_eq!(logger.messages(), ["opened input", "opened output"]);
    }

    #[test]
    fn test_zero_throttle_is_raised_to_one() {
        assert_eq!(StdoutPipelineLogger::new(0).throttle_frames, 1);
    }
}
