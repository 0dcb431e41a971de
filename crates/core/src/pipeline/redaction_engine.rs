use std::collections::VecDeque;
use std::time::Instant;

use crate::detection::domain::detection_index::DetectionIndex;
use crate::pipeline::pipeline_executor::RunControl;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::redaction_config::RedactionConfig;
use crate::pipeline::redaction_report::RedactionReport;
use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::redaction::domain::temporal_window::{FrameWindow, TemporalWindowResolver};
use crate::redaction::infrastructure::redactor_factory::create_redactor;
use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::pixel_rect::PixelRect;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

type FrameResult = Result<Frame, Box<dyn std::error::Error>>;

/// Lifecycle of one engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Streams are open, no frame read yet.
    Opened,
    Streaming,
    /// Input exhausted; buffered frames are being written.
    Drained,
    Closed,
    Failed,
}

/// One detection box resolved against the video: the frames it covers and
/// its pixel rectangle, or `None` when the box maps to nothing drawable.
#[derive(Clone, Copy, Debug)]
struct ScheduledRegion {
    window: FrameWindow,
    rect: Option<PixelRect>,
}

/// Why the streaming loop stopped.
enum Stop {
    EndOfStream,
    Cancelled,
    /// The input broke; frames already read can still be written.
    Unreadable(RedactionError),
    Failed(RedactionError),
}

/// Single forward pass over a frame stream, redacting every frame covered
/// by a detection window.
///
/// All decisions are made up front: each detection is resolved to a frame
/// window and a pixel rectangle when the engine is built, so the per-frame
/// work is a range lookup plus the filter itself.
///
/// With `lookahead_frames = N` the engine holds up to `N` frames before
/// writing. A region active on frame `i` is carried onto the `N` frames that
/// follow it, so each flushed frame gets the union of regions active on it or
/// on any of the `N` frames before it. Redaction never starts before a
/// window does.
pub struct RedactionEngine {
    metadata: VideoMetadata,
    schedule: Vec<ScheduledRegion>,
    redactor: Box<dyn RegionRedactor>,
    lookahead: usize,
    state: EngineState,
}

impl RedactionEngine {
    pub fn new(
        index: &DetectionIndex,
        metadata: &VideoMetadata,
        config: &RedactionConfig,
    ) -> Result<Self, RedactionError> {
        Self::with_redactor(index, metadata, config, create_redactor(config))
    }

    /// Like [`RedactionEngine::new`] but with a caller-supplied redactor.
    pub fn with_redactor(
        index: &DetectionIndex,
        metadata: &VideoMetadata,
        config: &RedactionConfig,
        redactor: Box<dyn RegionRedactor>,
    ) -> Result<Self, RedactionError> {
        config.validate()?;
        metadata.validate()?;

        let schedule = build_schedule(index, metadata, config);
        log::debug!(
            "Scheduled {} regions from {} timestamps",
            schedule.len(),
            index.len()
        );

        Ok(Self {
            metadata: metadata.clone(),
            schedule,
            redactor,
            lookahead: config.lookahead_frames,
            state: EngineState::Opened,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Rectangles applied to `frame_index`, sorted and de-duplicated.
    pub fn rects_for_frame(&self, frame_index: usize) -> Vec<PixelRect> {
        self.regions_for_frame(frame_index).0
    }

    fn regions_for_frame(&self, frame_index: usize) -> (Vec<PixelRect>, usize) {
        self.regions_for_span(frame_index.saturating_sub(self.lookahead), frame_index)
    }

    /// Regions whose window overlaps `first..=last`, plus the number of
    /// degenerate ones among them.
    fn regions_for_span(&self, first: usize, last: usize) -> (Vec<PixelRect>, usize) {
        let mut rects = Vec::new();
        let mut degenerate = 0;
        // Both window bounds are sorted, so the overlapping entries are one
        // contiguous run.
        let start = self.schedule.partition_point(|e| e.window.upper < first);
        let end = self.schedule.partition_point(|e| e.window.lower <= last);
        for entry in self.schedule.get(start..end).unwrap_or_default() {
            match entry.rect {
                Some(rect) => rects.push(rect),
                None => degenerate += 1,
            }
        }
        rects.sort_unstable();
        rects.dedup();
        (rects, degenerate)
    }

    /// Streams `frames` through the redactor into `writer`, then closes it.
    ///
    /// The writer must already be open. Failures after the first frame is
    /// requested are reported in the returned record, never panicked or
    /// dropped. An engine runs once; later calls fail immediately.
    pub fn run<I>(
        &mut self,
        frames: I,
        writer: &mut dyn VideoWriter,
        control: &RunControl,
        logger: &mut dyn PipelineLogger,
    ) -> RedactionReport
    where
        I: Iterator<Item = FrameResult>,
    {
        let mut report = RedactionReport::new();
        if self.state != EngineState::Opened {
            report.fail(RedactionError::Configuration(format!(
                "engine cannot run from state {:?}",
                self.state
            )));
            return report;
        }
        self.state = EngineState::Streaming;

        let mut buffer: VecDeque<(usize, Frame)> =
            VecDeque::with_capacity(self.lookahead.saturating_add(1));
        let stop = self.stream(frames, &mut buffer, writer, control, logger, &mut report);

        let drain = matches!(stop, Stop::EndOfStream | Stop::Unreadable(_));
        settle(stop, &mut report);
        if drain {
            if report.is_completed() {
                self.state = EngineState::Drained;
            }
            if let Err(stop) = self.drain(&mut buffer, writer, control, logger, &mut report) {
                settle(stop, &mut report);
            }
        }
        if !buffer.is_empty() {
            log::warn!("Dropping {} buffered frames unwritten", buffer.len());
            buffer.clear();
        }

        if let Err(e) = writer.close() {
            report.fail(RedactionError::stream_write(report.frames_written, &*e));
        }
        self.state = match report.failure {
            Some(_) => EngineState::Failed,
            None => EngineState::Closed,
        };

        logger.metric("degenerate_regions", report.degenerate_regions as f64);
        logger.info(&format!("Redaction {report}"));
        report
    }

    fn stream<I>(
        &self,
        mut frames: I,
        buffer: &mut VecDeque<(usize, Frame)>,
        writer: &mut dyn VideoWriter,
        control: &RunControl,
        logger: &mut dyn PipelineLogger,
        report: &mut RedactionReport,
    ) -> Stop
    where
        I: Iterator<Item = FrameResult>,
    {
        let mut next_index = 0usize;
        loop {
            if control.is_cancelled() {
                return Stop::Cancelled;
            }
            let frame = match frames.next() {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    return Stop::Unreadable(RedactionError::stream_read(next_index, &*e));
                }
                None if control.is_cancelled() => return Stop::Cancelled,
                None => return Stop::EndOfStream,
            };
            if let Err(e) = self.check_geometry(&frame, next_index) {
                return Stop::Unreadable(e);
            }

            buffer.push_back((next_index, frame));
            next_index += 1;

            if buffer.len() > self.lookahead {
                if let Err(stop) = self.flush_oldest(buffer, writer, control, logger, report) {
                    return stop;
                }
            }
        }
    }

    fn drain(
        &self,
        buffer: &mut VecDeque<(usize, Frame)>,
        writer: &mut dyn VideoWriter,
        control: &RunControl,
        logger: &mut dyn PipelineLogger,
        report: &mut RedactionReport,
    ) -> Result<(), Stop> {
        while !buffer.is_empty() {
            if control.is_cancelled() {
                return Err(Stop::Cancelled);
            }
            self.flush_oldest(buffer, writer, control, logger, report)?;
        }
        Ok(())
    }

    /// Redacts and writes the front of the buffer.
    fn flush_oldest(
        &self,
        buffer: &mut VecDeque<(usize, Frame)>,
        writer: &mut dyn VideoWriter,
        control: &RunControl,
        logger: &mut dyn PipelineLogger,
        report: &mut RedactionReport,
    ) -> Result<(), Stop> {
        let Some((index, mut frame)) = buffer.pop_front() else {
            return Ok(());
        };

        let started = Instant::now();
        let (rects, degenerate) = self.regions_for_frame(index);
        if !rects.is_empty() {
            self.redactor.redact(&mut frame, &rects);
            report.redacted_frames += 1;
        }
        report.degenerate_regions += degenerate;
        logger.timing("redact", started.elapsed().as_secs_f64() * 1000.0);
        logger.metric("active_regions", rects.len() as f64);

        let started = Instant::now();
        writer
            .write_owned(frame)
            .map_err(|e| Stop::Failed(RedactionError::stream_write(index, &*e)))?;
        logger.timing("write", started.elapsed().as_secs_f64() * 1000.0);

        report.record_written(index);
        let total = self.metadata.total_frames;
        logger.progress(report.frames_written, total);
        if !control.report_progress(report.frames_written, total) {
            return Err(Stop::Cancelled);
        }
        Ok(())
    }

    fn check_geometry(&self, frame: &Frame, frame_index: usize) -> Result<(), RedactionError> {
        if frame.width() == self.metadata.width && frame.height() == self.metadata.height {
            return Ok(());
        }
        Err(RedactionError::FrameGeometry {
            frame_index,
            expected_width: self.metadata.width,
            expected_height: self.metadata.height,
            actual_width: frame.width(),
            actual_height: frame.height(),
        })
    }
}

fn settle(stop: Stop, report: &mut RedactionReport) {
    match stop {
        Stop::EndOfStream => {}
        Stop::Cancelled => {
            log::info!("Redaction cancelled after {} frames", report.frames_written);
            report.abort();
        }
        Stop::Unreadable(e) | Stop::Failed(e) => {
            log::error!("Redaction failed: {e}");
            report.fail(e);
        }
    }
}

/// Resolves every detection in `index` to a window and a rectangle, ordered
/// by window start.
fn build_schedule(
    index: &DetectionIndex,
    metadata: &VideoMetadata,
    config: &RedactionConfig,
) -> Vec<ScheduledRegion> {
    let resolver = TemporalWindowResolver::new(metadata.fps, config.window_divisor);
    let mapper = config.bounding_box_mapper();
    let mut schedule = Vec::with_capacity(index.detection_count());

    for (timestamp_ms, boxes) in index.iter() {
        let window = resolver.resolve(timestamp_ms);
        if metadata.total_frames > 0 && window.lower >= metadata.total_frames {
            log::debug!(
                "Detection at {timestamp_ms}ms starts at frame {} past the end of the video",
                window.lower
            );
        }
        for b in boxes {
            let rect = mapper
                .map(b, metadata.width, metadata.height)
                .filter(|r| !r.is_degenerate());
            if rect.is_none() {
                log::warn!(
                    "Detection at {timestamp_ms}ms maps to an empty region on a {}x{} frame, skipping: {b:?}",
                    metadata.width,
                    metadata.height
                );
            }
            schedule.push(ScheduledRegion { window, rect });
        }
    }

    // Timestamps iterate in order and every window has the same length, so
    // both bounds are monotonic in them.
    debug_assert!(schedule.windows(2).all(|w| {
        w[0].window.lower <= w[1].window.lower && w[0].window.upper <= w[1].window.upper
    }));
    schedule
}
