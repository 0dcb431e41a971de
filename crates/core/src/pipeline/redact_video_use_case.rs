use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::detection::domain::detection_index::DetectionIndex;
use crate::shared::error::{RedactionError, StreamKind};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_executor::{PipelineExecutor, ProgressCallback, RunControl};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::redaction_config::RedactionConfig;
use super::redaction_engine::RedactionEngine;
use super::redaction_report::RedactionReport;

/// Redacts one video file given its detections.
///
/// Validates configuration, opens both streams, then hands them to the
/// executor. Everything that can go wrong before the first frame is
/// returned as `Err`; anything after is in the report. Single-use: the
/// streams are consumed by the first `execute`.
pub struct RedactVideoUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    executor: Box<dyn PipelineExecutor>,
    config: RedactionConfig,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
}

impl RedactVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        executor: Box<dyn PipelineExecutor>,
        config: RedactionConfig,
        logger: Option<Box<dyn PipelineLogger>>,
        on_progress: Option<ProgressCallback>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            executor,
            config,
            logger: logger.unwrap_or_else(|| Box::new(NullPipelineLogger)),
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Redacts `input` into `output`.
    ///
    /// `metadata` is the caller's statement of the input geometry; it must
    /// agree with what the decoder reports. `total_frames` is filled from
    /// the probe when the caller leaves it at 0.
    pub fn execute(
        &mut self,
        index: &DetectionIndex,
        metadata: &VideoMetadata,
        input: &Path,
        output: &Path,
    ) -> Result<RedactionReport, RedactionError> {
        self.config.validate()?;
        metadata.validate()?;

        let already_run = || RedactionError::Configuration("pipeline already executed".into());
        let mut reader = self.reader.take().ok_or_else(already_run)?;
        let mut writer = self.writer.take().ok_or_else(already_run)?;

        let probed = reader
            .open(input)
            .map_err(|e| RedactionError::stream_open(StreamKind::Input, input, &*e))?;
        if probed.width != metadata.width || probed.height != metadata.height {
            reader.close();
            return Err(RedactionError::Configuration(format!(
                "input is {}x{} but metadata says {}x{}",
                probed.width, probed.height, metadata.width, metadata.height
            )));
        }

        let mut metadata = metadata.clone();
        if metadata.total_frames == 0 {
            metadata.total_frames = probed.total_frames;
        }
        if metadata.source_path.is_none() {
            metadata.source_path = Some(input.to_path_buf());
        }

        let mut engine = match RedactionEngine::new(index, &metadata, &self.config) {
            Ok(engine) => engine,
            Err(e) => {
                reader.close();
                return Err(e);
            }
        };

        if let Err(e) = writer.open(output, &metadata) {
            reader.close();
            return Err(RedactionError::stream_open(StreamKind::Output, output, &*e));
        }

        self.logger.info(&format!(
            "Redacting {} -> {} ({}x{} @ {:.2} fps, {} detections)",
            input.display(),
            output.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            index.detection_count()
        ));

        let control = RunControl::new(self.cancelled.clone(), self.on_progress.take());
        let report = self.executor.execute(
            &mut engine,
            reader,
            writer,
            control,
            self.logger.as_mut(),
        );
        self.logger.summary();
        Ok(report)
    }
}
