use crate::pipeline::pipeline_executor::{PipelineExecutor, RunControl};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::redaction_engine::RedactionEngine;
use crate::pipeline::redaction_report::RedactionReport;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Decodes, redacts and encodes on the calling thread.
#[derive(Default)]
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        engine: &mut RedactionEngine,
        mut reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        control: RunControl,
        logger: &mut dyn PipelineLogger,
    ) -> RedactionReport {
        let report = engine.run(reader.frames(), writer.as_mut(), &control, logger);
        reader.close();
        report
    }
}
