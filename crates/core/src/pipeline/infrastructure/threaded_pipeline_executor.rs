use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::pipeline_executor::{PipelineExecutor, RunControl};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::redaction_engine::RedactionEngine;
use crate::pipeline::redaction_report::RedactionReport;
use crate::shared::error::{RedactionError, SendError};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Runs decode and encode on dedicated threads.
///
/// Layout: `reader → main [redact] → writer`, joined by bounded channels.
/// Redaction stays on the calling thread, so frames reach the encoder in
/// input order.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        engine: &mut RedactionEngine,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        control: RunControl,
        logger: &mut dyn PipelineLogger,
    ) -> RedactionReport {
        let cap = self.channel_capacity;
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(cap);

        let reader_handle = spawn_reader(reader, frame_tx, control.cancelled.clone());
        let writer_handle = spawn_writer(writer, write_rx);

        let frames = frame_rx
            .into_iter()
            .map(|r| r.map_err(|e| -> Box<dyn std::error::Error> { e }));
        let mut channel_writer = ChannelWriter::new(write_tx);
        let mut report = engine.run(frames, &mut channel_writer, &control, logger);
        drop(channel_writer);

        if reader_handle.join().is_err() {
            report.fail(RedactionError::StreamRead {
                frame_index: report.frames_written,
                source: "reader thread panicked".into(),
            });
        }

        match writer_handle.join() {
            Ok(outcome) => outcome.merge_into(&mut report),
            Err(_) => report.fail(RedactionError::StreamWrite {
                frame_index: report.frames_written,
                source: "writer thread panicked".into(),
            }),
        }
        report
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: Sender<Result<Frame, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for frame_result in reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let is_err = frame_result.is_err();
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() || is_err {
                break;
            }
        }
        reader.close();
    })
}

/// What the encoder thread actually got onto disk.
struct WriterOutcome {
    frames_written: usize,
    error: Option<RedactionError>,
}

impl WriterOutcome {
    /// The encoder's count is authoritative: frames queued but never
    /// encoded do not count as written.
    fn merge_into(self, report: &mut RedactionReport) {
        report.frames_written = self.frames_written;
        report.last_frame_index = self.frames_written.checked_sub(1);
        if let Some(err) = self.error {
            // The engine only saw a closed channel; the encoder knows why.
            if matches!(
                report.failure,
                None | Some(RedactionError::StreamWrite { .. })
            ) {
                report.failure = None;
            }
            report.fail(err);
        }
    }
}

fn spawn_writer(mut writer: Box<dyn VideoWriter>, write_rx: Receiver<Frame>) -> JoinHandle<WriterOutcome> {
    std::thread::spawn(move || {
        let mut frames_written = 0;
        let mut error = None;
        for frame in &write_rx {
            if let Err(e) = writer.write(&frame) {
                error = Some(RedactionError::stream_write(frames_written, &*e));
                break;
            }
            frames_written += 1;
        }
        drop(write_rx);
        if let Err(e) = writer.close() {
            log::error!("Closing output failed: {e}");
            if error.is_none() {
                error = Some(RedactionError::stream_write(frames_written, &*e));
            }
        }
        WriterOutcome {
            frames_written,
            error,
        }
    })
}

/// `VideoWriter` facade that forwards frames to the encoder thread.
struct ChannelWriter {
    tx: Option<Sender<Frame>>,
}

impl ChannelWriter {
    fn new(tx: Sender<Frame>) -> Self {
        Self { tx: Some(tx) }
    }
}

impl VideoWriter for ChannelWriter {
    fn open(
        &mut self,
        _path: &Path,
        _metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.write_owned(frame.clone())
    }

    fn write_owned(&mut self, frame: Frame) -> Result<(), Box<dyn std::error::Error>> {
        let tx = self.tx.as_ref().ok_or("writer channel already closed")?;
        tx.send(frame)
            .map_err(|_| "writer thread stopped unexpectedly".into())
    }

    /// Hangs up so the encoder thread can finish; its close result is
    /// collected when the thread is joined.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.tx = None;
        Ok(())
    }
}
