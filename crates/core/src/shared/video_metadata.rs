use std::path::PathBuf;

use crate::shared::error::RedactionError;

/// Geometry and timing of a video stream.
///
/// The engine trusts the caller's `width`/`height`/`fps`; `total_frames` is
/// informational (0 when unknown) and only drives progress reporting.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn new(fps: f64, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        }
    }

    pub fn with_total_frames(mut self, total_frames: usize) -> Self {
        self.total_frames = total_frames;
        self
    }

    pub fn validate(&self) -> Result<(), RedactionError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(RedactionError::Configuration(format!(
                "frame rate must be positive, got {}",
                self.fps
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(RedactionError::Configuration(format!(
                "frame dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}
