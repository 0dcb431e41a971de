use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Encodes frames to an output stream of fixed geometry.
pub trait VideoWriter: Send {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Writes a frame the caller no longer needs. Writers that hand frames
    /// to another thread override this to skip the copy.
    fn write_owned(&mut self, frame: Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.write(&frame)
    }

    /// Flushes buffered packets and finalizes the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
