use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Thread-safe boxed error, used where adapter errors cross threads.
pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Which side of the pipeline a stream belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Input,
    Output,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Input => write!(f, "input"),
            StreamKind::Output => write!(f, "output"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RedactionError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("failed to open {kind} stream {path}: {source}")]
    StreamOpen {
        kind: StreamKind,
        path: PathBuf,
        #[source]
        source: SendError,
    },
    #[error("failed to read frame {frame_index}: {source}")]
    StreamRead {
        frame_index: usize,
        #[source]
        source: SendError,
    },
    #[error("failed to write frame {frame_index}: {source}")]
    StreamWrite {
        frame_index: usize,
        #[source]
        source: SendError,
    },
    #[error(
        "frame {frame_index} is {actual_width}x{actual_height}, metadata says {expected_width}x{expected_height}"
    )]
    FrameGeometry {
        frame_index: usize,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

impl RedactionError {
    pub fn stream_open(kind: StreamKind, path: impl Into<PathBuf>, err: &dyn std::error::Error) -> Self {
        RedactionError::StreamOpen {
            kind,
            path: path.into(),
            source: err.to_string().into(),
        }
    }

    pub fn stream_read(frame_index: usize, err: &dyn std::error::Error) -> Self {
        RedactionError::StreamRead {
            frame_index,
            source: err.to_string().into(),
        }
    }

    pub fn stream_write(frame_index: usize, err: &dyn std::error::Error) -> Self {
        RedactionError::StreamWrite {
            frame_index,
            source: err.to_string().into(),
        }
    }

    /// Frame index at which a mid-run failure happened, if any.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            RedactionError::StreamRead { frame_index, .. }
            | RedactionError::StreamWrite { frame_index, .. }
            | RedactionError::FrameGeometry { frame_index, .. } => Some(*frame_index),
            _ => None,
        }
    }
}
