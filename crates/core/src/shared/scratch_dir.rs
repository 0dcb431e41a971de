use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::constants::SCRATCH_DIR_NAME;

#[derive(Error, Debug)]
pub enum ScratchDirError {
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("failed to create scratch directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Platform-specific directory for fetched inputs and staged outputs.
///
/// - macOS: `~/Library/Caches/Video Redact/work/`
/// - Linux: `$XDG_CACHE_HOME/Video Redact/work/` or `~/.cache/Video Redact/work/`
/// - Windows: `%LOCALAPPDATA%/Video Redact/work/`
pub fn scratch_dir() -> Result<PathBuf, ScratchDirError> {
    dirs::cache_dir()
        .map(|d| d.join(SCRATCH_DIR_NAME).join("work"))
        .ok_or(ScratchDirError::NoCacheDir)
}

/// Like [`scratch_dir`], creating the directory if needed.
pub fn ensure_scratch_dir() -> Result<PathBuf, ScratchDirError> {
    let dir = scratch_dir()?;
    fs::create_dir_all(&dir).map_err(|source| ScratchDirError::Create {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
