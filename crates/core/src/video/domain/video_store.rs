use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoStoreError {
    #[error("invalid object key '{0}'")]
    InvalidKey(String),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Object storage holding source videos and receiving redacted ones.
///
/// Keys are relative, `/`-separated names. Implementations never leave a
/// partially written object under its final name.
pub trait VideoStore: Send {
    /// Downloads `key` to the local file `dest`.
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), VideoStoreError>;

    /// Uploads the local file `src` as `key`.
    fn store(&self, src: &Path, key: &str) -> Result<(), VideoStoreError>;
}
