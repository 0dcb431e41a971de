use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::video::domain::video_store::{VideoStore, VideoStoreError};

/// Video store backed by a directory tree.
pub struct LocalVideoStore {
    root: PathBuf,
}

impl LocalVideoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for `key`, refusing anything that would escape the root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, VideoStoreError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(VideoStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl VideoStore for LocalVideoStore {
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), VideoStoreError> {
        let src = self.path_for(key)?;
        let file = fs::File::open(&src).map_err(io_error(&src))?;
        let bytes = write_atomically(dest, file)?;
        log::info!("Fetched {} ({bytes} bytes) to {}", src.display(), dest.display());
        Ok(())
    }

    fn store(&self, src: &Path, key: &str) -> Result<(), VideoStoreError> {
        let dest = self.path_for(key)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let file = fs::File::open(src).map_err(io_error(src))?;
        let bytes = write_atomically(&dest, file)?;
        log::info!("Stored {} ({bytes} bytes) as {}", src.display(), dest.display());
        Ok(())
    }
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> VideoStoreError + '_ {
    move |source| VideoStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Streams `source` into `dest` through a sibling `.part` file, renaming
/// only once every byte is on disk. Returns the byte count.
pub(crate) fn write_atomically(dest: &Path, mut source: impl Read) -> Result<u64, VideoStoreError> {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    let temp = dest.with_file_name(name);

    let result = (|| {
        let mut file = fs::File::create(&temp)?;
        let bytes = std::io::copy(&mut source, &mut file)?;
        file.flush()?;
        file.sync_all()?;
        Ok(bytes)
    })();

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&temp);
            return Err(io_error(&temp)(e));
        }
    };
    fs::rename(&temp, dest).map_err(io_error(dest))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_store_then_fetch() {
        let root = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let store = LocalVideoStore::new(root.path());

        let src = work.path().join("clip.avi");
        fs::write(&src, b"redacted bytes").unwrap();
        store.store(&src, "jobs/42/clip.avi").unwrap();
        assert_eq!(
            fs::read(root.path().join("jobs/42/clip.avi")).unwrap(),
            b"redacted bytes"
        );

        let dest = work.path().join("copy.avi");
        store.fetch("jobs/42/clip.avi", &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"redacted bytes");
    }

    #[test]
    fn test_no_part_file_left_behind() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("out.mp4");
        write_atomically(&dest, &b"abc"[..]).unwrap();
        assert!(dest.exists());
        assert!(!root.path().join("out.mp4.part").exists());
    }

    #[test]
    fn test_fetch_missing_key_is_io_error() {
        let root = TempDir::new().unwrap();
        let store = LocalVideoStore::new(root.path());
        let err = store
            .fetch("nope.mp4", &root.path().join("dest.mp4"))
            .unwrap_err();
        assert!(matches!(err, VideoStoreError::Io { .. }));
        assert!(!root.path().join("dest.mp4").exists());
    }

    #[rstest]
    #[case("")]
    #[case("../escape.mp4")]
    #[case("a/../../b.mp4")]
    #[case("/etc/passwd")]
    fn test_rejects_keys_outside_root(#[case] key: &str) {
        let store = LocalVideoStore::new("/srv/videos");
        assert!(matches!(
            store.path_for(key),
            Err(VideoStoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_nested_key_maps_under_root() {
        let store = LocalVideoStore::new("/srv/videos");
        assert_eq!(
            store.path_for("in/a.mp4").unwrap(),
            PathBuf::from("/srv/videos/in/a.mp4")
        );
    }
}
