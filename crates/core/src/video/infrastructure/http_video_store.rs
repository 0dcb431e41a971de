use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::video::domain::video_store::{VideoStore, VideoStoreError};
use crate::video::infrastructure::local_video_store::{io_error, write_atomically};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Video store speaking plain HTTP: GET to fetch, PUT to store.
///
/// Keys are appended to `base_url`. A key that is already an absolute
/// `http(s)://` URL (a presigned object URL, say) is used verbatim.
pub struct HttpVideoStore {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpVideoStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, VideoStoreError> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|source| VideoStoreError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { base_url, client })
    }

    pub fn url_for(&self, key: &str) -> String {
        if key.starts_with("http://") || key.starts_with("https://") {
            return key.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }

    fn check_status(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, VideoStoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(VideoStoreError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl VideoStore for HttpVideoStore {
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), VideoStoreError> {
        let url = self.url_for(key);
        log::info!("Downloading {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| VideoStoreError::Http {
                url: url.clone(),
                source,
            })?;
        let response = Self::check_status(&url, response)?;
        let bytes = write_atomically(dest, response)?;
        log::info!("Downloaded {bytes} bytes to {}", dest.display());
        Ok(())
    }

    fn store(&self, src: &Path, key: &str) -> Result<(), VideoStoreError> {
        let url = self.url_for(key);
        let file = fs::File::open(src).map_err(io_error(src))?;
        log::info!("Uploading {} to {url}", src.display());
        let response = self
            .client
            .put(&url)
            .body(file)
            .send()
            .map_err(|source| VideoStoreError::Http {
                url: url.clone(),
                source,
            })?;
        Self::check_status(&url, response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serves exactly one request, answering with `status` and `body`.
    /// Joins to the raw request line and body it received.
    fn serve_once(status: &str, body: &'static [u8]) -> (String, JoinHandle<(String, Vec<u8>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut received = vec![0u8; content_length];
            reader.read_exact(&mut received).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(body).unwrap();
            (request_line.trim_end().to_string(), received)
        });
        (format!("http://{addr}"), handle)
    }

    #[rstest]
    #[case("http://host/bucket", "in/a.mp4", "http://host/bucket/in/a.mp4")]
    #[case("http://host/bucket/", "/in/a.mp4", "http://host/bucket/in/a.mp4")]
    #[case("http://host", "https://cdn/x.mp4?sig=1", "https://cdn/x.mp4?sig=1")]
    fn test_url_for(#[case] base: &str, #[case] key: &str, #[case] expected: &str) {
        let store = HttpVideoStore::new(base).unwrap();
        assert_eq!(store.url_for(key), expected);
    }

    #[test]
    fn test_fetch_writes_body() {
        let (base, server) = serve_once("200 OK", b"video bytes");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("in.mp4");

        HttpVideoStore::new(base).unwrap().fetch("in.mp4", &dest).unwrap();

        let (request_line, _) = server.join().unwrap();
        assert!(request_line.starts_with("GET /in.mp4 "));
        assert_eq!(fs::read(&dest).unwrap(), b"video bytes");
    }

    #[test]
    fn test_fetch_error_status() {
        let (base, server) = serve_once("404 Not Found", b"");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("in.mp4");

        let err = HttpVideoStore::new(base)
            .unwrap()
            .fetch("missing.mp4", &dest)
            .unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, VideoStoreError::Status { status: 404, .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_store_puts_file() {
        let (base, server) = serve_once("201 Created", b"");
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("out.avi");
        fs::write(&src, b"redacted").unwrap();

        HttpVideoStore::new(base)
            .unwrap()
            .store(&src, "out/result.avi")
            .unwrap();

        let (request_line, body) = server.join().unwrap();
        assert!(request_line.starts_with("PUT /out/result.avi "));
        assert_eq!(body, b"redacted");
    }

    #[test]
    fn test_store_missing_source_is_io_error() {
        let store = HttpVideoStore::new("http://127.0.0.1:9").unwrap();
        let err = store
            .store(Path::new("/nonexistent/out.avi"), "out.avi")
            .unwrap_err();
        assert!(matches!(err, VideoStoreError::Io { .. }));
    }
}
