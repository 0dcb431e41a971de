use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::video_metadata::VideoMetadata;

use super::detection::Detection;
use super::detection_index::DetectionIndex;

#[derive(Error, Debug)]
pub enum DetectionSourceError {
    #[error("failed to read detections from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed detection results: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown continuation token '{0}'")]
    UnknownToken(String),
    #[error("continuation token '{0}' was returned twice")]
    RepeatedToken(String),
}

/// One page of detection results from the face-detection service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionPage {
    pub detections: Vec<Detection>,
    pub next_token: Option<String>,
    /// Stream geometry as analysed by the service, when it reports one.
    pub video_metadata: Option<VideoMetadata>,
}

/// Port to the external face-detection service.
///
/// Results arrive paginated; callers pass back the previous page's
/// `next_token` until it is `None`.
pub trait FaceDetectionSource {
    fn fetch_page(&mut self, next_token: Option<&str>)
        -> Result<DetectionPage, DetectionSourceError>;
}

/// Detections materialized from every page of a source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectedDetections {
    pub index: DetectionIndex,
    pub video_metadata: Option<VideoMetadata>,
    pub pages: usize,
}

/// Drains all pages of `source` into a single [`DetectionIndex`].
///
/// An empty continuation token ends pagination just like a missing one.
/// The last page that carries video metadata wins.
pub fn collect_detections(
    source: &mut dyn FaceDetectionSource,
) -> Result<CollectedDetections, DetectionSourceError> {
    let mut collected = CollectedDetections::default();
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut token: Option<String> = None;

    loop {
        let page = source.fetch_page(token.as_deref())?;
        collected.pages += 1;
        log::debug!(
            "Detection page {}: {} faces",
            collected.pages,
            page.detections.len()
        );

        collected.index.extend(page.detections);
        if page.video_metadata.is_some() {
            collected.video_metadata = page.video_metadata;
        }

        match page.next_token.filter(|t| !t.is_empty()) {
            Some(next) => {
                if !seen_tokens.insert(next.clone()) {
                    return Err(DetectionSourceError::RepeatedToken(next));
                }
                token = Some(next);
            }
            None => break,
        }
    }

    log::info!(
        "Collected {} detections at {} timestamps from {} page(s)",
        collected.index.detection_count(),
        collected.index.len(),
        collected.pages
    );
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::NormalizedBox;

    struct StubSource {
        pages: Vec<DetectionPage>,
        requested: Vec<Option<String>>,
    }

    impl FaceDetectionSource for StubSource {
        fn fetch_page(
            &mut self,
            next_token: Option<&str>,
        ) -> Result<DetectionPage, DetectionSourceError> {
            self.requested.push(next_token.map(str::to_string));
            let idx = self.requested.len() - 1;
            self.pages
                .get(idx)
                .cloned()
                .ok_or_else(|| DetectionSourceError::UnknownToken(next_token.unwrap_or("").into()))
        }
    }

    fn page(ts: &[u64], next: Option<&str>) -> DetectionPage {
        DetectionPage {
            detections: ts
                .iter()
                .map(|&t| Detection::new(t, NormalizedBox::new(0.1, 0.1, 0.2, 0.2)))
                .collect(),
            next_token: next.map(str::to_string),
            video_metadata: None,
        }
    }

    #[test]
    fn test_single_page() {
        let mut source = StubSource {
            pages: vec![page(&[0, 40], None)],
            requested: vec![],
        };
        let collected = collect_detections(&mut source).unwrap();
        assert_eq!(collected.pages, 1);
        assert_eq!(collected.index.detection_count(), 2);
        assert_eq!(source.requested, vec![None]);
    }

    #[test]
    fn test_follows_continuation_tokens() {
        let mut source = StubSource {
            pages: vec![page(&[0], Some("a")), page(&[0, 80], Some("b")), page(&[120], None)],
            requested: vec![],
        };
        let collected = collect_detections(&mut source).unwrap();
        assert_eq!(collected.pages, 3);
        assert_eq!(collected.index.get(0).unwrap().len(), 2);
        assert_eq!(collected.index.detection_count(), 4);
        assert_eq!(
            source.requested,
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn test_empty_token_ends_pagination() {
        let mut source = StubSource {
            pages: vec![page(&[0], Some(""))],
            requested: vec![],
        };
        let collected = collect_detections(&mut source).unwrap();
        assert_eq!(collected.pages, 1);
    }

    #[test]
    fn test_repeated_token_is_an_error() {
        let mut source = StubSource {
            pages: vec![page(&[], Some("x")), page(&[], Some("x"))],
            requested: vec![],
        };
        let result = collect_detections(&mut source);
        assert!(matches!(result, Err(DetectionSourceError::RepeatedToken(t)) if t == "x"));
    }

    #[test]
    fn test_keeps_last_reported_metadata() {
        let mut first = page(&[], Some("n"));
        first.video_metadata = Some(VideoMetadata::new(24.0, 640, 360));
        let mut source = StubSource {
            pages: vec![first, page(&[10], None)],
            requested: vec![],
        };
        let collected = collect_detections(&mut source).unwrap();
        assert_eq!(
            collected.video_metadata,
            Some(VideoMetadata::new(24.0, 640, 360))
        );
    }

    #[test]
    fn test_source_error_propagates() {
        let mut source = StubSource {
            pages: vec![],
            requested: vec![],
        };
        assert!(collect_detections(&mut source).is_err());
    }
}
