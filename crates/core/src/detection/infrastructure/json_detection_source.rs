use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::detection::domain::detection::{Detection, NormalizedBox};
use crate::detection::domain::face_detection_source::{
    DetectionPage, DetectionSourceError, FaceDetectionSource,
};
use crate::shared::video_metadata::VideoMetadata;

/// Serves detection-service result pages saved as JSON.
///
/// Accepts either one page object or an array of pages chained by
/// `NextToken`, in the service's PascalCase shape:
///
/// ```json
/// { "Faces": [ { "Timestamp": 0, "Face": { "BoundingBox":
///     { "Left": 0.4, "Top": 0.4, "Width": 0.2, "Height": 0.2 } } } ],
///   "NextToken": "abc",
///   "VideoMetadata": { "FrameRate": 10.0, "FrameWidth": 100, "FrameHeight": 100 } }
/// ```
pub struct JsonDetectionSource {
    pages: Vec<DetectionPage>,
}

impl JsonDetectionSource {
    pub fn from_path(path: &Path) -> Result<Self, DetectionSourceError> {
        let text = fs::read_to_string(path).map_err(|source| DetectionSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(json: &str) -> Result<Self, DetectionSourceError> {
        let pages = match serde_json::from_str::<PagesDto>(json)? {
            PagesDto::Many(pages) => pages,
            PagesDto::One(page) => vec![page],
        };
        Ok(Self {
            pages: pages.into_iter().map(PageDto::into_page).collect(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl FaceDetectionSource for JsonDetectionSource {
    fn fetch_page(
        &mut self,
        next_token: Option<&str>,
    ) -> Result<DetectionPage, DetectionSourceError> {
        let Some(token) = next_token else {
            return Ok(self.pages.first().cloned().unwrap_or_default());
        };
        let position = self
            .pages
            .iter()
            .position(|p| p.next_token.as_deref() == Some(token))
            .ok_or_else(|| DetectionSourceError::UnknownToken(token.to_string()))?;
        self.pages
            .get(position + 1)
            .cloned()
            .ok_or_else(|| DetectionSourceError::UnknownToken(token.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PagesDto {
    Many(Vec<PageDto>),
    One(PageDto),
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PageDto {
    #[serde(default)]
    faces: Vec<FaceRecordDto>,
    next_token: Option<String>,
    video_metadata: Option<VideoMetadataDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FaceRecordDto {
    timestamp: u64,
    face: Option<FaceDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FaceDto {
    bounding_box: BoundingBoxDto,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BoundingBoxDto {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VideoMetadataDto {
    frame_rate: f64,
    frame_width: u32,
    frame_height: u32,
    codec: Option<String>,
    duration_millis: Option<u64>,
}

impl PageDto {
    fn into_page(self) -> DetectionPage {
        let detections = self
            .faces
            .into_iter()
            .filter_map(|record| {
                let b = record.face?.bounding_box;
                Some(Detection::new(
                    record.timestamp,
                    NormalizedBox::new(b.left, b.top, b.width, b.height),
                ))
            })
            .collect();
        DetectionPage {
            detections,
            next_token: self.next_token,
            video_metadata: self.video_metadata.map(VideoMetadataDto::into_metadata),
        }
    }
}

impl VideoMetadataDto {
    fn into_metadata(self) -> VideoMetadata {
        let total_frames = self
            .duration_millis
            .map(|ms| (ms as f64 / 1000.0 * self.frame_rate).round() as usize)
            .unwrap_or(0);
        VideoMetadata {
            codec: self.codec.unwrap_or_default(),
            ..VideoMetadata::new(self.frame_rate, self.frame_width, self.frame_height)
                .with_total_frames(total_frames)
        }
    }
}
