/// Face bounding box in normalized `[0, 1]` frame coordinates, top-left origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// One externally reported face sighting.
///
/// `timestamp_ms` is the offset reported by the detector; it need not fall
/// on a frame boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub timestamp_ms: u64,
    pub bounding_box: NormalizedBox,
}

impl Detection {
    pub fn new(timestamp_ms: u64, bounding_box: NormalizedBox) -> Self {
        Self {
            timestamp_ms,
            bounding_box,
        }
    }
}
