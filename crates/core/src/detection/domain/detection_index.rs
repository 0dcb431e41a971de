use std::collections::BTreeMap;

use super::detection::{Detection, NormalizedBox};

/// Read-only mapping from detection timestamp to the boxes reported then.
///
/// Built once before a run and shared immutably afterwards. A missing
/// timestamp means the detector reported nothing at that instant, not that
/// the frame is face-free.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionIndex {
    entries: BTreeMap<u64, Vec<NormalizedBox>>,
}

impl DetectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_detections(detections: impl IntoIterator<Item = Detection>) -> Self {
        detections.into_iter().collect()
    }

    /// Boxes reported at exactly `timestamp_ms`.
    pub fn get(&self, timestamp_ms: u64) -> Option<&[NormalizedBox]> {
        self.entries.get(&timestamp_ms).map(|v| v.as_slice())
    }

    /// Timestamps in ascending order with their boxes.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[NormalizedBox])> + '_ {
        self.entries.iter().map(|(&ts, boxes)| (ts, boxes.as_slice()))
    }

    /// Number of distinct timestamps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total boxes across all timestamps.
    pub fn detection_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    fn push(&mut self, detection: Detection) {
        self.entries
            .entry(detection.timestamp_ms)
            .or_default()
            .push(detection.bounding_box);
    }
}

impl FromIterator<Detection> for DetectionIndex {
    fn from_iter<T: IntoIterator<Item = Detection>>(iter: T) -> Self {
        let mut index = DetectionIndex::new();
        index.extend(iter);
        index
    }
}

impl Extend<Detection> for DetectionIndex {
    fn extend<T: IntoIterator<Item = Detection>>(&mut self, iter: T) {
        for detection in iter {
            self.push(detection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(ts: u64, left: f64) -> Detection {
        Detection::new(ts, NormalizedBox::new(left, 0.1, 0.2, 0.2))
    }

    #[test]
    fn test_empty_index() {
        let index = DetectionIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.detection_count(), 0);
        assert!(index.get(0).is_none());
    }

    #[test]
    fn test_shared_timestamp_groups_boxes_in_order() {
        let index = DetectionIndex::from_detections([det(500, 0.1), det(500, 0.6)]);
        assert_eq!(index.len(), 1);
        let boxes = index.get(500).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].left, 0.1);
        assert_eq!(boxes[1].left, 0.6);
    }

    #[test]
    fn test_iter_is_sorted_by_timestamp() {
        let index: DetectionIndex = [det(900, 0.1), det(0, 0.1), det(450, 0.1)]
            .into_iter()
            .collect();
        let keys: Vec<u64> = index.iter().map(|(ts, _)| ts).collect();
        assert_eq!(keys, vec![0, 450, 900]);
    }

    #[test]
    fn test_detection_count_spans_timestamps() {
        let index = DetectionIndex::from_detections([det(0, 0.1), det(0, 0.5), det(40, 0.1)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.detection_count(), 3);
    }
}
