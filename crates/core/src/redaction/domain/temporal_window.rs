/// Inclusive range of frame indices a detection applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameWindow {
    pub lower: usize,
    pub upper: usize,
}

impl FrameWindow {
    pub fn contains(&self, frame_index: usize) -> bool {
        self.lower <= frame_index && frame_index <= self.upper
    }

    /// Number of frames covered.
    pub fn frame_count(&self) -> usize {
        self.upper - self.lower + 1
    }
}

/// Maps a detection timestamp to the run of frames it stays active for.
///
/// Detections are sampled sparsely, so each one is held for
/// `frame_rate / window_divisor` frames past its own frame (plus one).
/// A smaller divisor gives a wider window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemporalWindowResolver {
    frame_rate: f64,
    window_divisor: f64,
}

impl TemporalWindowResolver {
    pub fn new(frame_rate: f64, window_divisor: f64) -> Self {
        debug_assert!(frame_rate > 0.0, "frame_rate must be positive");
        debug_assert!(window_divisor > 0.0, "window_divisor must be positive");
        Self {
            frame_rate,
            window_divisor,
        }
    }

    pub fn resolve(&self, timestamp_ms: u64) -> FrameWindow {
        resolve(timestamp_ms, self.frame_rate, self.window_divisor)
    }
}

/// `lower = floor(t/1000 * fps)`, `upper = floor(t/1000 * fps + fps/divisor) + 1`.
pub fn resolve(timestamp_ms: u64, frame_rate: f64, window_divisor: f64) -> FrameWindow {
    let start = timestamp_ms as f64 / 1000.0 * frame_rate;
    let lower = start.floor() as usize;
    let upper = ((start + frame_rate / window_divisor).floor() as usize).saturating_add(1);
    debug_assert!(upper >= lower, "window upper bound below lower bound");
    FrameWindow {
        lower,
        upper: upper.max(lower),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_zero_timestamp_at_10fps_divisor_2() {
        let w = resolve(0, 10.0, 2.0);
        assert_eq!(w, FrameWindow { lower: 0, upper: 6 });
        assert_eq!(w.frame_count(), 7);
    }

    #[rstest]
    #[case::divisor_2(1000, 24.0, 2.0, 24, 37)]
    #[case::divisor_1(1000, 24.0, 1.0, 24, 49)]
    #[case::off_grid(1534, 29.97, 2.0, 45, 61)]
    #[case::between_frames(50, 10.0, 2.0, 0, 6)]
    fn test_reference_windows(
        #[case] ts: u64,
        #[case] fps: f64,
        #[case] divisor: f64,
        #[case] lower: usize,
        #[case] upper: usize,
    ) {
        assert_eq!(resolve(ts, fps, divisor), FrameWindow { lower, upper });
    }

    #[test]
    fn test_smaller_divisor_widens_window() {
        let narrow = resolve(2000, 30.0, 2.0);
        let wide = resolve(2000, 30.0, 1.0);
        assert_eq!(narrow.lower, wide.lower);
        assert!(wide.upper > narrow.upper);
    }

    #[test]
    fn test_timestamp_zero_always_includes_frame_zero() {
        for fps in [1.0, 12.5, 23.976, 30.0, 60.0, 240.0] {
            for divisor in [0.5, 1.0, 2.0, 8.0, 1000.0] {
                assert!(resolve(0, fps, divisor).contains(0));
            }
        }
    }

    #[test]
    fn test_upper_never_below_lower() {
        for ts in (0..100_000).step_by(997) {
            for fps in [0.5, 15.0, 29.97, 59.94] {
                for divisor in [0.25, 1.0, 2.0, 10_000.0] {
                    let w = resolve(ts, fps, divisor);
                    assert!(w.upper >= w.lower);
                    assert_eq!(w.lower, (ts as f64 / 1000.0 * fps).floor() as usize);
                }
            }
        }
    }

    #[test]
    fn test_contains_is_inclusive() {
        let w = FrameWindow { lower: 3, upper: 5 };
        assert!(!w.contains(2));
        assert!(w.contains(3));
        assert!(w.contains(5));
        assert!(!w.contains(6));
    }

    #[test]
    fn test_resolver_matches_free_function() {
        let resolver = TemporalWindowResolver::new(25.0, 2.0);
        assert_eq!(resolver.resolve(4321), resolve(4321, 25.0, 2.0));
    }
}
