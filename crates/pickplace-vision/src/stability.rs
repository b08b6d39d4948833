//! Debouncing of per-frame detections into a single trustworthy target.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Debounce settings: how close consecutive centroids must be and how many
/// consecutive matches confirm a target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilityParams {
    /// Per-axis pixel tolerance between consecutive centroids.
    pub tolerance_px: f64,
    /// Consecutive in-tolerance frames required to confirm.
    pub required_frames: u32,
}

impl Default for StabilityParams {
    fn default() -> Self {
        Self {
            tolerance_px: 2.0,
            required_frames: 2,
        }
    }
}

/// Filter state over one scan attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterState {
    /// No candidate observed yet (or the last frame had none).
    Searching,
    /// A reference centroid is being confirmed.
    Accumulating,
    /// The target is confirmed; the attempt is over.
    Stable,
    /// The scan deadline passed without confirmation. Soft outcome, not an
    /// error.
    TimedOut,
}

/// A pixel coordinate confirmed across consecutive frames. Consumed exactly
/// once by the orchestrator, then discarded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StableTarget {
    pub pixel: Point2<f64>,
}

/// Consumes a sequence of detector outputs and confirms a stable target once
/// consecutive frames agree within tolerance.
///
/// Purely frame-driven; the wall-clock scan deadline is enforced by the scan
/// loop, which calls [`StabilityFilter::mark_timed_out`] when it expires.
#[derive(Clone, Debug)]
pub struct StabilityFilter {
    params: StabilityParams,
    reference: Option<Point2<f64>>,
    count: u32,
    state: FilterState,
}

impl StabilityFilter {
    pub fn new(params: StabilityParams) -> Self {
        Self {
            params,
            reference: None,
            count: 0,
            state: FilterState::Searching,
        }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Reset at the start of each scan attempt.
    pub fn reset(&mut self) {
        self.reference = None;
        self.count = 0;
        self.state = FilterState::Searching;
    }

    /// Feed one frame's primary detection (or its absence).
    pub fn observe(&mut self, detection: Option<Point2<f64>>) -> FilterState {
        if matches!(self.state, FilterState::Stable | FilterState::TimedOut) {
            return self.state;
        }

        match (detection, self.reference) {
            (None, _) => {
                self.reference = None;
                self.count = 0;
                self.state = FilterState::Searching;
            }
            (Some(c), None) => {
                self.reference = Some(c);
                self.count = 1;
                self.state = FilterState::Accumulating;
            }
            (Some(c), Some(r)) => {
                let tol = self.params.tolerance_px;
                if (c.x - r.x).abs() <= tol && (c.y - r.y).abs() <= tol {
                    self.count += 1;
                    self.reference = Some(c);
                    if self.count >= self.params.required_frames {
                        self.state = FilterState::Stable;
                    }
                } else {
                    // Target moved: restart accumulation at the new centroid.
                    self.reference = Some(c);
                    self.count = 1;
                    self.state = FilterState::Accumulating;
                }
            }
        }
        self.state
    }

    /// Called by the scan loop when the wall-clock budget is exhausted.
    pub fn mark_timed_out(&mut self) {
        if self.state != FilterState::Stable {
            self.state = FilterState::TimedOut;
        }
    }

    /// The confirmed target, if the attempt reached [`FilterState::Stable`].
    pub fn stable_target(&self) -> Option<StableTarget> {
        match (self.state, self.reference) {
            (FilterState::Stable, Some(pixel)) => Some(StableTarget { pixel }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> StabilityFilter {
        StabilityFilter::new(StabilityParams::default())
    }

    fn p(x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x, y))
    }

    #[test]
    fn two_matching_frames_confirm_the_target() {
        let mut f = filter();
        assert_eq!(f.observe(p(10.0, 10.0)), FilterState::Accumulating);
        assert_eq!(f.observe(p(10.0, 10.0)), FilterState::Stable);
        assert_eq!(f.stable_target().unwrap().pixel, Point2::new(10.0, 10.0));
    }

    #[test]
    fn a_jump_restarts_accumulation() {
        let mut f = filter();
        assert_eq!(f.observe(p(10.0, 10.0)), FilterState::Accumulating);
        assert_eq!(f.observe(p(50.0, 50.0)), FilterState::Accumulating);
        assert!(f.stable_target().is_none());
        // The new reference is confirmed by the next matching frame.
        assert_eq!(f.observe(p(51.0, 49.0)), FilterState::Stable);
        assert_eq!(f.stable_target().unwrap().pixel, Point2::new(51.0, 49.0));
    }

    #[test]
    fn tolerance_is_per_axis() {
        let mut f = filter();
        f.observe(p(10.0, 10.0));
        // Within 2 px on x but not on y.
        assert_eq!(f.observe(p(11.0, 13.5)), FilterState::Accumulating);
        assert!(f.stable_target().is_none());
    }

    #[test]
    fn a_missed_frame_drops_back_to_searching() {
        let mut f = filter();
        f.observe(p(10.0, 10.0));
        assert_eq!(f.observe(None), FilterState::Searching);
        f.observe(p(10.0, 10.0));
        assert_eq!(f.observe(p(10.0, 10.0)), FilterState::Stable);
    }

    #[test]
    fn timeout_is_terminal_unless_already_stable() {
        let mut f = filter();
        f.observe(p(10.0, 10.0));
        f.mark_timed_out();
        assert_eq!(f.state(), FilterState::TimedOut);
        assert_eq!(f.observe(p(10.0, 10.0)), FilterState::TimedOut);
        assert!(f.stable_target().is_none());
    }

    #[test]
    fn reset_starts_a_fresh_attempt() {
        let mut f = filter();
        f.observe(p(10.0, 10.0));
        f.observe(p(10.0, 10.0));
        f.reset();
        assert_eq!(f.state(), FilterState::Searching);
        assert!(f.stable_target().is_none());
    }

    #[test]
    fn confirmation_reports_the_latest_centroid() {
        let mut f = filter();
        f.observe(p(10.0, 10.0));
        f.observe(p(11.5, 9.0));
        assert_eq!(f.stable_target().unwrap().pixel, Point2::new(11.5, 9.0));
    }
}
