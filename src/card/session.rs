//! Scratch session: pointer tracking, nominal erased-area accounting and the
//! burst / reveal state machine.
//!
//! The session never draws. Each accepted erasure returns a [`Stroke`] that tells
//! the caller what to remove from the cover and which events the update raised.
//! Progress is the sum of nominal disc areas (`π·r²` per erasure point), so
//! overlapping strokes overestimate the truly erased pixels.

use std::f64::consts::PI;

use super::config::ScratchConfig;
use super::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scratching,
    FullyRevealed,
}

/// Events raised by a single progress update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// New burst index when an interval boundary was crossed. At most one burst
    /// per update, however many boundaries were skipped.
    pub burst: Option<u64>,
    /// The update pushed the estimate past the reveal threshold.
    pub revealed: bool,
}

/// One erasure step: a disc at `at`, plus a connecting segment from `from` when
/// the stroke already had a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub at: Point,
    pub from: Option<Point>,
    pub radius: f64,
    pub progress: Progress,
}

impl Stroke {
    /// Width of the connecting segment.
    pub fn segment_width(&self) -> f64 {
        self.radius * 2.0
    }
}

#[derive(Clone, Debug)]
pub struct ScratchSession {
    total_area: f64,
    brush_radius: f64,
    reveal_threshold: f64,
    burst_interval: f64,
    erased_area: f64,
    last_burst_index: u64,
    pointer_down: bool,
    last_point: Option<Point>,
    phase: Phase,
}

impl ScratchSession {
    pub fn new(config: &ScratchConfig) -> Self {
        Self {
            total_area: config.total_area(),
            brush_radius: config.brush_radius,
            reveal_threshold: config.reveal_threshold_fraction,
            burst_interval: config.burst_interval_fraction,
            erased_area: 0.0,
            last_burst_index: 0,
            pointer_down: false,
            last_point: None,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.phase == Phase::FullyRevealed
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn erased_area(&self) -> f64 {
        self.erased_area
    }

    pub fn last_burst_index(&self) -> u64 {
        self.last_burst_index
    }

    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    pub fn brush_radius(&self) -> f64 {
        self.brush_radius
    }

    /// Erased fraction of the card, capped at 1.
    pub fn fraction(&self) -> f64 {
        if self.total_area <= 0.0 {
            return 0.0;
        }
        (self.erased_area / self.total_area).min(1.0)
    }

    fn disc_area(&self) -> f64 {
        PI * self.brush_radius * self.brush_radius
    }

    /// Start a stroke and erase at its first point.
    pub fn pointer_down(&mut self, at: Point) -> Option<Stroke> {
        if self.is_fully_revealed() {
            return None;
        }
        self.pointer_down = true;
        self.last_point = None;
        Some(self.erase_at(at))
    }

    /// Continue the current stroke. Ignored unless a stroke is active.
    pub fn pointer_move(&mut self, at: Point) -> Option<Stroke> {
        if !self.pointer_down || self.is_fully_revealed() {
            return None;
        }
        Some(self.erase_at(at))
    }

    /// End the current stroke (pointer released or left the surface).
    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
        self.last_point = None;
    }

    fn erase_at(&mut self, at: Point) -> Stroke {
        let from = self.last_point.replace(at);
        if self.phase == Phase::Idle {
            self.phase = Phase::Scratching;
        }
        let progress = self.accumulate(self.disc_area());
        Stroke { at, from, radius: self.brush_radius, progress }
    }

    /// Add nominal area and evaluate the thresholds.
    pub(crate) fn accumulate(&mut self, area: f64) -> Progress {
        if self.is_fully_revealed() {
            return Progress::default();
        }
        if area.is_finite() && area > 0.0 {
            self.erased_area += area;
        }
        let mut progress = Progress::default();

        let interval_area = self.burst_interval * self.total_area;
        if interval_area > 0.0 {
            let crossed = (self.erased_area / interval_area).floor() as u64;
            if crossed > self.last_burst_index {
                self.last_burst_index = crossed;
                progress.burst = Some(crossed);
            }
        }

        if self.total_area > 0.0 && self.erased_area / self.total_area > self.reveal_threshold {
            self.phase = Phase::FullyRevealed;
            self.pointer_down = false;
            self.last_point = None;
            progress.revealed = true;
        }
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(width: u32, height: u32, radius: f64) -> ScratchSession {
        ScratchSession::new(&ScratchConfig {
            width,
            height,
            brush_radius: radius,
            ..ScratchConfig::default()
        })
    }

    #[test]
    fn move_without_down_is_ignored() {
        let mut s = session(380, 100, 20.0);
        assert!(s.pointer_move(Point::new(5.0, 5.0)).is_none());
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.erased_area(), 0.0);
    }

    #[test]
    fn down_erases_immediately_and_starts_fresh_stroke() {
        let mut s = session(380, 100, 10.0);
        let first = s.pointer_down(Point::new(10.0, 10.0)).unwrap();
        assert_eq!(first.from, None);
        assert_eq!(s.phase(), Phase::Scratching);

        let second = s.pointer_move(Point::new(30.0, 10.0)).unwrap();
        assert_eq!(second.from, Some(Point::new(10.0, 10.0)));
        assert_eq!(second.segment_width(), 20.0);

        s.pointer_up();
        assert!(!s.is_pointer_down());
        assert_eq!(s.last_point(), None);
        let third = s.pointer_down(Point::new(50.0, 50.0)).unwrap();
        assert_eq!(third.from, None);
    }

    #[test]
    fn estimate_is_sum_of_nominal_discs() {
        let mut s = session(1000, 1000, 5.0);
        let disc = PI * 25.0;
        s.pointer_down(Point::new(1.0, 1.0));
        let mut last = s.erased_area();
        for i in 0..20 {
            // same point repeatedly: overlap is still counted nominally
            s.pointer_move(Point::new(1.0, 1.0 + (i % 2) as f64));
            assert!(s.erased_area() >= last);
            last = s.erased_area();
        }
        s.pointer_up();
        assert!((s.erased_area() - 21.0 * disc).abs() < 1e-9);
    }

    #[test]
    fn large_jump_fires_a_single_burst() {
        let mut s = session(380, 100, 1.0);
        s.accumulate(1000.0);
        assert_eq!(s.last_burst_index(), 0);

        let p = s.accumulate(2000.0);
        assert_eq!(p.burst, Some(1));
        assert!(!p.revealed);
        assert_eq!(s.last_burst_index(), 1);

        // 3000 → 8000 skips boundaries 2, 3 and 4 but raises one event
        let p = s.accumulate(5000.0);
        assert_eq!(p.burst, Some(4));
        assert_eq!(s.last_burst_index(), 4);
    }

    #[test]
    fn burst_index_never_exceeds_estimate() {
        let mut s = session(380, 100, 7.0);
        s.pointer_down(Point::new(0.0, 0.0));
        let interval = 0.05 * 38_000.0;
        while !s.is_fully_revealed() {
            s.pointer_move(Point::new(1.0, 1.0));
            assert!(s.last_burst_index() as f64 * interval <= s.erased_area() + 1e-9);
        }
    }

    #[test]
    fn reveal_is_terminal() {
        let mut s = session(100, 100, 1.0);
        let p = s.accumulate(6001.0);
        assert!(p.revealed);
        assert!(s.is_fully_revealed());
        assert!(!s.is_pointer_down());

        let frozen = s.erased_area();
        assert!(s.pointer_down(Point::new(1.0, 1.0)).is_none());
        assert!(s.pointer_move(Point::new(2.0, 1.0)).is_none());
        assert_eq!(s.accumulate(500.0), Progress::default());
        assert_eq!(s.erased_area(), frozen);
        assert_eq!(s.fraction(), 0.6001);
    }

    #[test]
    fn exactly_at_threshold_is_not_revealed() {
        let mut s = session(100, 100, 1.0);
        assert!(!s.accumulate(6000.0).revealed);
        assert!(s.accumulate(0.5).revealed);
    }
}
