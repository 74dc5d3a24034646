/// Horizontal travel a touch must exceed to count as a swipe.
pub const MIN_SWIPE_DISTANCE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A swipe to the left (start right of end) moves forward.
pub fn resolve_swipe(start_x: f64, end_x: f64) -> Option<Direction> {
    let distance = start_x - end_x;
    if !distance.is_finite() || distance.abs() <= MIN_SWIPE_DISTANCE {
        None
    } else if distance > 0.0 {
        Some(Direction::Forward)
    } else {
        Some(Direction::Backward)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Previous,
    Close,
    Next,
}

impl TapZone {
    /// Three equal columns across the viewer. Taps outside `[0, width]` or on
    /// a degenerate viewer resolve to nothing.
    pub fn from_position(x: f64, width: f64) -> Option<TapZone> {
        if !width.is_finite() || width <= 0.0 || !(0.0..=width).contains(&x) {
            return None;
        }
        let third = width / 3.0;
        if x < third {
            Some(TapZone::Previous)
        } else if x < 2.0 * third {
            Some(TapZone::Close)
        } else {
            Some(TapZone::Next)
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct SwipeTracker {
    origin: Option<f64>,
    last: f64,
}

impl SwipeTracker {
    pub fn start(&mut self, x: f64) {
        self.origin = Some(x);
        self.last = x;
    }

    pub fn track(&mut self, x: f64) {
        if self.origin.is_some() {
            self.last = x;
        }
    }

    pub fn finish(&mut self) -> Option<Direction> {
        let origin = self.origin.take()?;
        resolve_swipe(origin, self.last)
    }
}
