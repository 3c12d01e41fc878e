// Event augmentation — random transforms for training
//
// All augmentations operate on an [n, 4] EventArray and draw their randomness
// from the thread RNG on every call.

use rand::thread_rng;
use rand::Rng;

use ember_core::{Column, EventArray};

use crate::transform::EventTransform;

// RandomShift

/// Translate all events by one offset per axis, drawn uniformly from
/// `[-max_shift, max_shift]`.
#[derive(Debug, Clone)]
pub struct RandomShift {
    pub max_shift: f64,
}

impl RandomShift {
    pub fn new(max_shift: f64) -> Self {
        Self { max_shift }
    }
}

impl EventTransform for RandomShift {
    fn apply(&self, mut events: EventArray) -> EventArray {
        if self.max_shift <= 0.0 {
            return events;
        }
        let mut rng = thread_rng();
        let dx = rng.gen_range(-self.max_shift..=self.max_shift);
        let dy = rng.gen_range(-self.max_shift..=self.max_shift);
        events.map_column(Column::X, |x| x + dx);
        events.map_column(Column::Y, |y| y + dy);
        events
    }
}

// RandomHorizontalFlip

/// Mirror x coordinates (`x -> width - 1 - x`) with probability `p`.
#[derive(Debug, Clone)]
pub struct RandomHorizontalFlip {
    pub width: f64,
    pub p: f64,
}

impl RandomHorizontalFlip {
    pub fn new(width: f64, p: f64) -> Self {
        Self { width, p }
    }
}

impl EventTransform for RandomHorizontalFlip {
    fn apply(&self, mut events: EventArray) -> EventArray {
        if thread_rng().gen::<f64>() >= self.p {
            return events;
        }
        let w = self.width;
        events.map_column(Column::X, |x| w - 1.0 - x);
        events
    }
}

// RandomTimeCrop

/// Keep the events of a random window of length `window` inside the
/// recording's time span.  Recordings shorter than the window are kept whole.
#[derive(Debug, Clone)]
pub struct RandomTimeCrop {
    pub window: f64,
}

impl RandomTimeCrop {
    pub fn new(window: f64) -> Self {
        Self { window }
    }
}

impl EventTransform for RandomTimeCrop {
    fn apply(&self, mut events: EventArray) -> EventArray {
        let Some((t_min, t_max)) = events.column_range(Column::Timestamp) else {
            return events;
        };
        let slack = t_max - t_min - self.window;
        if slack <= 0.0 {
            return events;
        }
        let start = t_min + thread_rng().gen_range(0.0..=slack);
        let end = start + self.window;
        let c = Column::Timestamp.index();
        events.retain_rows(|r| r[c] >= start && r[c] <= end);
        events
    }
}

// DropEvents

/// Drop each event independently with probability `p`.
#[derive(Debug, Clone)]
pub struct DropEvents {
    pub p: f64,
}

impl DropEvents {
    pub fn new(p: f64) -> Self {
        Self { p }
    }
}

impl EventTransform for DropEvents {
    fn apply(&self, mut events: EventArray) -> EventArray {
        if self.p <= 0.0 {
            return events;
        }
        let mut rng = thread_rng();
        events.retain_rows(|_| rng.gen::<f64>() >= self.p);
        events
    }
}
