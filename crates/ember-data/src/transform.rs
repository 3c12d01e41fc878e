// Transform — event preprocessing pipeline

use ember_core::{Column, EventArray};

/// A transform applied to the events of each example.
///
/// Any `Fn(EventArray) -> EventArray` closure is a transform.
pub trait EventTransform: Send + Sync {
    /// Apply the transform, returning the modified events.
    fn apply(&self, events: EventArray) -> EventArray;
}

impl<F> EventTransform for F
where
    F: Fn(EventArray) -> EventArray + Send + Sync,
{
    fn apply(&self, events: EventArray) -> EventArray {
        self(events)
    }
}

/// A transform applied jointly to events and their annotation, for
/// augmentations that must keep both in sync (flips, crops, ...).
pub trait PairedTransform<A>: Send + Sync {
    fn apply(&self, events: EventArray, annotation: A) -> (EventArray, A);
}

impl<A, F> PairedTransform<A> for F
where
    F: Fn(EventArray, A) -> (EventArray, A) + Send + Sync,
{
    fn apply(&self, events: EventArray, annotation: A) -> (EventArray, A) {
        self(events, annotation)
    }
}

// Built-in transforms

/// Shift timestamps so the first event is at 0, then divide by `divisor`.
///
/// `ShiftTimestamps::new(1e6)` turns microseconds into seconds.
#[derive(Debug, Clone)]
pub struct ShiftTimestamps {
    divisor: f64,
}

impl ShiftTimestamps {
    pub fn new(divisor: f64) -> Self {
        Self { divisor }
    }
}

impl Default for ShiftTimestamps {
    fn default() -> Self {
        Self { divisor: 1.0 }
    }
}

impl EventTransform for ShiftTimestamps {
    fn apply(&self, mut events: EventArray) -> EventArray {
        if let Some((t0, _)) = events.column_range(Column::Timestamp) {
            let d = self.divisor;
            events.map_column(Column::Timestamp, |t| (t - t0) / d);
        }
        events
    }
}

/// Divide one column by a fixed scale, e.g. pixel coordinates by the
/// sensor width.
#[derive(Debug, Clone)]
pub struct Normalize {
    column: Column,
    scale: f64,
}

impl Normalize {
    pub fn new(column: Column, scale: f64) -> Self {
        Self { column, scale }
    }
}

impl EventTransform for Normalize {
    fn apply(&self, mut events: EventArray) -> EventArray {
        let s = self.scale;
        events.map_column(self.column, |v| v / s);
        events
    }
}

/// Chain multiple transforms.
pub struct Compose {
    transforms: Vec<Box<dyn EventTransform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn EventTransform>>) -> Self {
        Self { transforms }
    }
}

impl EventTransform for Compose {
    fn apply(&self, mut events: EventArray) -> EventArray {
        for t in &self.transforms {
            events = t.apply(events);
        }
        events
    }
}
