// Readers — decode on-disk event files into parallel columns
//
// The adapters never parse files themselves.  They hold a reader and ask it
// for the events of one example (and, for detection, its annotation).  A
// reader owns the file format: its extension, how annotation files are named
// and what an annotation looks like.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ember_core::{EventArray, Result};

/// Events of one example as four parallel columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvents {
    /// Event count as reported by the reader.  Informational only.
    pub len: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub ts: Vec<f64>,
    pub p: Vec<f64>,
}

impl RawEvents {
    /// Build from columns, taking `len` from the x column.
    pub fn new(x: Vec<f64>, y: Vec<f64>, ts: Vec<f64>, p: Vec<f64>) -> Self {
        Self {
            len: x.len(),
            x,
            y,
            ts,
            p,
        }
    }

    /// Stack the columns into an `[n, 4]` array.
    pub fn to_array(&self) -> Result<EventArray> {
        EventArray::from_columns(&self.x, &self.y, &self.ts, &self.p)
    }
}

/// Decodes one kind of event file.
pub trait EventReader: Send + Sync {
    /// File-name suffix this reader handles, including the dot (e.g. `".dat"`).
    fn extension(&self) -> &str;

    /// Read `count` events starting at event `start` (`None` = to the end).
    fn read_example(&self, path: &Path, start: usize, count: Option<usize>) -> Result<RawEvents>;
}

/// A reader that also knows the annotation files paired with its examples.
pub trait AnnotationReader: EventReader {
    /// Ground truth for one example, e.g. bounding boxes over time.
    type Annotation: Send;

    /// Path of the annotation file that belongs to `example`.
    fn annotation_path(&self, example: &Path) -> PathBuf;

    /// Read annotations between `ts_start` and `ts_end`; `None` is unbounded.
    fn read_annotation(
        &self,
        path: &Path,
        ts_start: Option<f64>,
        ts_end: Option<f64>,
    ) -> Result<Self::Annotation>;
}

impl<R: EventReader + ?Sized> EventReader for Arc<R> {
    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn read_example(&self, path: &Path, start: usize, count: Option<usize>) -> Result<RawEvents> {
        (**self).read_example(path, start, count)
    }
}

impl<R: AnnotationReader + ?Sized> AnnotationReader for Arc<R> {
    type Annotation = R::Annotation;

    fn annotation_path(&self, example: &Path) -> PathBuf {
        (**self).annotation_path(example)
    }

    fn read_annotation(
        &self,
        path: &Path,
        ts_start: Option<f64>,
        ts_end: Option<f64>,
    ) -> Result<Self::Annotation> {
        (**self).read_annotation(path, ts_start, ts_end)
    }
}
