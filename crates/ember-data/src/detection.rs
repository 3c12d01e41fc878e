// DetectionEventDataset — event recordings with paired annotation files
//
// Detection recordings are not grouped by class; examples and their
// annotations share one flat directory:
//
//   root/
//     seq_000_td.dat
//     seq_000_bbox.npy
//     seq_001_td.dat
//     ...
//
// Only files carrying the reader's extension count as examples.  The reader
// maps each example to its annotation file and decides what an annotation is.

use std::path::{Path, PathBuf};

use ember_core::{Error, EventArray, Result};

use crate::dataset::{check_index, ClassLookup, EventDataset};
use crate::reader::{AnnotationReader, RawEvents};
use crate::source::{FileSource, Layout};
use crate::transform::{EventTransform, PairedTransform};

const NO_CLASSES: &str = "class lookup is not available for detection datasets";

/// Builder for [`DetectionEventDataset`].
pub struct DetectionEventDatasetBuilder<R: AnnotationReader> {
    reader: R,
    source: FileSource,
    transform: Option<Box<dyn EventTransform>>,
    paired_transform: Option<Box<dyn PairedTransform<R::Annotation>>>,
}

impl<R: AnnotationReader> DetectionEventDatasetBuilder<R> {
    /// Apply `t` to the events alone.
    pub fn transform<T: EventTransform + 'static>(mut self, t: T) -> Self {
        self.transform = Some(Box::new(t));
        self
    }

    /// Apply `t` to events and annotation together, after the solo transform.
    pub fn paired_transform<T: PairedTransform<R::Annotation> + 'static>(mut self, t: T) -> Self {
        self.paired_transform = Some(Box::new(t));
        self
    }

    pub fn build(self) -> Result<DetectionEventDataset<R>> {
        let files = self.source.resolve(self.reader.extension(), Layout::Flat)?;
        log::debug!("detection dataset: {} files", files.len());
        Ok(DetectionEventDataset {
            reader: self.reader,
            files,
            transform: self.transform,
            paired_transform: self.paired_transform,
        })
    }
}

/// An event-detection dataset: `(events, annotation)` per file.
pub struct DetectionEventDataset<R: AnnotationReader> {
    reader: R,
    files: Vec<PathBuf>,
    transform: Option<Box<dyn EventTransform>>,
    paired_transform: Option<Box<dyn PairedTransform<R::Annotation>>>,
}

impl<R: AnnotationReader> DetectionEventDataset<R> {
    pub fn builder(reader: R, source: impl Into<FileSource>) -> DetectionEventDatasetBuilder<R> {
        DetectionEventDatasetBuilder {
            reader,
            source: source.into(),
            transform: None,
            paired_transform: None,
        }
    }

    /// Build without transforms.
    pub fn new(reader: R, source: impl Into<FileSource>) -> Result<Self> {
        Self::builder(reader, source).build()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn path_of(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn read_example(&self, path: &Path, start: usize, count: Option<usize>) -> Result<RawEvents> {
        self.reader.read_example(path, start, count)
    }

    pub fn read_annotation(
        &self,
        path: &Path,
        ts_start: Option<f64>,
        ts_end: Option<f64>,
    ) -> Result<R::Annotation> {
        self.reader.read_annotation(path, ts_start, ts_end)
    }
}

impl<R: AnnotationReader> EventDataset for DetectionEventDataset<R> {
    type Target = R::Annotation;

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<(EventArray, R::Annotation)> {
        check_index(index, self.files.len())?;
        let path = &self.files[index];
        let ann_path = self.reader.annotation_path(path);
        log::trace!(
            "reading example {index}: {} (annotation {})",
            path.display(),
            ann_path.display()
        );

        let raw = self.read_example(path, 0, None)?;
        let mut events = raw.to_array()?;
        let mut ann = self.read_annotation(&ann_path, None, None)?;

        if let Some(t) = &self.transform {
            events = t.apply(events);
        }
        if let Some(t) = &self.paired_transform {
            (events, ann) = t.apply(events, ann);
        }
        Ok((events, ann))
    }

    fn name(&self) -> &str {
        "DetectionEventDataset"
    }
}

impl<R: AnnotationReader> ClassLookup for DetectionEventDataset<R> {
    fn num_classes(&self) -> Result<usize> {
        Err(Error::Unsupported(NO_CLASSES.to_string()))
    }

    fn path_to_class(&self, _path: &Path) -> Result<usize> {
        Err(Error::Unsupported(NO_CLASSES.to_string()))
    }
}
