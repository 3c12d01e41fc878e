// ClassificationEventDataset — class-per-directory event recordings
//
// Expects one level of class subdirectories:
//
//   root/
//     airplane/
//       rec_0001.dat
//       rec_0002.dat
//     car/
//       rec_0003.dat
//       ...
//
// The reader decides which files count (by extension) and how they decode.
// Class ids are the sorted indices of the parent-directory names seen among
// the discovered files.
//
// USAGE:
//
//   let ds = ClassificationEventDataset::builder(reader, "data/ncars/train")
//       .transform(ShiftTimestamps::new(1e6))
//       .build()?;
//   let (events, label) = ds.get(0)?;

use std::path::{Path, PathBuf};

use ember_core::{EventArray, Result};

use crate::class_table::ClassTable;
use crate::dataset::{check_index, ClassLookup, EventDataset};
use crate::reader::{EventReader, RawEvents};
use crate::source::{FileSource, Layout};
use crate::transform::EventTransform;

/// Builder for [`ClassificationEventDataset`].
pub struct ClassificationEventDatasetBuilder<R: EventReader> {
    reader: R,
    source: FileSource,
    transform: Option<Box<dyn EventTransform>>,
}

impl<R: EventReader> ClassificationEventDatasetBuilder<R> {
    /// Apply `t` to the events of every example.
    pub fn transform<T: EventTransform + 'static>(mut self, t: T) -> Self {
        self.transform = Some(Box::new(t));
        self
    }

    /// Resolve the files and build the class table.
    pub fn build(self) -> Result<ClassificationEventDataset<R>> {
        let files = self.source.resolve(self.reader.extension(), Layout::Nested)?;
        let classes = ClassTable::from_parent_dirs(&files);
        log::debug!(
            "classification dataset: {} files, {} classes",
            files.len(),
            classes.len()
        );
        Ok(ClassificationEventDataset {
            reader: self.reader,
            files,
            classes,
            transform: self.transform,
        })
    }
}

/// An event-classification dataset: `(events, class id)` per file.
pub struct ClassificationEventDataset<R: EventReader> {
    reader: R,
    files: Vec<PathBuf>,
    classes: ClassTable,
    transform: Option<Box<dyn EventTransform>>,
}

impl<R: EventReader> ClassificationEventDataset<R> {
    /// Convenience entry-point: `ClassificationEventDataset::builder(reader, source)`.
    pub fn builder(
        reader: R,
        source: impl Into<FileSource>,
    ) -> ClassificationEventDatasetBuilder<R> {
        ClassificationEventDatasetBuilder {
            reader,
            source: source.into(),
            transform: None,
        }
    }

    /// Build without a transform.
    pub fn new(reader: R, source: impl Into<FileSource>) -> Result<Self> {
        Self::builder(reader, source).build()
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Get the class names (sorted).
    pub fn class_names(&self) -> &[String] {
        self.classes.names()
    }

    pub fn class_table(&self) -> &ClassTable {
        &self.classes
    }

    /// The discovered files, in index order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Get the file path of the i-th example.
    pub fn path_of(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    /// Class id of `path`, from its parent directory name.
    pub fn path_to_class(&self, path: &Path) -> Result<usize> {
        self.classes.class_of_path(path)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Read a slice of events from an arbitrary file with this dataset's reader.
    pub fn read_example(&self, path: &Path, start: usize, count: Option<usize>) -> Result<RawEvents> {
        self.reader.read_example(path, start, count)
    }
}

impl<R: EventReader> EventDataset for ClassificationEventDataset<R> {
    type Target = usize;

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<(EventArray, usize)> {
        check_index(index, self.files.len())?;
        let path = &self.files[index];
        log::trace!("reading example {index}: {}", path.display());

        let raw = self.read_example(path, 0, None)?;
        let mut events = raw.to_array()?;
        if let Some(t) = &self.transform {
            events = t.apply(events);
        }
        let label = self.path_to_class(path)?;
        Ok((events, label))
    }

    fn name(&self) -> &str {
        "ClassificationEventDataset"
    }
}

impl<R: EventReader> ClassLookup for ClassificationEventDataset<R> {
    fn num_classes(&self) -> Result<usize> {
        Ok(self.classes.len())
    }

    fn path_to_class(&self, path: &Path) -> Result<usize> {
        self.classes.class_of_path(path)
    }
}
