//! # ember-data
//!
//! Event-camera datasets, readers and batching for ember.
//!
//! This crate provides:
//! - [`EventDataset`] trait — indexed `(events, target)` access
//! - [`ClassificationEventDataset`] — `root/<class>/<file><ext>` recordings
//! - [`FixedDirectoryEventDataset`] — N-ImageNet style `.npz` archives
//! - [`DetectionEventDataset`] — flat directories with paired annotations
//! - [`EventReader`] / [`AnnotationReader`] — pluggable file decoders
//! - [`DataLoader`] — batching, shuffling, parallel fetching
//   - Event transforms and random augmentations
//   - Dataset combinators and train/test splitting

pub mod augment;
pub mod class_table;
pub mod classification;
pub mod combinators;
pub mod dataset;
pub mod detection;
pub mod loader;
pub mod nimagenet;
pub mod npz;
pub mod reader;
pub mod source;
pub mod transform;

pub use augment::{DropEvents, RandomHorizontalFlip, RandomShift, RandomTimeCrop};
pub use class_table::ClassTable;
pub use classification::{ClassificationEventDataset, ClassificationEventDatasetBuilder};
pub use combinators::{train_test_split, ConcatDataset, MapDataset, SubsetDataset};
pub use dataset::{ClassLookup, EventDataset};
pub use detection::{DetectionEventDataset, DetectionEventDatasetBuilder};
pub use loader::{Batch, DataLoader, DataLoaderConfig};
pub use nimagenet::{FixedDirectoryEventDataset, FixedDirectoryEventDatasetBuilder, Jitter};
pub use npz::{read_npz_fields, NpzEventReader, NpzFields};
pub use reader::{AnnotationReader, EventReader, RawEvents};
pub use source::FileSource;
pub use transform::{Compose, EventTransform, Normalize, PairedTransform, ShiftTimestamps};

pub use ember_core::{Column, Error, EventArray, Result};
