// Dataset traits — unified interface over the event adapters

use std::path::Path;

use ember_core::{EventArray, Result};

/// A dataset is an indexed collection of `(events, target)` examples.
///
/// Implementations must be `Send + Sync` so the DataLoader can read from
/// multiple threads when parallel fetching is enabled.
pub trait EventDataset: Send + Sync {
    /// What accompanies the events: a class id, an annotation, ...
    type Target: Send;

    /// Total number of examples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the example at position `index`.
    ///
    /// An index past the end yields [`ember_core::Error::IndexOutOfRange`].
    fn get(&self, index: usize) -> Result<(EventArray, Self::Target)>;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Class-table queries.
///
/// Classification adapters answer from the table built at construction;
/// adapters without a class concept return [`ember_core::Error::Unsupported`].
pub trait ClassLookup {
    /// Number of classes in the table.
    fn num_classes(&self) -> Result<usize>;

    /// Class id of a file, derived from its parent directory name.
    fn path_to_class(&self, path: &Path) -> Result<usize>;
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(ember_core::Error::IndexOutOfRange { index, len });
    }
    Ok(())
}
