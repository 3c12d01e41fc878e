// ClassTable — sorted class names with a name → id map
//
// Class ids are the 0-based positions of the names after sorting, so the
// same directory layout always yields the same labels.  The table is built
// once and never mutated afterwards.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use ember_core::{Error, Result};

/// Stable mapping between class names and 0-based ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTable {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ClassTable {
    /// Build a table from any collection of names; duplicates are collapsed.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let names: Vec<String> = sorted.into_iter().collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, ids }
    }

    /// Build a table from the parent-directory basenames of `files`.
    pub fn from_parent_dirs<P: AsRef<Path>>(files: &[P]) -> Self {
        Self::from_names(files.iter().map(|f| parent_name(f.as_ref())))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Look up the class of `path` by its parent directory name.
    pub fn class_of_path(&self, path: &Path) -> Result<usize> {
        let name = parent_name(path);
        self.index_of(&name).ok_or_else(|| Error::UnknownClass {
            name,
            path: path.to_path_buf(),
        })
    }
}

/// Basename of the directory holding `path`; empty when there is none.
pub(crate) fn parent_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
