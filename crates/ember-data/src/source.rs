// FileSource — where a dataset gets its example files from
//
// A source is either a root directory, scanned with a fixed layout, or an
// explicit list of paths used verbatim.  Two directory layouts exist:
//
//   nested:  root/<class>/<file><ext>     (classification)
//   flat:    root/<file><ext>             (detection)
//
// Matching follows shell-glob rules for `*`: names starting with `.` are
// skipped and a file matches when its name ends with the extension.  Results
// are sorted so indices are stable across runs.

use std::fs;
use std::path::{Path, PathBuf};

use ember_core::{Error, Result};

/// A directory to scan or a fixed list of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Dir(PathBuf),
    List(Vec<PathBuf>),
}

impl From<&str> for FileSource {
    fn from(s: &str) -> Self {
        FileSource::Dir(PathBuf::from(s))
    }
}

impl From<String> for FileSource {
    fn from(s: String) -> Self {
        FileSource::Dir(PathBuf::from(s))
    }
}

impl From<&Path> for FileSource {
    fn from(p: &Path) -> Self {
        FileSource::Dir(p.to_path_buf())
    }
}

impl From<PathBuf> for FileSource {
    fn from(p: PathBuf) -> Self {
        FileSource::Dir(p)
    }
}

impl From<Vec<PathBuf>> for FileSource {
    fn from(v: Vec<PathBuf>) -> Self {
        FileSource::List(v)
    }
}

impl From<&[PathBuf]> for FileSource {
    fn from(v: &[PathBuf]) -> Self {
        FileSource::List(v.to_vec())
    }
}

/// Directory layout to scan a [`FileSource::Dir`] with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `root/*/*<ext>`
    Nested,
    /// `root/*<ext>`
    Flat,
}

impl FileSource {
    /// Resolve the source into a list of files.
    ///
    /// A directory is scanned with `layout`; a list is returned unchanged.
    /// A path that is not an existing directory is a configuration error.
    pub fn resolve(&self, ext: &str, layout: Layout) -> Result<Vec<PathBuf>> {
        match self {
            FileSource::List(files) => Ok(files.clone()),
            FileSource::Dir(root) => {
                if !root.is_dir() {
                    return Err(Error::InvalidSource(format!(
                        "{} is not an existing directory",
                        root.display()
                    )));
                }
                let files = match layout {
                    Layout::Nested => nested_files(root, ext)?,
                    Layout::Flat => matching_files(root, ext)?,
                };
                log::debug!(
                    "discovered {} '{}' files under {}",
                    files.len(),
                    ext,
                    root.display()
                );
                Ok(files)
            }
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn matches_ext(path: &Path, ext: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(ext))
        .unwrap_or(false)
}

/// Sorted, non-hidden immediate subdirectories of `root`.
pub fn subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() && !is_hidden(&path) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Sorted regular files directly in `dir` whose names end with `ext`.
pub fn matching_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && !is_hidden(&path) && matches_ext(&path, ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Files matching `root/*/*<ext>`, sorted.
pub fn nested_files(root: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir in subdirectories(root)? {
        match matching_files(&dir, ext) {
            Ok(found) => files.extend(found),
            Err(Error::Io(e)) => {
                log::warn!("skipping unreadable directory {}: {e}", dir.display());
            }
            Err(e) => return Err(e),
        }
    }
    files.sort();
    Ok(files)
}
