use std::path::PathBuf;

/// All errors that can occur within ember.
///
/// Configuration errors surface when a dataset is constructed, lookup and
/// decoding errors surface when an example is accessed. I/O failures from
/// readers are passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source path is not an existing directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The source is neither a directory nor a list of paths.
    #[error("invalid source: {0} (provide either a directory or a list of paths)")]
    InvalidSource(String),

    /// The directory does not hold the expected number of class folders.
    #[error("expected {expected} class directories in {}, found {found}", .root.display())]
    ClassCount {
        root: PathBuf,
        expected: usize,
        found: usize,
    },

    /// A builder or function argument is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A file's parent directory is not part of the class table.
    #[error("unknown class {name:?} for {}", .path.display())]
    UnknownClass { name: String, path: PathBuf },

    /// Dataset index past the end.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The operation is not defined for this kind of dataset.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Event columns must all have the same number of entries.
    #[error("event column length mismatch: x={x}, y={y}, ts={ts}, p={p}")]
    ColumnLength { x: usize, y: usize, ts: usize, p: usize },

    /// An array archive lacks a required field.
    #[error("missing field {field:?} in {}", .path.display())]
    MissingField { field: String, path: PathBuf },

    /// An archive field is not a 1-D array.
    #[error("field {field:?} has shape {shape:?}, expected a 1-D array")]
    FieldShape { field: String, shape: Vec<u64> },

    /// An archive field has a dtype we cannot cast to f64.
    #[error("unsupported dtype {dtype} for field {field:?}")]
    UnsupportedDType { field: String, dtype: String },

    /// Filesystem or reader I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Whether this error was raised while constructing a dataset.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::NotADirectory(_)
                | Error::InvalidSource(_)
                | Error::ClassCount { .. }
                | Error::InvalidConfig(_)
        )
    }
}

/// Convenience Result type used throughout ember.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
