// FixedDirectoryEventDataset — N-ImageNet style event archives
//
// Layout: exactly one directory per class (1000 for N-ImageNet), each holding
// .npz archives with the fields x_pos, y_pos, timestamp and polarity.
//
// Every access rescales the example on the fly:
//
//   x  = (x - min x) / (max x - min x) * target_size + shift[0]
//   y  = (y - min y) / (max y - min y) * target_size + shift[0]
//   ts = (ts - min ts) / 1e6
//   p  = p
//
// with shift drawn uniformly from [-max_shift, max_shift]^2.  Both axes use
// shift[0]; `independent_jitter(true)` switches y to shift[1].

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};

use ember_core::{Error, EventArray, Result};

use crate::class_table::ClassTable;
use crate::dataset::{check_index, ClassLookup, EventDataset};
use crate::npz::{NpzFields, NPZ_EXTENSION};
use crate::reader::RawEvents;
use crate::source::{matching_files, subdirectories};
use crate::transform::EventTransform;

pub const NIMAGENET_CLASSES: usize = 1000;
pub const DEFAULT_MAX_SHIFT: f64 = 20.0;
pub const DEFAULT_TARGET_SIZE: f64 = 224.0;
/// Timestamps are stored in microseconds.
pub const TIMESTAMP_DIVISOR: f64 = 1e6;

/// Builder for [`FixedDirectoryEventDataset`].
pub struct FixedDirectoryEventDatasetBuilder {
    root: PathBuf,
    transform: Option<Box<dyn EventTransform>>,
    expected_classes: usize,
    max_shift: f64,
    target_size: f64,
    independent_jitter: bool,
    seed: Option<u64>,
    fields: NpzFields,
}

impl FixedDirectoryEventDatasetBuilder {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            transform: None,
            expected_classes: NIMAGENET_CLASSES,
            max_shift: DEFAULT_MAX_SHIFT,
            target_size: DEFAULT_TARGET_SIZE,
            independent_jitter: false,
            seed: None,
            fields: NpzFields::default(),
        }
    }

    pub fn transform<T: EventTransform + 'static>(mut self, t: T) -> Self {
        self.transform = Some(Box::new(t));
        self
    }

    /// Number of class directories the root must contain (default 1000).
    pub fn expected_classes(mut self, n: usize) -> Self {
        self.expected_classes = n;
        self
    }

    /// Half-width of the uniform jitter range (default 20).
    pub fn max_shift(mut self, s: f64) -> Self {
        self.max_shift = s;
        self
    }

    /// Upper end of the rescaled coordinate range (default 224).
    pub fn target_size(mut self, s: f64) -> Self {
        self.target_size = s;
        self
    }

    /// Jitter y with its own offset instead of reusing the x offset.
    pub fn independent_jitter(mut self, yes: bool) -> Self {
        self.independent_jitter = yes;
        self
    }

    /// Seed the jitter RNG for reproducible examples.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Archive field names (defaults to x_pos, y_pos, timestamp, polarity).
    pub fn fields(mut self, fields: NpzFields) -> Self {
        self.fields = fields;
        self
    }

    /// Scan the root, check the class count and collect the archives.
    pub fn build(self) -> Result<FixedDirectoryEventDataset> {
        if self.max_shift < 0.0 || !self.max_shift.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "max_shift must be a finite non-negative number, got {}",
                self.max_shift
            )));
        }
        if self.target_size < 0.0 || !self.target_size.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "target_size must be a finite non-negative number, got {}",
                self.target_size
            )));
        }
        if !self.root.is_dir() {
            return Err(Error::NotADirectory(self.root));
        }

        let class_dirs = subdirectories(&self.root)?;
        if class_dirs.len() != self.expected_classes {
            return Err(Error::ClassCount {
                root: self.root,
                expected: self.expected_classes,
                found: class_dirs.len(),
            });
        }
        let classes = ClassTable::from_names(
            class_dirs
                .iter()
                .filter_map(|d| d.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
        );

        let mut files = Vec::new();
        for dir in &class_dirs {
            files.extend(matching_files(dir, NPZ_EXTENSION)?);
        }
        files.sort();
        log::debug!(
            "fixed-directory dataset at {}: {} archives, {} classes",
            self.root.display(),
            files.len(),
            classes.len()
        );

        Ok(FixedDirectoryEventDataset {
            files,
            classes,
            transform: self.transform,
            jitter: Jitter {
                max_shift: self.max_shift,
                target_size: self.target_size,
                independent: self.independent_jitter,
            },
            rng: self.seed.map(|s| Mutex::new(StdRng::seed_from_u64(s))),
            fields: self.fields,
        })
    }
}

/// Rescale-and-jitter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    pub max_shift: f64,
    pub target_size: f64,
    pub independent: bool,
}

impl Default for Jitter {
    fn default() -> Self {
        Self {
            max_shift: DEFAULT_MAX_SHIFT,
            target_size: DEFAULT_TARGET_SIZE,
            independent: false,
        }
    }
}

impl Jitter {
    /// Draw the two offsets, each uniform over `[-max_shift, max_shift]`.
    pub fn draw<G: Rng>(&self, rng: &mut G) -> [f64; 2] {
        let m = self.max_shift;
        [m * (2.0 * rng.gen::<f64>() - 1.0), m * (2.0 * rng.gen::<f64>() - 1.0)]
    }

    /// Rescale raw columns with the given offsets and stack them.
    pub fn normalize(&self, raw: &RawEvents, shifts: [f64; 2]) -> Result<EventArray> {
        let y_shift = if self.independent { shifts[1] } else { shifts[0] };
        let x = rescale(&raw.x, self.target_size, shifts[0]);
        let y = rescale(&raw.y, self.target_size, y_shift);
        let ts = match min_max(&raw.ts) {
            Some((t0, _)) => raw.ts.iter().map(|t| (t - t0) / TIMESTAMP_DIVISOR).collect(),
            None => Vec::new(),
        };
        EventArray::from_columns(&x, &y, &ts, &raw.p)
    }
}

fn min_max(v: &[f64]) -> Option<(f64, f64)> {
    v.iter().fold(None, |acc, &x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    })
}

/// Map `v` onto `[0, size]` by its own min/max, then add `shift`.
/// A constant column maps to `shift`.
fn rescale(v: &[f64], size: f64, shift: f64) -> Vec<f64> {
    let Some((lo, hi)) = min_max(v) else {
        return Vec::new();
    };
    let range = hi - lo;
    if range == 0.0 {
        return vec![shift; v.len()];
    }
    v.iter().map(|x| (x - lo) / range * size + shift).collect()
}

/// An N-ImageNet style dataset: `(events, class id)` per .npz archive.
pub struct FixedDirectoryEventDataset {
    files: Vec<PathBuf>,
    classes: ClassTable,
    transform: Option<Box<dyn EventTransform>>,
    jitter: Jitter,
    rng: Option<Mutex<StdRng>>,
    fields: NpzFields,
}

impl FixedDirectoryEventDataset {
    /// Convenience entry-point: `FixedDirectoryEventDataset::builder(root)`.
    pub fn builder<P: AsRef<Path>>(root: P) -> FixedDirectoryEventDatasetBuilder {
        FixedDirectoryEventDatasetBuilder::new(root)
    }

    /// Build with default settings and no transform.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::builder(root).build()
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn class_names(&self) -> &[String] {
        self.classes.names()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn path_of(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    fn draw_shifts(&self) -> [f64; 2] {
        match &self.rng {
            Some(rng) => {
                let mut guard = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                self.jitter.draw(&mut *guard)
            }
            None => self.jitter.draw(&mut thread_rng()),
        }
    }
}

impl EventDataset for FixedDirectoryEventDataset {
    type Target = usize;

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<(EventArray, usize)> {
        check_index(index, self.files.len())?;
        let path = &self.files[index];
        let label = self.classes.class_of_path(path)?;

        let raw = self.fields.load(path)?;
        let shifts = self.draw_shifts();
        let mut events = self.jitter.normalize(&raw, shifts)?;
        if let Some(t) = &self.transform {
            events = t.apply(events);
        }
        Ok((events, label))
    }

    fn name(&self) -> &str {
        "FixedDirectoryEventDataset"
    }
}

impl ClassLookup for FixedDirectoryEventDataset {
    fn num_classes(&self) -> Result<usize> {
        Ok(self.classes.len())
    }

    fn path_to_class(&self, path: &Path) -> Result<usize> {
        self.classes.class_of_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::Column;

    fn raw() -> RawEvents {
        RawEvents::new(
            vec![10.0, 20.0, 30.0],
            vec![5.0, 5.0, 15.0],
            vec![3_000_000.0, 1_000_000.0, 2_000_000.0],
            vec![1.0, 0.0, 1.0],
        )
    }

    #[test]
    fn normalize_without_shift() {
        let ev = Jitter::default().normalize(&raw(), [0.0, 0.0]).unwrap();
        assert_eq!(ev.column(Column::X), vec![0.0, 112.0, 224.0]);
        assert_eq!(ev.column(Column::Y), vec![0.0, 0.0, 224.0]);
        assert_eq!(ev.column(Column::Timestamp), vec![2.0, 0.0, 1.0]);
        assert_eq!(ev.column(Column::Polarity), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn y_reuses_x_offset_by_default() {
        let ev = Jitter::default().normalize(&raw(), [3.0, -7.0]).unwrap();
        assert_eq!(ev.row(0)[0], 3.0);
        assert_eq!(ev.row(0)[1], 3.0);
    }

    #[test]
    fn independent_jitter_uses_second_offset() {
        let j = Jitter {
            independent: true,
            ..Jitter::default()
        };
        let ev = j.normalize(&raw(), [3.0, -7.0]).unwrap();
        assert_eq!(ev.row(0)[0], 3.0);
        assert_eq!(ev.row(0)[1], -7.0);
    }

    #[test]
    fn constant_column_maps_to_shift() {
        let r = RawEvents::new(vec![4.0; 2], vec![1.0, 2.0], vec![0.0, 1.0], vec![0.0; 2]);
        let ev = Jitter::default().normalize(&r, [1.5, 0.0]).unwrap();
        assert_eq!(ev.column(Column::X), vec![1.5, 1.5]);
    }

    #[test]
    fn offsets_stay_in_range() {
        let j = Jitter::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let [a, b] = j.draw(&mut rng);
            assert!((-20.0..=20.0).contains(&a));
            assert!((-20.0..=20.0).contains(&b));
        }
    }

    #[test]
    fn empty_example_stays_empty() {
        let ev = Jitter::default()
            .normalize(&RawEvents::default(), [1.0, 1.0])
            .unwrap();
        assert!(ev.is_empty());
    }

    #[test]
    fn builder_rejects_bad_target_size() {
        for size in [-1.0, f64::NAN, f64::INFINITY] {
            let err = FixedDirectoryEventDataset::builder("/no/such/ember/root")
                .target_size(size)
                .build()
                .err()
                .unwrap();
            assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("target_size")));
        }
    }
}
