// NumPy archive (.npz) support
//
// An .npz file is a zip of named .npy arrays.  Event recordings converted
// from other formats are commonly stored this way, one 1-D array per event
// field:
//
//   x_pos      (u16 / i32 / ...)
//   y_pos
//   timestamp  (i64 / u64 / f64, microseconds)
//   polarity   (bool / u8 / i8)
//
// Every integer, float or bool dtype is cast to f64 on load.

use std::io::Read;
use std::path::Path;

use npyz::npz::NpzArchive;
use npyz::{DType, NpyFile};

use ember_core::{Error, Result};

use crate::reader::{EventReader, RawEvents};

pub const NPZ_EXTENSION: &str = ".npz";

/// Archive field names for the four event columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpzFields {
    pub x: String,
    pub y: String,
    pub ts: String,
    pub p: String,
}

impl Default for NpzFields {
    fn default() -> Self {
        Self {
            x: "x_pos".to_string(),
            y: "y_pos".to_string(),
            ts: "timestamp".to_string(),
            p: "polarity".to_string(),
        }
    }
}

impl NpzFields {
    pub fn x(mut self, name: &str) -> Self {
        self.x = name.to_string();
        self
    }

    pub fn y(mut self, name: &str) -> Self {
        self.y = name.to_string();
        self
    }

    pub fn ts(mut self, name: &str) -> Self {
        self.ts = name.to_string();
        self
    }

    pub fn p(mut self, name: &str) -> Self {
        self.p = name.to_string();
        self
    }

    /// Load all four columns from the archive at `path`.
    ///
    /// Columns of different lengths are a [`Error::ColumnLength`].
    pub fn load(&self, path: &Path) -> Result<RawEvents> {
        let mut cols = read_npz_fields(
            path,
            &[
                self.x.as_str(),
                self.y.as_str(),
                self.ts.as_str(),
                self.p.as_str(),
            ],
        )?;
        let p = cols.pop().unwrap_or_default();
        let ts = cols.pop().unwrap_or_default();
        let y = cols.pop().unwrap_or_default();
        let x = cols.pop().unwrap_or_default();
        let n = x.len();
        if y.len() != n || ts.len() != n || p.len() != n {
            return Err(Error::ColumnLength {
                x: n,
                y: y.len(),
                ts: ts.len(),
                p: p.len(),
            });
        }
        Ok(RawEvents::new(x, y, ts, p))
    }
}

/// Read the named 1-D arrays from an .npz archive, cast to f64.
///
/// A field absent from the archive is a [`Error::MissingField`].
pub fn read_npz_fields(path: &Path, fields: &[&str]) -> Result<Vec<Vec<f64>>> {
    let mut archive = NpzArchive::open(path)?;
    let mut out = Vec::with_capacity(fields.len());
    for &field in fields {
        let npy = archive
            .by_name(field)?
            .ok_or_else(|| Error::MissingField {
                field: field.to_string(),
                path: path.to_path_buf(),
            })?;
        out.push(array_to_f64(npy, field)?);
    }
    log::trace!("read {} fields from {}", fields.len(), path.display());
    Ok(out)
}

fn cast<T, R, F>(npy: NpyFile<R>, f: F) -> Result<Vec<f64>>
where
    T: npyz::Deserialize,
    R: Read,
    F: Fn(T) -> f64,
{
    Ok(npy.into_vec::<T>()?.into_iter().map(f).collect())
}

fn array_to_f64<R: Read>(npy: NpyFile<R>, field: &str) -> Result<Vec<f64>> {
    if npy.shape().len() != 1 {
        return Err(Error::FieldShape {
            field: field.to_string(),
            shape: npy.shape().to_vec(),
        });
    }
    let code = match npy.dtype() {
        DType::Plain(ts) => ts.to_string(),
        other => {
            return Err(Error::UnsupportedDType {
                field: field.to_string(),
                dtype: format!("{other:?}"),
            })
        }
    };
    // Drop the byte-order character: "<u2" -> "u2".
    match code.get(1..).unwrap_or_default() {
        "b1" => cast(npy, |v: bool| if v { 1.0 } else { 0.0 }),
        "u1" => cast(npy, |v: u8| v as f64),
        "u2" => cast(npy, |v: u16| v as f64),
        "u4" => cast(npy, |v: u32| v as f64),
        "u8" => cast(npy, |v: u64| v as f64),
        "i1" => cast(npy, |v: i8| v as f64),
        "i2" => cast(npy, |v: i16| v as f64),
        "i4" => cast(npy, |v: i32| v as f64),
        "i8" => cast(npy, |v: i64| v as f64),
        "f4" => cast(npy, |v: f32| v as f64),
        "f8" => cast(npy, |v: f64| v),
        _ => Err(Error::UnsupportedDType {
            field: field.to_string(),
            dtype: code.clone(),
        }),
    }
}

/// Reads event examples stored as .npz archives.
#[derive(Debug, Clone, Default)]
pub struct NpzEventReader {
    fields: NpzFields,
}

impl NpzEventReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(fields: NpzFields) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &NpzFields {
        &self.fields
    }
}

impl EventReader for NpzEventReader {
    fn extension(&self) -> &str {
        NPZ_EXTENSION
    }

    fn read_example(&self, path: &Path, start: usize, count: Option<usize>) -> Result<RawEvents> {
        let all = self.fields.load(path)?;
        if start == 0 && count.is_none() {
            return Ok(all);
        }
        let n = all.x.len();
        let lo = start.min(n);
        let hi = match count {
            Some(c) => lo.saturating_add(c).min(n),
            None => n,
        };
        Ok(RawEvents::new(
            all.x[lo..hi].to_vec(),
            all.y[lo..hi].to_vec(),
            all.ts[lo..hi].to_vec(),
            all.p[lo..hi].to_vec(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use npyz::WriterBuilder;
    use std::path::PathBuf;

    /// Write 1-D i64 arrays into an .npz archive.
    pub(crate) fn write_npz(path: &Path, fields: &[(&str, Vec<i64>)]) {
        let mut npz = npyz::npz::NpzWriter::create(path).unwrap();
        for (name, data) in fields {
            let mut writer = npz
                .array(name, Default::default())
                .unwrap()
                .default_dtype()
                .shape(&[data.len() as u64])
                .begin_nd()
                .unwrap();
            writer.extend(data.iter().copied()).unwrap();
            writer.finish().unwrap();
        }
    }

    /// Write one i64 array of the given shape into an .npz archive.
    fn write_shaped(path: &Path, name: &str, shape: &[u64], data: Vec<i64>) {
        let mut npz = npyz::npz::NpzWriter::create(path).unwrap();
        let mut writer = npz
            .array(name, Default::default())
            .unwrap()
            .default_dtype()
            .shape(shape)
            .begin_nd()
            .unwrap();
        writer.extend(data).unwrap();
        writer.finish().unwrap();
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ember_npz_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_archive(dir: &Path) -> PathBuf {
        let path = dir.join("rec.npz");
        write_npz(
            &path,
            &[
                ("x_pos", vec![1, 2, 3, 4]),
                ("y_pos", vec![5, 6, 7, 8]),
                ("timestamp", vec![100, 200, 300, 400]),
                ("polarity", vec![0, 1, 1, 0]),
            ],
        );
        path
    }

    #[test]
    fn reads_all_fields_as_f64() {
        let dir = scratch("all");
        let path = sample_archive(&dir);
        let ev = NpzEventReader::new().read_example(&path, 0, None).unwrap();
        assert_eq!(ev.len, 4);
        assert_eq!(ev.x, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ev.ts, vec![100.0, 200.0, 300.0, 400.0]);
        assert_eq!(ev.p, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn start_and_count_slice_rows() {
        let dir = scratch("slice");
        let path = sample_archive(&dir);
        let ev = NpzEventReader::new().read_example(&path, 1, Some(2)).unwrap();
        assert_eq!(ev.len, 2);
        assert_eq!(ev.y, vec![6.0, 7.0]);
        let tail = NpzEventReader::new().read_example(&path, 3, Some(10)).unwrap();
        assert_eq!(tail.x, vec![4.0]);
    }

    #[test]
    fn missing_field_is_reported() {
        let dir = scratch("missing");
        let path = dir.join("partial.npz");
        write_npz(&path, &[("x_pos", vec![1])]);
        let err = read_npz_fields(&path, &["x_pos", "y_pos"]).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "y_pos"));
    }

    #[test]
    fn custom_field_names() {
        let dir = scratch("custom");
        let path = dir.join("c.npz");
        write_npz(
            &path,
            &[("x", vec![9]), ("y", vec![8]), ("t", vec![7]), ("p", vec![1])],
        );
        let reader = NpzEventReader::with_fields(NpzFields::default().x("x").y("y").ts("t").p("p"));
        let ev = reader.read_example(&path, 0, None).unwrap();
        assert_eq!((ev.x[0], ev.y[0], ev.ts[0], ev.p[0]), (9.0, 8.0, 7.0, 1.0));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let dir = scratch("ragged");
        let path = dir.join("ragged.npz");
        write_npz(
            &path,
            &[
                ("x_pos", vec![1, 2, 3, 4]),
                ("y_pos", vec![5, 6]),
                ("timestamp", vec![100, 200, 300, 400]),
                ("polarity", vec![0, 1, 1, 0]),
            ],
        );
        let reader = NpzEventReader::new();
        let full = reader.read_example(&path, 0, None).unwrap_err();
        assert!(matches!(full, Error::ColumnLength { x: 4, y: 2, .. }));
        let sliced = reader.read_example(&path, 1, Some(2)).unwrap_err();
        assert!(matches!(sliced, Error::ColumnLength { x: 4, y: 2, .. }));
    }

    #[test]
    fn two_dimensional_field_is_rejected() {
        let dir = scratch("shape");
        let path = dir.join("grid.npz");
        write_shaped(&path, "x_pos", &[2, 2], vec![1, 2, 3, 4]);
        let err = read_npz_fields(&path, &["x_pos"]).unwrap_err();
        assert!(matches!(err, Error::FieldShape { ref shape, .. } if shape == &[2, 2]));
    }
}
