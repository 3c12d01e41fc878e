// EventArray — a stack of (x, y, timestamp, polarity) tuples
//
// Events are stored row-major with four columns:
//
//   row i: [x_i, y_i, ts_i, p_i]
//
// so the array has shape [n, 4].  Readers hand out four parallel columns,
// `from_columns` interleaves them.  Values are kept as f64 regardless of the
// on-disk dtype.

use crate::error::{Error, Result};

/// Number of columns per event.
pub const EVENT_COLUMNS: usize = 4;

/// One of the four event columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    X,
    Y,
    Timestamp,
    Polarity,
}

impl Column {
    /// All columns in storage order.
    pub const ALL: [Column; EVENT_COLUMNS] =
        [Column::X, Column::Y, Column::Timestamp, Column::Polarity];

    /// Offset of this column inside a row.
    pub fn index(self) -> usize {
        match self {
            Column::X => 0,
            Column::Y => 1,
            Column::Timestamp => 2,
            Column::Polarity => 3,
        }
    }
}

/// A dense `[n, 4]` array of events with columns `[x, y, ts, polarity]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventArray {
    data: Vec<f64>,
}

impl EventArray {
    /// An array holding no events.
    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }

    /// Stack four parallel columns into rows.
    ///
    /// Fails with [`Error::ColumnLength`] when the columns differ in length.
    pub fn from_columns(x: &[f64], y: &[f64], ts: &[f64], p: &[f64]) -> Result<Self> {
        let n = x.len();
        if y.len() != n || ts.len() != n || p.len() != n {
            return Err(Error::ColumnLength {
                x: x.len(),
                y: y.len(),
                ts: ts.len(),
                p: p.len(),
            });
        }
        let mut data = Vec::with_capacity(n * EVENT_COLUMNS);
        for i in 0..n {
            data.extend_from_slice(&[x[i], y[i], ts[i], p[i]]);
        }
        Ok(Self { data })
    }

    /// Wrap an already row-major buffer.  Its length must be a multiple of 4.
    pub fn from_rows(data: Vec<f64>) -> Result<Self> {
        if data.len() % EVENT_COLUMNS != 0 {
            crate::bail!(
                "row-major event buffer of length {} is not a multiple of {EVENT_COLUMNS}",
                data.len()
            );
        }
        Ok(Self { data })
    }

    /// Number of events (rows).
    pub fn num_events(&self) -> usize {
        self.data.len() / EVENT_COLUMNS
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `[num_events, 4]`.
    pub fn shape(&self) -> [usize; 2] {
        [self.num_events(), EVENT_COLUMNS]
    }

    /// The `i`-th event as `[x, y, ts, p]`.
    ///
    /// # Panics
    /// Panics if `i >= num_events()`.
    pub fn row(&self, i: usize) -> [f64; EVENT_COLUMNS] {
        let r = &self.data[i * EVENT_COLUMNS..(i + 1) * EVENT_COLUMNS];
        [r[0], r[1], r[2], r[3]]
    }

    /// Iterate rows as slices of length 4.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(EVENT_COLUMNS)
    }

    /// Copy one column out.
    pub fn column(&self, col: Column) -> Vec<f64> {
        let c = col.index();
        self.rows().map(|r| r[c]).collect()
    }

    /// Minimum and maximum of a column, `None` if there are no events.
    pub fn column_range(&self, col: Column) -> Option<(f64, f64)> {
        let c = col.index();
        self.rows().fold(None, |acc, r| {
            let v = r[c];
            Some(match acc {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            })
        })
    }

    /// Apply `f` to every value of a column in place.
    pub fn map_column<F: FnMut(f64) -> f64>(&mut self, col: Column, mut f: F) {
        let c = col.index();
        for r in self.data.chunks_exact_mut(EVENT_COLUMNS) {
            r[c] = f(r[c]);
        }
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn retain_rows<F: FnMut(&[f64]) -> bool>(&mut self, mut keep: F) {
        let mut out = Vec::with_capacity(self.data.len());
        for r in self.data.chunks_exact(EVENT_COLUMNS) {
            if keep(r) {
                out.extend_from_slice(r);
            }
        }
        self.data = out;
    }

    /// Row-major view of the data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the array, returning the row-major buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacks_columns_row_major() {
        let ev = EventArray::from_columns(&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0], &[0.0, 1.0])
            .unwrap();
        assert_eq!(ev.shape(), [2, 4]);
        assert_eq!(ev.as_slice(), &[1.0, 3.0, 5.0, 0.0, 2.0, 4.0, 6.0, 1.0]);
        assert_eq!(ev.row(1), [2.0, 4.0, 6.0, 1.0]);
        assert_eq!(ev.column(Column::Timestamp), vec![5.0, 6.0]);
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = EventArray::from_columns(&[1.0], &[1.0, 2.0], &[1.0], &[1.0]).unwrap_err();
        assert!(matches!(err, Error::ColumnLength { x: 1, y: 2, .. }));
    }

    #[test]
    fn from_rows_requires_whole_rows() {
        assert!(EventArray::from_rows(vec![0.0; 8]).is_ok());
        let err = EventArray::from_rows(vec![0.0; 7]).unwrap_err();
        assert!(matches!(err, Error::Msg(ref m) if m.contains("length 7")));
    }

    #[test]
    fn column_range_and_map() {
        let mut ev =
            EventArray::from_columns(&[4.0, 1.0, 9.0], &[0.0; 3], &[0.0; 3], &[1.0; 3]).unwrap();
        assert_eq!(ev.column_range(Column::X), Some((1.0, 9.0)));
        ev.map_column(Column::X, |v| v * 2.0);
        assert_eq!(ev.column(Column::X), vec![8.0, 2.0, 18.0]);
        assert_eq!(EventArray::empty().column_range(Column::X), None);
    }

    #[test]
    fn retain_rows_filters_events() {
        let mut ev = EventArray::from_columns(
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0; 4],
            &[10.0, 20.0, 30.0, 40.0],
            &[1.0; 4],
        )
        .unwrap();
        ev.retain_rows(|r| r[2] >= 20.0 && r[2] < 40.0);
        assert_eq!(ev.num_events(), 2);
        assert_eq!(ev.column(Column::X), vec![1.0, 2.0]);
    }
}
