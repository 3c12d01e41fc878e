// Dataset Combinators — subset, concatenate, map, split

use std::sync::Arc;

use ember_core::{Error, EventArray, Result};

use crate::dataset::{check_index, EventDataset};
use crate::transform::EventTransform;

impl<D: EventDataset + ?Sized> EventDataset for Arc<D> {
    type Target = D::Target;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<(EventArray, D::Target)> {
        (**self).get(index)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// SubsetDataset — view of selected indices

/// A dataset that exposes only the examples at the given indices.
///
/// This is useful for train/val/test splitting.
pub struct SubsetDataset<D: EventDataset> {
    inner: D,
    indices: Vec<usize>,
}

impl<D: EventDataset> SubsetDataset<D> {
    /// Create a subset of `inner` containing only the examples at `indices`.
    ///
    /// Out-of-range indices surface lazily, as errors from `get`.
    pub fn new(inner: D, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: EventDataset> EventDataset for SubsetDataset<D> {
    type Target = D::Target;

    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<(EventArray, D::Target)> {
        check_index(index, self.indices.len())?;
        self.inner.get(self.indices[index])
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ConcatDataset — concatenate multiple datasets

/// Concatenate two or more datasets with the same target type end-to-end.
pub struct ConcatDataset<T> {
    datasets: Vec<Box<dyn EventDataset<Target = T>>>,
    cumulative_sizes: Vec<usize>,
}

impl<T: Send> ConcatDataset<T> {
    pub fn new(datasets: Vec<Box<dyn EventDataset<Target = T>>>) -> Self {
        let mut cumulative_sizes = Vec::with_capacity(datasets.len());
        let mut total = 0;
        for ds in &datasets {
            total += ds.len();
            cumulative_sizes.push(total);
        }
        Self {
            datasets,
            cumulative_sizes,
        }
    }
}

impl<T: Send> EventDataset for ConcatDataset<T> {
    type Target = T;

    fn len(&self) -> usize {
        self.cumulative_sizes.last().copied().unwrap_or(0)
    }

    fn get(&self, index: usize) -> Result<(EventArray, T)> {
        check_index(index, self.len())?;
        // First dataset whose cumulative size exceeds the index.
        let ds_idx = self.cumulative_sizes.partition_point(|&c| c <= index);
        let offset = if ds_idx == 0 {
            0
        } else {
            self.cumulative_sizes[ds_idx - 1]
        };
        self.datasets[ds_idx].get(index - offset)
    }

    fn name(&self) -> &str {
        "ConcatDataset"
    }
}

// MapDataset — apply an event transform lazily

/// Wraps a dataset and applies a transform to the events of every example.
pub struct MapDataset<D: EventDataset> {
    inner: D,
    transform: Box<dyn EventTransform>,
}

impl<D: EventDataset> MapDataset<D> {
    pub fn new<T: EventTransform + 'static>(inner: D, transform: T) -> Self {
        Self {
            inner,
            transform: Box::new(transform),
        }
    }
}

impl<D: EventDataset> EventDataset for MapDataset<D> {
    type Target = D::Target;

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Result<(EventArray, D::Target)> {
        let (events, target) = self.inner.get(index)?;
        Ok((self.transform.apply(events), target))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// Train / test split

/// Randomly split a dataset into 2 or 3 disjoint subsets.
///
/// Returns `SubsetDataset` views sharing one copy of the dataset.
///
/// # Arguments
/// * `dataset` — the source dataset
/// * `ratios` — slice of 2 or 3 floats that sum to 1.0, e.g. `[0.8, 0.2]`
///   or `[0.7, 0.15, 0.15]`
/// * `seed` — random seed for reproducible shuffling of indices
pub fn train_test_split<D: EventDataset>(
    dataset: D,
    ratios: &[f64],
    seed: u64,
) -> Result<Vec<SubsetDataset<Arc<D>>>> {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    if ratios.len() < 2 || ratios.len() > 3 {
        return Err(Error::InvalidConfig(format!(
            "train_test_split: ratios must have 2 or 3 elements, got {}",
            ratios.len()
        )));
    }
    let sum: f64 = ratios.iter().sum();
    if (sum - 1.0).abs() >= 1e-6 {
        return Err(Error::InvalidConfig(format!(
            "train_test_split: ratios must sum to 1.0, got {sum}"
        )));
    }

    let dataset = Arc::new(dataset);
    let n = dataset.len();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut splits = Vec::with_capacity(ratios.len());
    let mut offset = 0;
    for (i, &ratio) in ratios.iter().enumerate() {
        let count = if i == ratios.len() - 1 {
            n - offset // remainder goes to the last split
        } else {
            (n as f64 * ratio).round() as usize
        };
        let end = (offset + count).min(n);
        splits.push(SubsetDataset::new(
            Arc::clone(&dataset),
            indices[offset..end].to_vec(),
        ));
        offset = end;
    }

    Ok(splits)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tiny helper dataset: example `i` holds `i` events, target `i % 3`.
    struct TinyDataset {
        n: usize,
    }

    impl EventDataset for TinyDataset {
        type Target = usize;

        fn len(&self) -> usize {
            self.n
        }

        fn get(&self, idx: usize) -> Result<(EventArray, usize)> {
            check_index(idx, self.n)?;
            let x = vec![idx as f64; idx];
            Ok((EventArray::from_columns(&x, &x, &x, &x)?, idx % 3))
        }
    }

    #[test]
    fn subset_dataset() {
        let sub = SubsetDataset::new(TinyDataset { n: 10 }, vec![2, 5, 7]);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.get(0).unwrap().0.num_events(), 2);
        assert_eq!(sub.get(1).unwrap().0.num_events(), 5);
        assert_eq!(sub.get(2).unwrap().1, 1);
        assert!(sub.get(3).is_err());
    }

    #[test]
    fn subset_with_bad_index_errors_on_access() {
        let sub = SubsetDataset::new(TinyDataset { n: 2 }, vec![5]);
        assert!(matches!(
            sub.get(0),
            Err(Error::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn concat_dataset() {
        let concat: ConcatDataset<usize> = ConcatDataset::new(vec![
            Box::new(TinyDataset { n: 5 }),
            Box::new(TinyDataset { n: 3 }),
        ]);
        assert_eq!(concat.len(), 8);
        // First 5 come from ds1, next 3 from ds2
        assert_eq!(concat.get(4).unwrap().0.num_events(), 4);
        assert_eq!(concat.get(5).unwrap().0.num_events(), 0);
        assert_eq!(concat.get(7).unwrap().0.num_events(), 2);
        assert!(concat.get(8).is_err());
    }

    #[test]
    fn map_dataset() {
        let mapped = MapDataset::new(TinyDataset { n: 4 }, |mut ev: EventArray| {
            ev.map_column(ember_core::Column::X, |v| v * 10.0);
            ev
        });
        let (ev, target) = mapped.get(2).unwrap();
        assert_eq!(ev.row(0)[0], 20.0);
        assert_eq!(ev.row(0)[1], 2.0);
        assert_eq!(target, 2);
    }

    #[test]
    fn train_test_split_two_way() {
        let splits = train_test_split(TinyDataset { n: 100 }, &[0.8, 0.2], 42).unwrap();
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].len(), 80);
        assert_eq!(splits[1].len(), 20);
        let mut all: Vec<usize> = splits.iter().flat_map(|s| s.indices().to_vec()).collect();
        all.sort();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn train_test_split_three_way() {
        let splits = train_test_split(TinyDataset { n: 100 }, &[0.7, 0.15, 0.15], 42).unwrap();
        assert_eq!(splits.len(), 3);
        assert_eq!(splits[0].len() + splits[1].len() + splits[2].len(), 100);
    }

    #[test]
    fn train_test_split_reproducible() {
        let s1 = train_test_split(TinyDataset { n: 50 }, &[0.8, 0.2], 123).unwrap();
        let s2 = train_test_split(TinyDataset { n: 50 }, &[0.8, 0.2], 123).unwrap();
        assert_eq!(s1[0].indices(), s2[0].indices());
    }

    #[test]
    fn train_test_split_rejects_bad_ratios() {
        assert!(train_test_split(TinyDataset { n: 10 }, &[1.0], 0).is_err());
        assert!(train_test_split(TinyDataset { n: 10 }, &[0.5, 0.4], 0).is_err());
    }
}
