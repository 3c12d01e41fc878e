// DataLoader — batching, shuffling, iteration
//
// Event examples differ in length, so a batch is a list of EventArrays plus
// their targets rather than one stacked tensor.  Padding or voxelisation is
// left to the consumer.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use rayon::prelude::*;

use ember_core::{Error, EventArray, Result};

use crate::dataset::EventDataset;

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of examples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of parallel workers for example fetching (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// One batch of examples.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    /// Dataset indices the examples came from.
    pub indices: Vec<usize>,
    pub events: Vec<EventArray>,
    pub targets: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of events across the batch.
    pub fn total_events(&self) -> usize {
        self.events.iter().map(EventArray::num_events).sum()
    }
}

/// A DataLoader wraps a dataset and produces batches of examples.
pub struct DataLoader<'a, D: EventDataset> {
    dataset: &'a D,
    config: DataLoaderConfig,
    indices: Vec<usize>,
    epoch: u64,
}

impl<'a, D: EventDataset> DataLoader<'a, D> {
    /// Create a new DataLoader over a dataset.
    pub fn new(dataset: &'a D, config: DataLoaderConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        let indices: Vec<usize> = (0..dataset.len()).collect();
        Ok(Self {
            dataset,
            config,
            indices,
            epoch: 0,
        })
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of examples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Reshuffle indices (called at the start of each epoch).
    ///
    /// With a seed, epoch `k` is shuffled with `seed + k`, so runs repeat
    /// while epochs still differ.
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            match self.config.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(self.epoch));
                    self.indices.shuffle(&mut rng);
                }
                None => {
                    let mut rng = thread_rng();
                    self.indices.shuffle(&mut rng);
                }
            }
        }
        self.epoch += 1;
    }

    /// Fetch a slice of examples, optionally in parallel via rayon.
    fn fetch(&self, indices: &[usize]) -> Result<Batch<D::Target>> {
        let examples: Vec<(EventArray, D::Target)> =
            if self.config.num_workers > 0 && indices.len() > 1 {
                indices
                    .par_iter()
                    .map(|&i| self.dataset.get(i))
                    .collect::<Result<Vec<_>>>()?
            } else {
                indices
                    .iter()
                    .map(|&i| self.dataset.get(i))
                    .collect::<Result<Vec<_>>>()?
            };
        let (events, targets) = examples.into_iter().unzip();
        Ok(Batch {
            indices: indices.to_vec(),
            events,
            targets,
        })
    }

    /// Iterate over one epoch's batches, reshuffling first.
    pub fn iter_batches(&mut self) -> BatchIterator<'_, 'a, D> {
        self.reshuffle();
        BatchIterator {
            loader: self,
            batch_idx: 0,
        }
    }

    /// Collect one epoch's batches, stopping at the first failing example.
    pub fn epoch_batches(&mut self) -> Result<Vec<Batch<D::Target>>> {
        self.iter_batches().collect()
    }
}

/// Iterator that yields one batch at a time.
pub struct BatchIterator<'l, 'a, D: EventDataset> {
    loader: &'l DataLoader<'a, D>,
    batch_idx: usize,
}

impl<'l, 'a, D: EventDataset> Iterator for BatchIterator<'l, 'a, D> {
    type Item = Result<Batch<D::Target>>;

    fn next(&mut self) -> Option<Self::Item> {
        let bs = self.loader.config.batch_size;
        let n = self.loader.dataset.len();
        let start = self.batch_idx * bs;

        if start >= n {
            return None;
        }
        if self.loader.config.drop_last && start + bs > n {
            return None;
        }

        let end = (start + bs).min(n);
        self.batch_idx += 1;
        Some(self.loader.fetch(&self.loader.indices[start..end]))
    }
}
