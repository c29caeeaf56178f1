//! Sharded in-memory vector store.
//!
//! Keys are spread over a fixed number of partitions, each guarded by its own
//! reader/writer lock. Every stored vector is L2-normalized on write, so a
//! search scores candidates with a plain dot product.
//!
//! All stored vectors share one dimension. The first successful write fixes it
//! through a compare-and-swap on an atomic; [`Store::clear`] is the only way to
//! unset it again.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::topk::{SearchResult, TopK};
use crate::vector::{normalize, PreparedDotQuery, VectorError};

pub const DEFAULT_PARTITIONS: usize = 32;

/// Dimension value meaning "no vector has been stored yet".
const UNSET_DIMENSION: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub partitions: usize,
    /// When true, NaN and +/-Inf components are rejected on write and search.
    pub strict_finite: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS,
            strict_finite: true,
        }
    }
}

impl StoreConfig {
    pub fn new(partitions: usize, strict_finite: bool) -> Result<Self, StoreError> {
        if partitions == 0 {
            return Err(StoreError::InvalidConfig(
                "partition count must be > 0".to_string(),
            ));
        }

        Ok(Self {
            partitions,
            strict_finite,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    InvalidConfig(String),
    DimensionMismatch { expected: usize, got: usize },
    ZeroVector,
    NonFiniteValue { index: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid config: {message}"),
            Self::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {expected}, got {got}")
            }
            Self::ZeroVector => write!(f, "cannot normalize zero vector"),
            Self::NonFiniteValue { index } => {
                write!(f, "vector contains non-finite value at index {index}")
            }
        }
    }
}

impl Error for StoreError {}

impl From<VectorError> for StoreError {
    fn from(error: VectorError) -> Self {
        match error {
            VectorError::DimensionMismatch { left, right } => Self::DimensionMismatch {
                expected: left,
                got: right,
            },
            VectorError::ZeroVector => Self::ZeroVector,
        }
    }
}

/// Point-in-time view of the store, consistent per partition only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub count: usize,
    pub dimension: usize,
    pub partitions: usize,
    /// Bytes held by stored vector components, excluding keys and map overhead.
    pub vector_bytes: usize,
}

/// One lock-striped slice of the key space.
///
/// Aligned to a cache line so neighbouring partitions never share one.
#[repr(align(64))]
#[derive(Debug, Default)]
struct Partition {
    entries: RwLock<HashMap<String, Vec<f32>>>,
}

impl Partition {
    /// Scores every entry against `query` and keeps this partition's best `k`.
    fn scan(&self, query: &PreparedDotQuery, k: usize) -> Vec<SearchResult> {
        let entries = self.entries.read();
        let mut top = TopK::new(k);
        for (key, values) in entries.iter() {
            // A clear followed by writes of another dimension can land between
            // the caller's dimension check and this scan.
            if values.len() != query.len() {
                continue;
            }
            top.offer_scored(key, query.dot_unchecked(values));
        }
        top.into_vec()
    }
}

#[derive(Debug)]
pub struct Store {
    partitions: Box<[Partition]>,
    dimension: AtomicUsize,
    strict_finite: bool,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let partitions = config.partitions.max(1);
        Self {
            partitions: (0..partitions).map(|_| Partition::default()).collect(),
            dimension: AtomicUsize::new(UNSET_DIMENSION),
            strict_finite: config.strict_finite,
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Returns the enforced dimension, or `0` while unset.
    pub fn dimension(&self) -> usize {
        self.dimension.load(Ordering::SeqCst)
    }

    fn partition_index(&self, key: &str) -> usize {
        crc32fast::hash(key.as_bytes()) as usize % self.partitions.len()
    }

    fn partition(&self, key: &str) -> &Partition {
        &self.partitions[self.partition_index(key)]
    }

    /// Stores `values` under `key`, replacing any previous vector.
    ///
    /// The vector is normalized before it is stored. A failed write leaves the
    /// store untouched, including the dimension.
    pub fn set(&self, key: &str, values: &[f32]) -> Result<(), StoreError> {
        self.check_dimension(values.len())?;
        self.check_finite(values)?;
        let normalized = normalize(values)?;

        let mut entries = self.partition(key).entries.write();
        // Re-checked under the partition lock so an entry never lands with a
        // dimension that a concurrent clear already released.
        self.fix_dimension(normalized.len())?;
        match entries.get_mut(key) {
            Some(slot) => *slot = normalized,
            None => {
                entries.insert(key.to_owned(), normalized);
            }
        }
        Ok(())
    }

    /// Returns the stored (normalized) vector for `key`.
    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.partition(key).entries.read().get(key).cloned()
    }

    /// Removes `key`, reporting whether an entry existed.
    pub fn delete(&self, key: &str) -> bool {
        self.partition(key).entries.write().remove(key).is_some()
    }

    /// Sums partition sizes one lock at a time.
    ///
    /// Under concurrent writes the total is only approximately consistent.
    pub fn count(&self) -> usize {
        self.partitions
            .iter()
            .map(|partition| partition.entries.read().len())
            .sum()
    }

    /// Removes every entry and unsets the dimension.
    ///
    /// Holds every partition's write lock, taken in index order, across the
    /// reset and the sweep. Writers fix the dimension under their partition
    /// lock, so each one lands either wholly before the clear or wholly after.
    pub fn clear(&self) {
        let mut guards: Vec<_> = self
            .partitions
            .iter()
            .map(|partition| partition.entries.write())
            .collect();
        self.dimension.store(UNSET_DIMENSION, Ordering::SeqCst);
        for entries in guards.iter_mut() {
            **entries = HashMap::new();
        }
    }

    pub fn stats(&self) -> StoreStats {
        let count = self.count();
        let dimension = self.dimension();
        StoreStats {
            count,
            dimension,
            partitions: self.partitions.len(),
            vector_bytes: count
                .saturating_mul(dimension)
                .saturating_mul(std::mem::size_of::<f32>()),
        }
    }

    /// Finds the `k` stored vectors most similar to `query`.
    ///
    /// Every partition is scanned by its own task on the rayon pool while the
    /// calling thread folds the per-partition candidates into a single top-k
    /// queue. Results are ordered by descending cosine similarity; the order
    /// among exactly equal scores is unspecified.
    ///
    /// Must not be called from a thread of a single-threaded rayon pool, since
    /// the caller blocks on the scan results.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, StoreError> {
        let dimension = self.dimension();
        if dimension != UNSET_DIMENSION && query.len() != dimension {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                got: query.len(),
            });
        }
        self.check_finite(query)?;
        let normalized = normalize(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let prepared = PreparedDotQuery::new(&normalized);
        let (sender, receiver) = mpsc::channel::<Vec<SearchResult>>();
        let mut top = TopK::new(k);

        rayon::in_place_scope(|scope| {
            for partition in self.partitions.iter() {
                let sender = sender.clone();
                let prepared = &prepared;
                scope.spawn(move |_| {
                    // The receiver outlives every producer, so a send cannot fail.
                    let _ = sender.send(partition.scan(prepared, k));
                });
            }
            drop(sender);

            for candidates in receiver {
                top.extend(candidates);
            }
        });

        Ok(top.into_sorted_vec())
    }

    fn check_dimension(&self, got: usize) -> Result<(), StoreError> {
        let expected = self.dimension();
        if expected != UNSET_DIMENSION && expected != got {
            return Err(StoreError::DimensionMismatch { expected, got });
        }
        Ok(())
    }

    fn fix_dimension(&self, got: usize) -> Result<(), StoreError> {
        match self.dimension.compare_exchange(
            UNSET_DIMENSION,
            got,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => Ok(()),
            Err(expected) if expected == got => Ok(()),
            Err(expected) => Err(StoreError::DimensionMismatch { expected, got }),
        }
    }

    fn check_finite(&self, values: &[f32]) -> Result<(), StoreError> {
        if !self.strict_finite {
            return Ok(());
        }
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(StoreError::NonFiniteValue { index });
        }
        Ok(())
    }
}
