//! Bounded top-k selection over search candidates.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

/// Upper bound on the capacity reserved up front for one queue.
const MAX_PREALLOCATED: usize = 1024;

/// One scored candidate produced by a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub key: String,
    /// Cosine similarity to the query; higher is better.
    pub similarity: f32,
}

impl SearchResult {
    pub fn new(key: impl Into<String>, similarity: f32) -> Self {
        Self {
            key: key.into(),
            similarity,
        }
    }
}

/// Heap entry that puts the lowest similarity at the top of a max-heap.
///
/// Ordering only looks at the similarity; equal scores compare equal, so the
/// order among exact ties depends on insertion order alone.
#[derive(Debug)]
struct WeakestFirst(SearchResult);

impl PartialEq for WeakestFirst {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for WeakestFirst {}

impl PartialOrd for WeakestFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeakestFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.similarity.total_cmp(&self.0.similarity)
    }
}

/// Retains the `k` highest-similarity results offered to it.
#[derive(Debug)]
pub struct TopK {
    k: usize,
    heap: BinaryHeap<WeakestFirst>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.min(MAX_PREALLOCATED)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Folds `candidate` into the queue and reports whether it was kept.
    ///
    /// Once full, a candidate only displaces the current minimum when its
    /// similarity is strictly greater.
    pub fn offer(&mut self, candidate: SearchResult) -> bool {
        if self.heap.len() < self.k {
            self.heap.push(WeakestFirst(candidate));
            return true;
        }

        let Some(mut weakest) = self.heap.peek_mut() else {
            return false;
        };
        if candidate.similarity > weakest.0.similarity {
            *weakest = WeakestFirst(candidate);
            return true;
        }
        false
    }

    /// Like [`TopK::offer`] but only clones the key when the score would be kept.
    pub fn offer_scored(&mut self, key: &str, similarity: f32) -> bool {
        if self.would_accept(similarity) {
            self.offer(SearchResult::new(key, similarity))
        } else {
            false
        }
    }

    fn would_accept(&self, similarity: f32) -> bool {
        if self.heap.len() < self.k {
            return true;
        }
        self.heap
            .peek()
            .is_some_and(|weakest| similarity > weakest.0.similarity)
    }

    /// Drains the queue without ordering the results.
    pub fn into_vec(self) -> Vec<SearchResult> {
        self.heap.into_iter().map(|entry| entry.0).collect()
    }

    /// Drains the queue into a vector ordered by descending similarity.
    pub fn into_sorted_vec(self) -> Vec<SearchResult> {
        // Ascending heap order is descending similarity for `WeakestFirst`.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| entry.0)
            .collect()
    }
}

impl Extend<SearchResult> for TopK {
    fn extend<I: IntoIterator<Item = SearchResult>>(&mut self, iter: I) {
        for candidate in iter {
            self.offer(candidate);
        }
    }
}
