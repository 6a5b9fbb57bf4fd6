use std::cmp::Ordering;

use tracing::debug;

use ragqa_core::error::{Error, Result};
use ragqa_core::types::SearchHit;

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Flat L2 index with a build-then-freeze lifecycle.
///
/// Vectors are appended while the index is being built and stored row-major
/// in one contiguous buffer. [`VectorIndex::freeze`] ends the build phase;
/// from then on the index only answers searches. Insertion order is the key
/// space: the i-th added vector is reported as position i.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dim: Option<usize>,
    data: Vec<f32>,
    total: usize,
    frozen: bool,
}

impl VectorIndex {
    /// An empty index in its build phase.
    pub fn new() -> Self { Self::default() }

    /// Build and freeze in one step.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let mut index = Self::new();
        index.add(vectors)?;
        index.freeze()?;
        Ok(index)
    }

    pub fn total(&self) -> usize { self.total }
    pub fn dim(&self) -> Option<usize> { self.dim }
    pub fn is_built(&self) -> bool { self.frozen }

    /// Append vectors. All-or-nothing: a bad vector leaves the index untouched.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if self.frozen {
            return Err(Error::Index("index is frozen; vectors can only be added during build".to_string()));
        }
        let Some(first) = vectors.first() else { return Ok(()) };
        let dim = self.dim.unwrap_or(first.len());
        if dim == 0 {
            return Err(Error::Index("cannot index zero-length vectors".to_string()));
        }
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(Error::Index(format!("vector {} contains a non-finite value", self.total + i)));
            }
        }

        self.data.reserve(vectors.len() * dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        self.dim = Some(dim);
        self.total += vectors.len();
        Ok(())
    }

    /// End the build phase. An index without vectors has no dimension and cannot be frozen.
    pub fn freeze(&mut self) -> Result<()> {
        if self.frozen {
            return Err(Error::Index("index is already built".to_string()));
        }
        if self.total == 0 {
            return Err(Error::Index("cannot build an index from zero vectors".to_string()));
        }
        self.frozen = true;
        debug!(total = self.total, dim = ?self.dim, "vector index frozen");
        Ok(())
    }

    /// Exact top-`k` by squared L2 distance, nearest first.
    ///
    /// Returns `min(k, total)` hits; equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if !self.frozen {
            return Err(Error::Index("search called before the index was built".to_string()));
        }
        if k == 0 {
            return Err(Error::Index("k must be positive".to_string()));
        }
        let dim = self.dim.unwrap_or(0);
        if query.len() != dim {
            return Err(Error::Index(format!("query has dimension {}, index has {}", query.len(), dim)));
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(dim)
            .enumerate()
            .map(|(position, row)| SearchHit { position, distance: squared_l2(row, query) })
            .collect();

        let k = k.min(hits.len());
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_rank);
            hits.truncate(k);
        }
        hits.sort_unstable_by(by_rank);
        Ok(hits)
    }
}

fn by_rank(a: &SearchHit, b: &SearchHit) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position))
}
