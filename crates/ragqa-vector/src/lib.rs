//! Exact nearest-neighbour search over an in-memory set of vectors.
//!
//! The index is brute force: every query scans all N vectors, so results are
//! the true top-k by squared L2 distance. A larger deployment can swap in an
//! approximate structure behind the same `build`/`search` surface.

pub mod index;

pub use index::{squared_l2, VectorIndex};
