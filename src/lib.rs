//! proxima: exact k-nearest-neighbor search over block k-d tree point
//! indexes.
//!
//! Given a query origin in R^d and a collection of per-segment k-d tree
//! indexes that together partition a document space, [`nearest`] returns the
//! `topN` documents whose stored point is closest to the origin under
//! Euclidean distance.
//!
//! # How it works
//!
//! The search is a best-first branch-and-bound over tree cells:
//!
//! - a **cell frontier** (min-heap) holds unexpanded subtrees from *all*
//!   segments at once, keyed by the point-to-bounding-box lower bound, so the
//!   globally most promising region is always expanded next;
//! - a **bounded hit queue** (max-heap of size `topN`) holds the best points
//!   seen so far; once full, its worst entry is the dynamic pruning radius;
//! - a **leaf visitor** scans leaf blocks. It skips deleted docs, abandons
//!   partial distance sums that already exceed the radius, and breaks
//!   distance ties toward smaller doc ids so results are deterministic under
//!   any segmentation.
//!
//! The traversal ends when the nearest remaining cell lies strictly beyond
//! the radius. Visited leaves are streamed through the [`PointCursor`]
//! protocol, which any tree implementation (in-memory or disk-backed) can
//! provide; [`BkdTree`] is the built-in in-memory implementation.
//!
//! Cross-segment best-first ordering matters: iterating "for each segment,
//! search" would tighten the radius much more slowly and visit far more
//! points.
//!
//! # Example
//!
//! ```
//! use proxima::{nearest, BkdTree, BkdTreeParams, Segment};
//!
//! let mut tree = BkdTree::new(2, BkdTreeParams::default())?;
//! tree.add(0, &[0.0, 0.0])?;
//! tree.add(1, &[3.0, 4.0])?;
//! tree.add(2, &[1.0, 1.0])?;
//! tree.build()?;
//!
//! let segments = vec![Segment::over_tree(&tree, 0, None)?];
//! let hits = nearest(&segments, 2, &[0.0, 0.0])?;
//!
//! assert_eq!(hits[0].doc, 0);
//! assert_eq!(hits[1].doc, 2);
//! assert!((hits[1].distance - 2f32.sqrt()).abs() < 1e-6);
//! # Ok::<(), proxima::SearchError>(())
//! ```
//!
//! # Scope
//!
//! proxima does exact search only; there is no quantization or graph-based
//! approximate mode. Queries are single-threaded, and segment structures are
//! read-only for the duration of a query.

pub mod bkd;
pub mod cursor;
pub mod distance;
pub mod encoding;
pub mod error;
pub mod heap;
pub mod search;
pub mod segment;

mod visitor;

pub use bkd::{BkdCursor, BkdTree, BkdTreeParams};
pub use cursor::{CellRelation, PointCursor, PointVisitor};
pub use error::{Result, SearchError};
pub use heap::{HitQueue, NearestHit};
pub use search::{nearest, Neighbor};
pub use segment::Segment;
