//! Best-first branch-and-bound k-nearest-neighbor traversal.
//!
//! A single min-heap frontier holds unexpanded tree cells from every segment,
//! keyed by the squared distance from the query origin to the cell's
//! bounding box. Popping always expands the globally nearest cell, which
//! tightens the pruning radius (the hit queue's worst accepted distance) as
//! fast as possible; once the nearest remaining cell lies beyond that
//! radius, no cell anywhere can improve the result and the traversal stops.

use std::collections::BinaryHeap;
use std::fmt;

use smallvec::SmallVec;

use crate::cursor::PointCursor;
use crate::distance::point_to_rectangle_distance_sq;
use crate::encoding::{decode_dimension, BYTES_PER_DIM};
use crate::error::{Result, SearchError};
use crate::segment::Segment;
use crate::visitor::NearestVisitor;

/// One result of [`nearest`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Global doc id (segment doc id plus the segment's `doc_base`).
    pub doc: u32,
    /// Euclidean distance from the origin to the stored point.
    pub distance: f32,
    /// The raw squared distance the traversal computed, before the
    /// precision-losing sqrt-to-f32 step.
    pub distance_sq: f64,
}

/// An unexpanded subtree on the frontier.
///
/// The bound corners are owned copies: the cursor they were read from keeps
/// navigating after the cell is enqueued, and its buffers may alias internal
/// state that moves with it.
struct Cell<C> {
    cursor: C,
    reader_index: usize,
    min_packed: SmallVec<[u8; 32]>,
    max_packed: SmallVec<[u8; 32]>,
    lower_bound_sq: f64,
}

impl<C: PointCursor> Cell<C> {
    /// Snapshot the cursor's current bounds into a new frontier entry.
    fn from_cursor(cursor: C, reader_index: usize, lower_bound_sq: f64) -> Self {
        let min_packed = SmallVec::from_slice(cursor.min_packed());
        let max_packed = SmallVec::from_slice(cursor.max_packed());
        Self {
            cursor,
            reader_index,
            min_packed,
            max_packed,
            lower_bound_sq,
        }
    }
}

impl<C> fmt::Debug for Cell<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.min_packed.len() / BYTES_PER_DIM;
        let corner = |packed: &[u8]| -> Vec<f32> {
            (0..dims)
                .map(|d| decode_dimension(packed, d * BYTES_PER_DIM))
                .collect()
        };
        f.debug_struct("Cell")
            .field("reader_index", &self.reader_index)
            .field("min", &corner(&self.min_packed))
            .field("max", &corner(&self.max_packed))
            .field("lower_bound_sq", &self.lower_bound_sq)
            .finish()
    }
}

impl<C> PartialEq for Cell<C> {
    fn eq(&self, other: &Self) -> bool {
        self.lower_bound_sq == other.lower_bound_sq
    }
}

impl<C> Eq for Cell<C> {}

impl<C> Ord for Cell<C> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: nearest cell first.
        other.lower_bound_sq.total_cmp(&self.lower_bound_sq)
    }
}

impl<C> PartialOrd for Cell<C> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the `topn` indexed points nearest to `origin` across `segments`.
///
/// Results ascend by `(distance, doc)`; equidistant candidates resolve to
/// the smallest global doc ids, independent of segmentation and visit
/// order. Fewer than `topn` results are returned when fewer live points
/// exist.
///
/// # Errors
///
/// Rejects `topn == 0`, an empty or NaN-bearing origin, and segments whose
/// dimensionality or bounding boxes are inconsistent; I/O errors from
/// disk-backed cursors propagate verbatim.
pub fn nearest<C: PointCursor>(
    segments: &[Segment<C>],
    topn: usize,
    origin: &[f32],
) -> Result<Vec<Neighbor>> {
    if topn < 1 {
        return Err(SearchError::InvalidTopN(topn));
    }
    if origin.is_empty() {
        return Err(SearchError::EmptyOrigin);
    }
    if let Some(d) = origin.iter().position(|v| v.is_nan()) {
        return Err(SearchError::NanOrigin(d));
    }
    for segment in segments {
        check_segment(segment, origin.len())?;
    }

    let mut visitor = NearestVisitor::new(topn, origin);
    let mut frontier: BinaryHeap<Cell<C>> = BinaryHeap::new();

    // One root cell per segment; the segment's declared bounds are
    // authoritative for the root.
    for (i, segment) in segments.iter().enumerate() {
        let lower_bound_sq =
            point_to_rectangle_distance_sq(&segment.min_packed, &segment.max_packed, origin);
        frontier.push(Cell {
            cursor: segment.cursor.clone_cursor()?,
            reader_index: i,
            min_packed: SmallVec::from_slice(&segment.min_packed),
            max_packed: SmallVec::from_slice(&segment.max_packed),
            lower_bound_sq,
        });
    }

    while let Some(mut cell) = frontier.pop() {
        if cell.lower_bound_sq > visitor.bottom_distance_sq() {
            // The nearest unexpanded cell is beyond the radius; so is
            // everything behind it.
            break;
        }

        let reader_index = cell.reader_index;
        if cell.cursor.move_to_child()? {
            // Interior: the cursor now sits on the left child. Clone it so
            // the left subtree stays reachable after the sibling step
            // repositions the original.
            let left = cell.cursor.clone_cursor()?;
            let left_bound_sq =
                point_to_rectangle_distance_sq(left.min_packed(), left.max_packed(), origin);
            if left_bound_sq <= visitor.bottom_distance_sq() {
                frontier.push(Cell::from_cursor(left, reader_index, left_bound_sq));
            }

            if cell.cursor.move_to_sibling()? {
                let right_bound_sq = point_to_rectangle_distance_sq(
                    cell.cursor.min_packed(),
                    cell.cursor.max_packed(),
                    origin,
                );
                if right_bound_sq <= visitor.bottom_distance_sq() {
                    frontier.push(Cell::from_cursor(cell.cursor, reader_index, right_bound_sq));
                }
            }
        } else {
            // Leaf: scan its points under the owning segment's doc base and
            // live-docs view.
            let segment = &segments[reader_index];
            visitor.enter_segment(segment.doc_base, segment.live_docs.as_ref());
            cell.cursor.visit_leaf_values(&mut visitor)?;
        }
    }

    Ok(visitor
        .into_hits()
        .drain_ascending()
        .into_iter()
        .map(|hit| Neighbor {
            doc: hit.doc,
            distance: hit.distance_sq.sqrt() as f32,
            distance_sq: hit.distance_sq,
        })
        .collect())
}

fn check_segment<C>(segment: &Segment<C>, origin_dims: usize) -> Result<()> {
    if segment.num_dims != origin_dims {
        return Err(SearchError::DimensionMismatch {
            origin_dims,
            segment_dims: segment.num_dims,
        });
    }
    let packed_len = origin_dims * BYTES_PER_DIM;
    if segment.min_packed.len() != packed_len || segment.max_packed.len() != packed_len {
        return Err(SearchError::CorruptIndex(format!(
            "segment bounds hold {} / {} bytes, expected {}",
            segment.min_packed.len(),
            segment.max_packed.len(),
            packed_len
        )));
    }
    for d in 0..origin_dims {
        let o = d * BYTES_PER_DIM;
        if segment.min_packed[o..o + BYTES_PER_DIM] > segment.max_packed[o..o + BYTES_PER_DIM] {
            return Err(SearchError::CorruptIndex(format!(
                "segment bounding box has min above max in dimension {d}"
            )));
        }
    }
    Ok(())
}
