//! Per-segment search inputs.

use roaring::RoaringBitmap;

use crate::bkd::{BkdCursor, BkdTree};
use crate::cursor::PointCursor;
use crate::error::Result;

/// One segment of the document space: a rooted tree cursor plus the segment
/// metadata the traversal needs.
///
/// Segments partition the collection; `doc_base` offsets segment-local doc
/// ids into the global id space. `live_docs`, when present, marks live doc
/// ids with set bits; absent bits are deleted and never surface in results.
pub struct Segment<C> {
    /// Cursor positioned at the root of this segment's tree.
    pub cursor: C,
    /// Packed min corner of the segment's full bounding box.
    pub min_packed: Vec<u8>,
    /// Packed max corner of the segment's full bounding box.
    pub max_packed: Vec<u8>,
    /// Dimensions per point; must match the query origin.
    pub num_dims: usize,
    /// Offset of this segment's doc ids in the global id space.
    pub doc_base: u32,
    /// Live-docs bitmap; `None` means every doc is live.
    pub live_docs: Option<RoaringBitmap>,
}

impl<'t> Segment<BkdCursor<'t>> {
    /// Assemble a segment over a built in-memory tree.
    pub fn over_tree(
        tree: &'t BkdTree,
        doc_base: u32,
        live_docs: Option<RoaringBitmap>,
    ) -> Result<Self> {
        let cursor = tree.cursor()?;
        let min_packed = cursor.min_packed().to_vec();
        let max_packed = cursor.max_packed().to_vec();
        Ok(Self {
            cursor,
            min_packed,
            max_packed,
            num_dims: tree.num_dims(),
            doc_base,
            live_docs,
        })
    }
}
