//! Leaf visitor: filters, scores, and collects points during traversal.

use roaring::RoaringBitmap;

use crate::cursor::{CellRelation, PointVisitor};
use crate::distance::point_to_rectangle_distance_sq;
use crate::encoding::{decode_dimension, BYTES_PER_DIM};
use crate::heap::HitQueue;

/// Consumes the points of leaf cells: drops deleted docs, evaluates squared
/// distances with early abandoning, and feeds survivors to the hit queue.
///
/// The visitor also owns the dynamic pruning radius: once the queue is full,
/// `bottom_distance_sq`/`bottom_doc` mirror the queue's worst entry, and the
/// traversal driver reads them to admit or discard cells.
pub(crate) struct NearestVisitor<'a> {
    hits: HitQueue,
    origin: &'a [f32],
    cur_doc_base: u32,
    cur_live_docs: Option<&'a RoaringBitmap>,
    bottom_distance_sq: f64,
    bottom_doc: u32,
}

impl<'a> NearestVisitor<'a> {
    pub(crate) fn new(topn: usize, origin: &'a [f32]) -> Self {
        Self {
            hits: HitQueue::new(topn),
            origin,
            cur_doc_base: 0,
            cur_live_docs: None,
            bottom_distance_sq: f64::INFINITY,
            bottom_doc: u32::MAX,
        }
    }

    /// Point the visitor at the segment whose leaf is about to be scanned.
    pub(crate) fn enter_segment(&mut self, doc_base: u32, live_docs: Option<&'a RoaringBitmap>) {
        self.cur_doc_base = doc_base;
        self.cur_live_docs = live_docs;
    }

    /// Current pruning radius (squared). Infinite until the queue fills.
    pub(crate) fn bottom_distance_sq(&self) -> f64 {
        self.bottom_distance_sq
    }

    pub(crate) fn into_hits(self) -> HitQueue {
        self.hits
    }

    fn refresh_bottom(&mut self) {
        if self.hits.is_full() {
            if let Some(worst) = self.hits.peek_worst() {
                self.bottom_distance_sq = worst.distance_sq;
                self.bottom_doc = worst.doc;
            }
        }
    }
}

impl PointVisitor for NearestVisitor<'_> {
    fn visit(&mut self, doc: u32, packed: &[u8]) {
        if let Some(live) = self.cur_live_docs {
            if !live.contains(doc) {
                return;
            }
        }

        let mut distance_sq = 0.0f64;
        let mut offset = 0;
        for &value in self.origin {
            let diff = decode_dimension(packed, offset) as f64 - value as f64;
            distance_sq += diff * diff;
            // Strict '>' so an exact tie survives to the doc-id tie-break.
            if distance_sq > self.bottom_distance_sq {
                return;
            }
            offset += BYTES_PER_DIM;
        }

        let full_doc = self.cur_doc_base + doc;

        if self.hits.is_full()
            && distance_sq == self.bottom_distance_sq
            && full_doc > self.bottom_doc
        {
            // Ties at the radius keep the smaller doc id, which is the one
            // already in the queue.
            return;
        }

        self.hits.offer(full_doc, distance_sq);
        self.refresh_bottom();
    }

    fn compare(&mut self, min_packed: &[u8], max_packed: &[u8]) -> CellRelation {
        if self.hits.is_full()
            && point_to_rectangle_distance_sq(min_packed, max_packed, self.origin)
                > self.bottom_distance_sq
        {
            return CellRelation::OutsideQuery;
        }
        CellRelation::CrossesQuery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::pack_point;

    #[test]
    fn collects_and_tracks_bottom() {
        let origin = [0.0f32, 0.0];
        let mut v = NearestVisitor::new(2, &origin);
        assert_eq!(v.bottom_distance_sq(), f64::INFINITY);

        v.visit(0, &pack_point(&[3.0, 4.0]));
        assert_eq!(v.bottom_distance_sq(), f64::INFINITY, "not full yet");

        v.visit(1, &pack_point(&[1.0, 0.0]));
        assert_eq!(v.bottom_distance_sq(), 25.0, "full: radius = worst hit");

        v.visit(2, &pack_point(&[0.0, 2.0]));
        assert_eq!(v.bottom_distance_sq(), 4.0);

        let docs: Vec<u32> = v.into_hits().drain_ascending().iter().map(|h| h.doc).collect();
        assert_eq!(docs, vec![1, 2]);
    }

    #[test]
    fn skips_deleted_docs() {
        let origin = [0.0f32];
        let mut live = RoaringBitmap::new();
        live.insert(1);
        let mut v = NearestVisitor::new(1, &origin);
        v.enter_segment(0, Some(&live));

        v.visit(0, &pack_point(&[0.0])); // deleted, would otherwise win
        v.visit(1, &pack_point(&[5.0]));

        let hits = v.into_hits().drain_ascending();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc, 1);
    }

    #[test]
    fn applies_doc_base_to_collected_hits() {
        let origin = [0.0f32];
        let mut v = NearestVisitor::new(1, &origin);
        v.enter_segment(100, None);
        v.visit(7, &pack_point(&[2.0]));
        assert_eq!(v.into_hits().drain_ascending()[0].doc, 107);
    }

    #[test]
    fn equidistant_point_with_larger_doc_is_dropped() {
        let origin = [0.0f32];
        let mut v = NearestVisitor::new(1, &origin);
        v.visit(5, &pack_point(&[3.0]));
        v.visit(9, &pack_point(&[-3.0])); // same distance, larger doc
        v.visit(2, &pack_point(&[3.0])); // same distance, smaller doc
        let hits = v.into_hits().drain_ascending();
        assert_eq!(hits[0].doc, 2);
    }

    #[test]
    fn compare_prunes_only_when_full() {
        let origin = [0.0f32];
        let far_min = pack_point(&[100.0]);
        let far_max = pack_point(&[200.0]);

        let mut v = NearestVisitor::new(1, &origin);
        assert_eq!(
            v.compare(&far_min, &far_max),
            CellRelation::CrossesQuery,
            "nothing collected yet, every cell crosses"
        );

        v.visit(0, &pack_point(&[1.0]));
        assert_eq!(v.compare(&far_min, &far_max), CellRelation::OutsideQuery);

        // A box at exactly the radius still crosses (strict '>').
        let at_min = pack_point(&[1.0]);
        let at_max = pack_point(&[1.0]);
        assert_eq!(v.compare(&at_min, &at_max), CellRelation::CrossesQuery);
    }
}
