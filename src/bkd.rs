//! In-memory block k-d tree.
//!
//! Bulk-loaded spatial index over multi-dimensional float points: interior
//! nodes split the point set at the median of the dimension with the widest
//! spread, leaves hold small blocks of packed points. Points are stored in
//! the sortable packed encoding so bounds and splits compare raw bytes.
//!
//! The tree exists to be traversed through [`BkdCursor`], the crate's
//! reference [`PointCursor`] implementation. Construction is add-then-build;
//! there is no incremental insert.

use smallvec::SmallVec;

use crate::cursor::{CellRelation, PointCursor, PointVisitor};
use crate::encoding::{pack_point, BYTES_PER_DIM};
use crate::error::{Result, SearchError};

/// Packed bounding-box corner; inline up to 8 dimensions.
type PackedCorner = SmallVec<[u8; 32]>;

/// Block k-d tree parameters.
#[derive(Clone, Debug)]
pub struct BkdTreeParams {
    /// Maximum number of points per leaf block.
    pub max_points_per_leaf: usize,
}

impl Default for BkdTreeParams {
    fn default() -> Self {
        Self {
            max_points_per_leaf: 512,
        }
    }
}

#[derive(Debug)]
enum NodeKind {
    Inner { left: usize, right: usize },
    /// Range into the tree's leaf-ordered point storage.
    Leaf { start: usize, end: usize },
}

#[derive(Debug)]
struct BkdNode {
    min_packed: PackedCorner,
    max_packed: PackedCorner,
    parent: Option<usize>,
    kind: NodeKind,
}

/// Bulk-loaded block k-d tree over packed float points.
pub struct BkdTree {
    num_dims: usize,
    bytes_per_point: usize,
    params: BkdTreeParams,
    /// (doc, packed point) pairs staged by `add`, drained by `build`.
    pending: Vec<(u32, Vec<u8>)>,
    /// Leaf-ordered storage after `build`.
    docs: Vec<u32>,
    packed: Vec<u8>,
    nodes: Vec<BkdNode>,
    root: Option<usize>,
    built: bool,
}

impl BkdTree {
    /// Create an empty tree for `num_dims`-dimensional points.
    pub fn new(num_dims: usize, params: BkdTreeParams) -> Result<Self> {
        if num_dims == 0 {
            return Err(SearchError::InvalidParameter(
                "num_dims must be greater than 0".to_string(),
            ));
        }
        if params.max_points_per_leaf == 0 {
            return Err(SearchError::InvalidParameter(
                "max_points_per_leaf must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            num_dims,
            bytes_per_point: num_dims * BYTES_PER_DIM,
            params,
            pending: Vec::new(),
            docs: Vec::new(),
            packed: Vec::new(),
            nodes: Vec::new(),
            root: None,
            built: false,
        })
    }

    /// Stage a point for the next `build`.
    pub fn add(&mut self, doc: u32, values: &[f32]) -> Result<()> {
        if self.built {
            return Err(SearchError::InvalidParameter(
                "cannot add points after build".to_string(),
            ));
        }
        if values.len() != self.num_dims {
            return Err(SearchError::DimensionMismatch {
                origin_dims: values.len(),
                segment_dims: self.num_dims,
            });
        }
        if let Some(d) = values.iter().position(|v| v.is_nan()) {
            return Err(SearchError::InvalidParameter(format!(
                "point value is NaN at dimension {d}"
            )));
        }
        self.pending.push((doc, pack_point(values)));
        Ok(())
    }

    /// Build the tree from the staged points.
    pub fn build(&mut self) -> Result<()> {
        if self.built {
            return Ok(());
        }
        if self.pending.is_empty() {
            return Err(SearchError::EmptyIndex);
        }

        let entries = std::mem::take(&mut self.pending);
        let mut order: Vec<usize> = (0..entries.len()).collect();

        self.docs = Vec::with_capacity(entries.len());
        self.packed = Vec::with_capacity(entries.len() * self.bytes_per_point);

        let root = self.build_subtree(&entries, &mut order);
        self.nodes[root].parent = None;
        self.root = Some(root);
        self.built = true;
        Ok(())
    }

    /// Recursively build the subtree over `order`, returning its node index.
    /// Children are created before their parent; parent links are patched as
    /// each inner node is pushed.
    fn build_subtree(&mut self, entries: &[(u32, Vec<u8>)], order: &mut [usize]) -> usize {
        let (min_packed, max_packed) = self.compute_bounds(entries, order);

        if order.len() <= self.params.max_points_per_leaf {
            let start = self.docs.len();
            for &i in order.iter() {
                self.docs.push(entries[i].0);
                self.packed.extend_from_slice(&entries[i].1);
            }
            let end = self.docs.len();
            self.nodes.push(BkdNode {
                min_packed,
                max_packed,
                parent: None,
                kind: NodeKind::Leaf { start, end },
            });
            return self.nodes.len() - 1;
        }

        let split_dim = widest_dimension(&min_packed, &max_packed, self.num_dims);
        let offset = split_dim * BYTES_PER_DIM;
        order.sort_unstable_by(|&a, &b| {
            let pa = &entries[a].1[offset..offset + BYTES_PER_DIM];
            let pb = &entries[b].1[offset..offset + BYTES_PER_DIM];
            pa.cmp(pb).then_with(|| entries[a].0.cmp(&entries[b].0))
        });

        let mid = order.len() / 2;
        let (left_order, right_order) = order.split_at_mut(mid);
        let left = self.build_subtree(entries, left_order);
        let right = self.build_subtree(entries, right_order);

        self.nodes.push(BkdNode {
            min_packed,
            max_packed,
            parent: None,
            kind: NodeKind::Inner { left, right },
        });
        let idx = self.nodes.len() - 1;
        self.nodes[left].parent = Some(idx);
        self.nodes[right].parent = Some(idx);
        idx
    }

    /// Per-dimension byte-wise min/max over the entries in `order`.
    /// Byte comparison equals numeric comparison under the sortable encoding.
    fn compute_bounds(
        &self,
        entries: &[(u32, Vec<u8>)],
        order: &[usize],
    ) -> (PackedCorner, PackedCorner) {
        let mut min_packed = PackedCorner::from_slice(&entries[order[0]].1);
        let mut max_packed = min_packed.clone();
        for &i in &order[1..] {
            let point = &entries[i].1;
            for d in 0..self.num_dims {
                let o = d * BYTES_PER_DIM;
                let dim = &point[o..o + BYTES_PER_DIM];
                if dim < &min_packed[o..o + BYTES_PER_DIM] {
                    min_packed[o..o + BYTES_PER_DIM].copy_from_slice(dim);
                } else if dim > &max_packed[o..o + BYTES_PER_DIM] {
                    max_packed[o..o + BYTES_PER_DIM].copy_from_slice(dim);
                }
            }
        }
        (min_packed, max_packed)
    }

    /// Dimensions per point.
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Number of indexed points (0 before `build`).
    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    /// A cursor positioned at the root.
    pub fn cursor(&self) -> Result<BkdCursor<'_>> {
        match self.root {
            Some(node) => Ok(BkdCursor { tree: self, node }),
            None => Err(SearchError::NotBuilt),
        }
    }

    fn point(&self, i: usize) -> &[u8] {
        &self.packed[i * self.bytes_per_point..(i + 1) * self.bytes_per_point]
    }

    fn visit_subtree(&self, node: usize, visitor: &mut dyn PointVisitor) -> Result<()> {
        let n = &self.nodes[node];
        if visitor.compare(&n.min_packed, &n.max_packed) == CellRelation::OutsideQuery {
            return Ok(());
        }
        match n.kind {
            NodeKind::Leaf { start, end } => {
                if start == end {
                    return Err(SearchError::CorruptIndex(
                        "leaf block holds no points".to_string(),
                    ));
                }
                for i in start..end {
                    visitor.visit(self.docs[i], self.point(i));
                }
                Ok(())
            }
            NodeKind::Inner { left, right } => {
                self.visit_subtree(left, visitor)?;
                self.visit_subtree(right, visitor)
            }
        }
    }
}

/// The dimension with the widest packed range; ties go to the lowest.
fn widest_dimension(min_packed: &[u8], max_packed: &[u8], num_dims: usize) -> usize {
    use crate::encoding::decode_dimension;
    let mut best_dim = 0;
    let mut best_span = f64::NEG_INFINITY;
    for d in 0..num_dims {
        let o = d * BYTES_PER_DIM;
        let span =
            decode_dimension(max_packed, o) as f64 - decode_dimension(min_packed, o) as f64;
        if span > best_span {
            best_span = span;
            best_dim = d;
        }
    }
    best_dim
}

/// Cursor over a [`BkdTree`].
///
/// The position is a single arena index, so cloning is cheap and clones are
/// fully independent.
#[derive(Clone)]
pub struct BkdCursor<'t> {
    tree: &'t BkdTree,
    node: usize,
}

impl PointCursor for BkdCursor<'_> {
    fn min_packed(&self) -> &[u8] {
        &self.tree.nodes[self.node].min_packed
    }

    fn max_packed(&self) -> &[u8] {
        &self.tree.nodes[self.node].max_packed
    }

    fn move_to_child(&mut self) -> Result<bool> {
        match self.tree.nodes[self.node].kind {
            NodeKind::Inner { left, .. } => {
                self.node = left;
                Ok(true)
            }
            NodeKind::Leaf { .. } => Ok(false),
        }
    }

    fn move_to_sibling(&mut self) -> Result<bool> {
        let Some(parent) = self.tree.nodes[self.node].parent else {
            return Ok(false);
        };
        match self.tree.nodes[parent].kind {
            NodeKind::Inner { left, right } if left == self.node => {
                self.node = right;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn clone_cursor(&self) -> Result<Self> {
        Ok(self.clone())
    }

    fn visit_leaf_values(&mut self, visitor: &mut dyn PointVisitor) -> Result<()> {
        self.tree.visit_subtree(self.node, visitor)
    }
}
