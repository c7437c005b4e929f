//! Quantized four-wide bounding volume hierarchy over hair fibers.
//!
//! Each interior node holds up to four children. A child's box is
//! stored as six bytes, one per axis side, quantized against the
//! owning curve group's overall bounds: the reconstructed coordinate
//! is `group_lo + (byte / 255) * group_extent`. That trades box
//! tightness for nodes an eighth the size of a plain float layout.
//! Quantization always rounds outward, so a reconstructed box
//! contains the box it was built from.
//!
//! Child references distinguish interior nodes from leaf runs by
//! sign; leaf runs are flat spans of segment ids terminated by an
//! end-of-run flag. The index is built offline and is immutable while
//! rays traverse it; traversal never validates it.

// std
use std::sync::Arc;
// hair
use crate::core::common::{dequantize, quantize_hi, quantize_lo, Float};
use crate::core::geometry::{bnd3_union_bnd3f, Bounds3f, Point3f, Vector3f};
use crate::shapes::fiber::CurveStore;

/// Branching factor of the quantized nodes.
pub const QUAD_WIDTH: usize = 4;

/// Reference to a traversal target. Interior nodes are encoded as
/// negated node indices, leaf runs as non-negative offsets into the
/// group's leaf list. Node 0 is always the root and never appears as
/// a child reference, so the encoding is unambiguous.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct NodeRef {
    bits: i32,
}

impl NodeRef {
    pub fn root() -> NodeRef {
        NodeRef { bits: 0_i32 }
    }
    pub fn interior(index: usize) -> NodeRef {
        debug_assert!(index > 0_usize, "node 0 is the root, not a child");
        NodeRef {
            bits: -(index as i32),
        }
    }
    pub fn leaf(offset: usize) -> NodeRef {
        NodeRef {
            bits: offset as i32,
        }
    }
    pub fn is_leaf(&self) -> bool {
        self.bits >= 0_i32
    }
    pub fn node_index(&self) -> usize {
        (-self.bits) as usize
    }
    pub fn leaf_offset(&self) -> usize {
        self.bits as usize
    }
}

/// One entry of a leaf run: a segment id, plus the flag closing the
/// run on its last entry. The same id may appear under several
/// leaves whose boxes overlap.
#[derive(Debug, Default, Copy, Clone)]
pub struct LeafEntry {
    pub id: u32,
    pub end_of_run: bool,
}

/// Precomputed dequantization grid for one traversal: the group's
/// lower corner and the per-axis scale of one byte step.
#[derive(Debug, Default, Copy, Clone)]
pub struct DequantGrid {
    pub lo: Point3f,
    pub scale: Vector3f,
}

/// Interior node with up to four quantized child boxes.
#[derive(Debug, Copy, Clone)]
pub struct QuadNode {
    pub lo_x: [u8; QUAD_WIDTH],
    pub lo_y: [u8; QUAD_WIDTH],
    pub lo_z: [u8; QUAD_WIDTH],
    pub hi_x: [u8; QUAD_WIDTH],
    pub hi_y: [u8; QUAD_WIDTH],
    pub hi_z: [u8; QUAD_WIDTH],
    pub child: [NodeRef; QUAD_WIDTH],
}

impl QuadNode {
    /// A node with every child slot empty.
    pub fn empty() -> QuadNode {
        QuadNode {
            lo_x: [255_u8; QUAD_WIDTH],
            lo_y: [255_u8; QUAD_WIDTH],
            lo_z: [255_u8; QUAD_WIDTH],
            hi_x: [0_u8; QUAD_WIDTH],
            hi_y: [0_u8; QUAD_WIDTH],
            hi_z: [0_u8; QUAD_WIDTH],
            child: [NodeRef::default(); QUAD_WIDTH],
        }
    }
    /// Occupy slot `slot` with `child`, quantizing `bounds` against
    /// the group bounds. Rounds outward, so the slot's reconstructed
    /// box contains `bounds`.
    pub fn set_child(
        &mut self,
        slot: usize,
        bounds: &Bounds3f,
        group_bounds: &Bounds3f,
        child: NodeRef,
    ) {
        let extent: Vector3f = group_bounds.diagonal();
        let norm = |v: Float, lo: Float, e: Float| -> Float {
            if e > 0.0 as Float {
                (v - lo) / e
            } else {
                0.0 as Float
            }
        };
        self.lo_x[slot] = quantize_lo(norm(bounds.p_min.x, group_bounds.p_min.x, extent.x));
        self.lo_y[slot] = quantize_lo(norm(bounds.p_min.y, group_bounds.p_min.y, extent.y));
        self.lo_z[slot] = quantize_lo(norm(bounds.p_min.z, group_bounds.p_min.z, extent.z));
        self.hi_x[slot] = quantize_hi(norm(bounds.p_max.x, group_bounds.p_min.x, extent.x));
        self.hi_y[slot] = quantize_hi(norm(bounds.p_max.y, group_bounds.p_min.y, extent.y));
        self.hi_z[slot] = quantize_hi(norm(bounds.p_max.z, group_bounds.p_min.z, extent.z));
        self.child[slot] = child;
    }
    /// A slot is occupied iff its quantized x interval is non-empty.
    /// Only the x axis is checked when flagging empty slots; an
    /// inverted y or z interval does not invalidate a slot, it just
    /// behaves like the box with those sides swapped.
    pub fn slot_valid(&self, slot: usize) -> bool {
        self.lo_x[slot] <= self.hi_x[slot]
    }
    /// Reconstruct the world-space box of one child slot.
    pub fn child_bounds(&self, slot: usize, group_bounds: &Bounds3f) -> Bounds3f {
        let extent: Vector3f = group_bounds.diagonal();
        Bounds3f {
            p_min: Point3f {
                x: dequantize(self.lo_x[slot], group_bounds.p_min.x, extent.x),
                y: dequantize(self.lo_y[slot], group_bounds.p_min.y, extent.y),
                z: dequantize(self.lo_z[slot], group_bounds.p_min.z, extent.z),
            },
            p_max: Point3f {
                x: dequantize(self.hi_x[slot], group_bounds.p_min.x, extent.x),
                y: dequantize(self.hi_y[slot], group_bounds.p_min.y, extent.y),
                z: dequantize(self.hi_z[slot], group_bounds.p_min.z, extent.z),
            },
        }
    }
    /// Slab-test the four child slots against a ray's current valid
    /// interval. Returns a hit bitmask plus the per-slot entry
    /// distance used to order the traversal. Pure query; nothing is
    /// mutated.
    pub fn intersect_children(
        &self,
        grid: &DequantGrid,
        rdir: &Vector3f,
        org_rdir: &Vector3f,
        t_near: Float,
        t_far: Float,
    ) -> (u8, [Float; QUAD_WIDTH]) {
        let mut mask: u8 = 0_u8;
        let mut dist: [Float; QUAD_WIDTH] = [0.0 as Float; QUAD_WIDTH];
        for slot in 0..QUAD_WIDTH {
            if !self.slot_valid(slot) {
                continue;
            }
            let world_lo_x: Float = grid.lo.x + self.lo_x[slot] as Float * grid.scale.x;
            let world_lo_y: Float = grid.lo.y + self.lo_y[slot] as Float * grid.scale.y;
            let world_lo_z: Float = grid.lo.z + self.lo_z[slot] as Float * grid.scale.z;
            let world_hi_x: Float = grid.lo.x + self.hi_x[slot] as Float * grid.scale.x;
            let world_hi_y: Float = grid.lo.y + self.hi_y[slot] as Float * grid.scale.y;
            let world_hi_z: Float = grid.lo.z + self.hi_z[slot] as Float * grid.scale.z;
            let t_lo_x: Float = world_lo_x * rdir.x - org_rdir.x;
            let t_lo_y: Float = world_lo_y * rdir.y - org_rdir.y;
            let t_lo_z: Float = world_lo_z * rdir.z - org_rdir.z;
            let t_hi_x: Float = world_hi_x * rdir.x - org_rdir.x;
            let t_hi_y: Float = world_hi_y * rdir.y - org_rdir.y;
            let t_hi_z: Float = world_hi_z * rdir.z - org_rdir.z;
            let t0: Float = t_lo_x
                .min(t_hi_x)
                .max(t_lo_y.min(t_hi_y))
                .max(t_lo_z.min(t_hi_z))
                .max(t_near);
            let t1: Float = t_lo_x
                .max(t_hi_x)
                .min(t_lo_y.max(t_hi_y))
                .min(t_lo_z.max(t_hi_z))
                .min(t_far);
            if t0 <= t1 {
                mask |= 1_u8 << slot;
                dist[slot] = t0;
            }
        }
        (mask, dist)
    }
}

/// A group of fibers with its own quantized index: overall bounds,
/// the node array, the leaf run list, and the curve store the leaf
/// ids point into. All of it is read-only for the lifetime of a
/// render pass, so any number of traversals may run concurrently.
pub struct CurveGroup {
    pub bounds: Bounds3f,
    pub nodes: Vec<QuadNode>,
    pub leaves: Vec<LeafEntry>,
    pub store: Arc<CurveStore>,
}

impl CurveGroup {
    pub fn dequant_grid(&self) -> DequantGrid {
        DequantGrid {
            lo: self.bounds.p_min,
            scale: self.bounds.diagonal() * (1.0 as Float / 255.0 as Float),
        }
    }
    /// Pack segments into the simplest pre-built index: a single root
    /// whose (up to four) children are flat leaf runs. Hierarchical
    /// construction happens offline in the index builder; this
    /// packing covers the demo binary and the tests.
    pub fn pack_flat(store: Arc<CurveStore>, ids: &[u32]) -> CurveGroup {
        assert!(!ids.is_empty(), "cannot pack an empty curve group");
        let mut bounds: Bounds3f = Bounds3f::default();
        for id in ids.iter() {
            bounds = bnd3_union_bnd3f(&bounds, &store.get(*id).world_bound());
        }
        let n_runs: usize = QUAD_WIDTH.min(ids.len());
        let run_len: usize = (ids.len() + n_runs - 1) / n_runs;
        let mut node: QuadNode = QuadNode::empty();
        let mut leaves: Vec<LeafEntry> = Vec::with_capacity(ids.len());
        for (run, chunk) in ids.chunks(run_len).enumerate() {
            let offset: usize = leaves.len();
            let mut run_bounds: Bounds3f = Bounds3f::default();
            for (i, id) in chunk.iter().enumerate() {
                run_bounds = bnd3_union_bnd3f(&run_bounds, &store.get(*id).world_bound());
                leaves.push(LeafEntry {
                    id: *id,
                    end_of_run: i + 1 == chunk.len(),
                });
            }
            node.set_child(run, &run_bounds, &bounds, NodeRef::leaf(offset));
        }
        CurveGroup {
            bounds,
            nodes: vec![node],
            leaves,
            store,
        }
    }
}

/// Top-level collection of curve groups; the opaque handle handed to
/// the intersect entry point together with an item index.
pub struct HairBvh {
    pub groups: Vec<CurveGroup>,
}

impl HairBvh {
    pub fn new(groups: Vec<CurveGroup>) -> Self {
        HairBvh { groups }
    }
    pub fn world_bound(&self) -> Bounds3f {
        let mut bounds: Bounds3f = Bounds3f::default();
        for group in self.groups.iter() {
            bounds = bnd3_union_bnd3f(&bounds, &group.bounds);
        }
        bounds
    }
}
