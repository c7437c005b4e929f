//! The traversal engine: an iterative descent/backtrack walk of one
//! curve group's quantized index, one ray lane at a time.
//!
//! Traversal is a state machine with three states. **Descend** walks
//! toward a leaf, slab-testing the current node's children: with one
//! hit it keeps descending, with two it defers the farther child on
//! the stack, with three or four it pushes them all and sorts the
//! fresh entries so the nearest pops first. **Pop** backtracks to the
//! next deferred subtree, discarding entries whose recorded entry
//! distance now lies beyond the ray's (possibly shrunken) `t_far` --
//! that rejection is what lets a close hit found late prune whole
//! subtrees pushed early. **Leaf** runs the fiber intersector over a
//! leaf run, with a mailbox suppressing re-tests of ids already seen
//! during this traversal.
//!
//! A traversal is a pure synchronous function of (ray, group): all
//! mutable state (stack, mailbox, stats) is private to one call, so
//! concurrent traversals over the same immutable group need no
//! coordination. Packets are just ordered batches of independent
//! lanes; the driver loops over the active-lane bits and each lane's
//! result is identical to tracing that lane alone.

// hair
use crate::accelerators::hbvh::{CurveGroup, DequantGrid, HairBvh, LeafEntry, NodeRef, QuadNode};
use crate::core::common::Float;
use crate::core::geometry::{Frame, Point3f, Ray, RayPacket, Vector3f};
use crate::shapes::fiber::intersect_segment;

/// Stack capacity; sized for the maximum depth the index builder
/// guarantees. Overflow is a precondition violation and panics on the
/// out-of-range index before anything is corrupted.
pub const TRAVERSAL_STACK_SIZE: usize = 64;

/// Slot count of the direct-mapped mailbox.
pub const MAILBOX_SIZE: usize = 32;

/// A deferred subtree and the ray distance at which its box was
/// entered when it was pushed.
#[derive(Debug, Default, Copy, Clone)]
pub struct StackEntry {
    pub node: NodeRef,
    pub dist: Float,
}

/// Direct-mapped cache of the most recently tested segment ids,
/// private to one traversal. A collision merely evicts, so the worst
/// case is a redundant re-test of a segment listed under several
/// overlapping leaves -- never a missed test of a new id.
#[derive(Debug, Copy, Clone)]
pub struct Mailbox {
    slots: [u32; MAILBOX_SIZE],
    enabled: bool,
}

impl Default for Mailbox {
    fn default() -> Mailbox {
        Mailbox::new()
    }
}

impl Mailbox {
    pub fn new() -> Mailbox {
        Mailbox {
            // initialized to an id no store hands out
            slots: [std::u32::MAX; MAILBOX_SIZE],
            enabled: true,
        }
    }
    /// A mailbox that reports every id as unseen. Test counts go up,
    /// results never change.
    pub fn disabled() -> Mailbox {
        Mailbox {
            slots: [std::u32::MAX; MAILBOX_SIZE],
            enabled: false,
        }
    }
    /// True when `id` already went through the intersector during
    /// this traversal; otherwise notes it and returns false.
    pub fn already_tested(&mut self, id: u32) -> bool {
        if !self.enabled {
            return false;
        }
        let slot: usize = id as usize % MAILBOX_SIZE;
        if self.slots[slot] == id {
            return true;
        }
        self.slots[slot] = id;
        false
    }
}

/// Counters accumulated across one or more traversals.
#[derive(Debug, Default, Clone)]
pub struct TraversalStats {
    pub group_traversals: usize,
    pub nodes_visited: usize,
    pub curve_tests: usize,
    pub mailbox_skips: usize,
}

#[derive(Debug, Copy, Clone)]
enum State {
    Descend(NodeRef),
    Pop,
    Leaf(usize),
}

fn target_state(node: NodeRef) -> State {
    if node.is_leaf() {
        State::Leaf(node.leaf_offset())
    } else {
        State::Descend(node)
    }
}

// reciprocal that turns a zero direction component into a huge finite
// value instead of letting 0 * inf produce NaNs in the slab test
fn rcp_safe(v: Float) -> Float {
    if v.abs() < 1e-18 as Float {
        1.0 as Float / (1e-18 as Float).copysign(v)
    } else {
        1.0 as Float / v
    }
}

// order the `n` freshly pushed entries so the nearest sits on top of
// the stack
fn sort_top(stack: &mut [StackEntry; TRAVERSAL_STACK_SIZE], stack_ptr: usize, n: usize) {
    let lo: usize = stack_ptr - n;
    for i in (lo + 1)..stack_ptr {
        let mut j: usize = i;
        while j > lo && stack[j].dist > stack[j - 1].dist {
            stack.swap(j, j - 1);
            j -= 1_usize;
        }
    }
}

/// Trace one ray through one curve group, updating the ray's best-hit
/// fields in place. Returns true if any fiber of the group was hit.
pub fn intersect_ray(group: &CurveGroup, ray: &mut Ray) -> bool {
    let mut mailbox: Mailbox = Mailbox::new();
    let mut stats: TraversalStats = TraversalStats::default();
    intersect_ray_with(group, ray, &mut mailbox, &mut stats)
}

/// Trace one ray with caller-provided mailbox and statistics. The
/// mailbox must be fresh (or disabled) for each traversal.
pub fn intersect_ray_with(
    group: &CurveGroup,
    ray: &mut Ray,
    mailbox: &mut Mailbox,
    stats: &mut TraversalStats,
) -> bool {
    if group.nodes.is_empty() {
        return false;
    }
    stats.group_traversals += 1_usize;
    let rdir: Vector3f = Vector3f {
        x: rcp_safe(ray.d.x),
        y: rcp_safe(ray.d.y),
        z: rcp_safe(ray.d.z),
    };
    let org_rdir: Vector3f = Vector3f {
        x: ray.o.x * rdir.x,
        y: ray.o.y * rdir.y,
        z: ray.o.z * rdir.z,
    };
    let frame: Frame = Frame::from_z(&ray.d);
    let org: Point3f = ray.o;
    let grid: DequantGrid = group.dequant_grid();
    let mut stack: [StackEntry; TRAVERSAL_STACK_SIZE] =
        [StackEntry::default(); TRAVERSAL_STACK_SIZE];
    let mut stack_ptr: usize = 0_usize;
    let mut hit: bool = false;
    let mut state: State = State::Descend(NodeRef::root());
    loop {
        match state {
            State::Pop => {
                if stack_ptr == 0_usize {
                    break;
                }
                stack_ptr -= 1_usize;
                let entry: StackEntry = stack[stack_ptr];
                // the interval may have shrunk since this subtree was
                // deferred; skip it if its entry distance is now out
                if entry.dist > ray.t_far {
                    continue;
                }
                state = target_state(entry.node);
            }
            State::Descend(node_ref) => {
                let node: &QuadNode = &group.nodes[node_ref.node_index()];
                stats.nodes_visited += 1_usize;
                let (mut mask, dist) =
                    node.intersect_children(&grid, &rdir, &org_rdir, ray.t_near, ray.t_far);
                if mask == 0_u8 {
                    state = State::Pop;
                    continue;
                }
                let r0: usize = mask.trailing_zeros() as usize;
                mask &= mask - 1;
                if mask == 0_u8 {
                    // single hit: no push, descend straight into it
                    state = target_state(node.child[r0]);
                    continue;
                }
                let c0: NodeRef = node.child[r0];
                let d0: Float = dist[r0];
                let r1: usize = mask.trailing_zeros() as usize;
                mask &= mask - 1;
                let c1: NodeRef = node.child[r1];
                let d1: Float = dist[r1];
                if mask == 0_u8 {
                    // two hits: defer the farther, descend the nearer
                    if d0 < d1 {
                        stack[stack_ptr] = StackEntry { node: c1, dist: d1 };
                        stack_ptr += 1_usize;
                        state = target_state(c0);
                    } else {
                        stack[stack_ptr] = StackEntry { node: c0, dist: d0 };
                        stack_ptr += 1_usize;
                        state = target_state(c1);
                    }
                    continue;
                }
                // three or four hits: push everything, sort the fresh
                // entries by distance, continue with the nearest
                stack[stack_ptr] = StackEntry { node: c0, dist: d0 };
                stack_ptr += 1_usize;
                stack[stack_ptr] = StackEntry { node: c1, dist: d1 };
                stack_ptr += 1_usize;
                let r2: usize = mask.trailing_zeros() as usize;
                mask &= mask - 1;
                stack[stack_ptr] = StackEntry {
                    node: node.child[r2],
                    dist: dist[r2],
                };
                stack_ptr += 1_usize;
                if mask == 0_u8 {
                    sort_top(&mut stack, stack_ptr, 3);
                } else {
                    let r3: usize = mask.trailing_zeros() as usize;
                    stack[stack_ptr] = StackEntry {
                        node: node.child[r3],
                        dist: dist[r3],
                    };
                    stack_ptr += 1_usize;
                    sort_top(&mut stack, stack_ptr, 4);
                }
                stack_ptr -= 1_usize;
                state = target_state(stack[stack_ptr].node);
            }
            State::Leaf(offset) => {
                let mut cur: usize = offset;
                loop {
                    let entry: LeafEntry = group.leaves[cur];
                    if mailbox.already_tested(entry.id) {
                        stats.mailbox_skips += 1_usize;
                    } else {
                        stats.curve_tests += 1_usize;
                        let seg = group.store.get(entry.id);
                        if intersect_segment(&frame, &org, seg, ray) {
                            hit = true;
                            ray.prim_id = Some(entry.id);
                            // rotate the ray-space tangent back out
                            ray.ng = frame.to_world(&ray.ng);
                        }
                    }
                    if entry.end_of_run {
                        break;
                    }
                    cur += 1_usize;
                }
                state = State::Pop;
            }
        }
    }
    hit
}

/// Intersect entry point: update in place the best-hit fields of
/// every active lane of `packet` that intersects any curve of group
/// `item`. Lanes outside `valid` (or inactive in the packet) are not
/// touched; per-lane results are identical to tracing that lane by
/// itself.
pub fn intersect_group(valid: u8, bvh: &HairBvh, packet: &mut RayPacket, item: usize) {
    let group: &CurveGroup = &bvh.groups[item];
    let mut bits: u8 = valid & packet.active;
    while bits != 0_u8 {
        let lane: usize = bits.trailing_zeros() as usize;
        bits &= bits - 1;
        intersect_ray(group, &mut packet.rays[lane]);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::geometry::{all_lanes, Point3f, RayPacket, RAY_PACKET_SIZE};
    use crate::core::rng::Rng;
    use crate::shapes::fiber::{CurveSegment, CurveStore};
    use std::sync::Arc;

    // straight fiber along x at height y, depth z
    fn fiber_at(y: Float, z: Float, radius: Float) -> CurveSegment {
        CurveSegment::new(
            &[
                Point3f { x: 0.0, y, z },
                Point3f {
                    x: 1.0 / 3.0,
                    y,
                    z,
                },
                Point3f {
                    x: 2.0 / 3.0,
                    y,
                    z,
                },
                Point3f { x: 1.0, y, z },
            ],
            &[radius, radius, radius, radius],
        )
    }

    fn single_fiber_group() -> CurveGroup {
        let store: Arc<CurveStore> = Arc::new(CurveStore::new(vec![fiber_at(0.0, 0.0, 0.1)]));
        CurveGroup::pack_flat(store, &[0])
    }

    #[test]
    fn straight_fiber_hit_through_the_index() {
        let group: CurveGroup = single_fiber_group();
        let mut ray: Ray = Ray::new(
            Point3f {
                x: 0.5,
                y: -5.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        );
        assert!(intersect_ray(&group, &mut ray));
        assert!((ray.t_far - 4.9).abs() < 1e-4, "t_far = {}", ray.t_far);
        assert_eq!(ray.prim_id, Some(0_u32));
        assert!(ray.ng.length() > 0.0);
    }

    #[test]
    fn offset_beyond_radius_misses_through_the_index() {
        let group: CurveGroup = single_fiber_group();
        let mut ray: Ray = Ray::new(
            Point3f {
                x: 0.5,
                y: -5.0,
                z: 0.2,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        );
        assert!(!intersect_ray(&group, &mut ray));
        assert_eq!(ray.t_far, std::f32::INFINITY);
        assert_eq!(ray.prim_id, None);
    }

    // a small field of parallel fibers at varying depth
    fn field_group() -> CurveGroup {
        let mut segments: Vec<CurveSegment> = Vec::new();
        for i in 0..12 {
            let y: Float = (i % 4) as Float * 0.25;
            let z: Float = (i / 4) as Float * 0.5;
            segments.push(fiber_at(y, z, 0.05));
        }
        let ids: Vec<u32> = (0..12).collect();
        CurveGroup::pack_flat(Arc::new(CurveStore::new(segments)), &ids)
    }

    fn random_ray(rng: &mut Rng) -> Ray {
        let d: Vector3f = Vector3f {
            x: rng.uniform_float_in(-1.0, 1.0),
            y: rng.uniform_float_in(-1.0, 1.0),
            z: rng.uniform_float_in(-1.0, 1.0),
        };
        let d: Vector3f = if d.length_squared() < 1e-6 {
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            }
        } else {
            d.normalize()
        };
        Ray::new(
            Point3f {
                x: rng.uniform_float_in(-1.0, 2.0),
                y: rng.uniform_float_in(-3.0, 3.0),
                z: rng.uniform_float_in(-3.0, 3.0),
            },
            d,
        )
    }

    fn rays_equal(a: &Ray, b: &Ray) -> bool {
        a.t_far == b.t_far && a.prim_id == b.prim_id && a.ng == b.ng
    }

    #[test]
    fn t_far_shrinks_monotonically_and_deterministically() {
        let group: CurveGroup = field_group();
        let mut rng: Rng = Rng::new();
        rng.set_sequence(11_u64);
        for _ in 0..256 {
            let ray0: Ray = random_ray(&mut rng);
            let mut ray1: Ray = ray0;
            let mut ray2: Ray = ray0;
            intersect_ray(&group, &mut ray1);
            assert!(ray1.t_far <= ray0.t_far);
            intersect_ray(&group, &mut ray2);
            assert!(rays_equal(&ray1, &ray2), "traversal not deterministic");
        }
    }

    #[test]
    fn packet_matches_scalar_for_any_lane_order() {
        let group: CurveGroup = field_group();
        let bvh: HairBvh = HairBvh::new(vec![group]);
        let mut rng: Rng = Rng::new();
        rng.set_sequence(23_u64);
        let mut rays: [Ray; RAY_PACKET_SIZE] = [Ray::default(); RAY_PACKET_SIZE];
        for lane in 0..RAY_PACKET_SIZE {
            rays[lane] = random_ray(&mut rng);
        }
        // scalar reference, one lane at a time
        let mut scalar: [Ray; RAY_PACKET_SIZE] = rays;
        for lane in 0..RAY_PACKET_SIZE {
            intersect_ray(&bvh.groups[0], &mut scalar[lane]);
        }
        // whole packet at once
        let mut packet: RayPacket = RayPacket::new(rays);
        intersect_group(all_lanes(), &bvh, &mut packet, 0);
        for lane in 0..RAY_PACKET_SIZE {
            assert!(
                rays_equal(&scalar[lane], &packet.rays[lane]),
                "lane {} differs from scalar trace",
                lane
            );
        }
        // reversed lane order
        let mut reversed: [Ray; RAY_PACKET_SIZE] = [Ray::default(); RAY_PACKET_SIZE];
        for lane in 0..RAY_PACKET_SIZE {
            reversed[lane] = rays[RAY_PACKET_SIZE - 1 - lane];
        }
        let mut packet_rev: RayPacket = RayPacket::new(reversed);
        intersect_group(all_lanes(), &bvh, &mut packet_rev, 0);
        for lane in 0..RAY_PACKET_SIZE {
            assert!(
                rays_equal(
                    &scalar[lane],
                    &packet_rev.rays[RAY_PACKET_SIZE - 1 - lane]
                ),
                "lane order changed a per-lane result"
            );
        }
    }

    #[test]
    fn inactive_lanes_stay_untouched() {
        let group: CurveGroup = single_fiber_group();
        let bvh: HairBvh = HairBvh::new(vec![group]);
        let hit_ray: Ray = Ray::new(
            Point3f {
                x: 0.5,
                y: -5.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        );
        let mut packet: RayPacket = RayPacket::new([hit_ray; RAY_PACKET_SIZE]);
        // only even lanes participate
        intersect_group(0b0101_0101, &bvh, &mut packet, 0);
        for lane in 0..RAY_PACKET_SIZE {
            if lane % 2 == 0 {
                assert_eq!(packet.rays[lane].prim_id, Some(0_u32));
            } else {
                assert_eq!(packet.rays[lane].prim_id, None);
                assert_eq!(packet.rays[lane].t_far, std::f32::INFINITY);
            }
        }
    }

    // group whose root lists the same segment id under two
    // overlapping leaf runs
    fn duplicated_leaf_group() -> CurveGroup {
        let mut segments: Vec<CurveSegment> = Vec::new();
        for _ in 0..8 {
            segments.push(fiber_at(0.0, 0.0, 0.1));
        }
        let store: Arc<CurveStore> = Arc::new(CurveStore::new(segments));
        let bounds = store.get(7).world_bound();
        let mut node: QuadNode = QuadNode::empty();
        let mut leaves: Vec<LeafEntry> = Vec::new();
        for run in 0..2 {
            let offset: usize = leaves.len();
            leaves.push(LeafEntry {
                id: 7_u32,
                end_of_run: true,
            });
            node.set_child(run, &bounds, &bounds, NodeRef::leaf(offset));
        }
        CurveGroup {
            bounds,
            nodes: vec![node],
            leaves,
            store,
        }
    }

    #[test]
    fn mailbox_suppresses_duplicate_tests_without_changing_hits() {
        let group: CurveGroup = duplicated_leaf_group();
        let probe: Ray = Ray::new(
            Point3f {
                x: 0.5,
                y: -5.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        );
        let mut with_mb: Ray = probe;
        let mut mailbox: Mailbox = Mailbox::new();
        let mut stats_mb: TraversalStats = TraversalStats::default();
        intersect_ray_with(&group, &mut with_mb, &mut mailbox, &mut stats_mb);
        assert_eq!(stats_mb.curve_tests, 1_usize, "id 7 tested more than once");
        assert_eq!(stats_mb.mailbox_skips, 1_usize);

        let mut without_mb: Ray = probe;
        let mut disabled: Mailbox = Mailbox::disabled();
        let mut stats_off: TraversalStats = TraversalStats::default();
        intersect_ray_with(&group, &mut without_mb, &mut disabled, &mut stats_off);
        assert_eq!(stats_off.curve_tests, 2_usize);

        assert!(rays_equal(&with_mb, &without_mb));
        assert_eq!(with_mb.prim_id, Some(7_u32));
    }

    #[test]
    fn mailbox_transparency_on_random_rays() {
        let group: CurveGroup = field_group();
        let mut rng: Rng = Rng::new();
        rng.set_sequence(31_u64);
        for _ in 0..128 {
            let probe: Ray = random_ray(&mut rng);
            let mut a: Ray = probe;
            let mut b: Ray = probe;
            let mut mailbox: Mailbox = Mailbox::new();
            let mut disabled: Mailbox = Mailbox::disabled();
            let mut stats_a: TraversalStats = TraversalStats::default();
            let mut stats_b: TraversalStats = TraversalStats::default();
            intersect_ray_with(&group, &mut a, &mut mailbox, &mut stats_a);
            intersect_ray_with(&group, &mut b, &mut disabled, &mut stats_b);
            assert!(rays_equal(&a, &b), "mailbox changed a hit record");
            assert!(stats_a.curve_tests <= stats_b.curve_tests);
        }
    }

    // two-level tree: the root defers to four interior children, each
    // holding one leaf run; exercises the push/sort/pop ordering and
    // the interior child encoding
    fn two_level_group() -> CurveGroup {
        let mut segments: Vec<CurveSegment> = Vec::new();
        for i in 0..4 {
            segments.push(fiber_at(0.0, i as Float + 1.0, 0.1));
        }
        let store: Arc<CurveStore> = Arc::new(CurveStore::new(segments));
        let mut bounds = crate::core::geometry::Bounds3f::default();
        for i in 0..4 {
            bounds =
                crate::core::geometry::bnd3_union_bnd3f(&bounds, &store.get(i).world_bound());
        }
        let mut leaves: Vec<LeafEntry> = Vec::new();
        let mut inner: Vec<QuadNode> = Vec::new();
        let mut root: QuadNode = QuadNode::empty();
        for i in 0..4_usize {
            let seg_bounds = store.get(i as u32).world_bound();
            let mut child: QuadNode = QuadNode::empty();
            child.set_child(0, &seg_bounds, &bounds, NodeRef::leaf(leaves.len()));
            leaves.push(LeafEntry {
                id: i as u32,
                end_of_run: true,
            });
            inner.push(child);
            root.set_child(i, &seg_bounds, &bounds, NodeRef::interior(i + 1));
        }
        let mut nodes: Vec<QuadNode> = vec![root];
        nodes.extend(inner);
        CurveGroup {
            bounds,
            nodes,
            leaves,
            store,
        }
    }

    #[test]
    fn four_way_descent_returns_the_nearest_fiber() {
        let group: CurveGroup = two_level_group();
        // all four fibers line up along +y; the nearest one must win
        let mut ray: Ray = Ray::new(
            Point3f {
                x: 0.5,
                y: -2.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        );
        let mut mailbox: Mailbox = Mailbox::new();
        let mut stats: TraversalStats = TraversalStats::default();
        assert!(intersect_ray_with(&group, &mut ray, &mut mailbox, &mut stats));
        assert_eq!(ray.prim_id, Some(0_u32));
        // fiber 0 sits at y = 1, so the surface is 2.9 away
        assert!((ray.t_far - 2.9).abs() < 1e-4, "t_far = {}", ray.t_far);
        // the near-first pop order plus the shrunken interval lets the
        // traversal drop the three farther subtrees without testing
        // their fibers
        assert_eq!(stats.curve_tests, 1_usize, "stats = {:?}", stats);
    }

    #[test]
    fn invalid_slots_are_never_entered() {
        // an empty slot whose child reference points far out of range
        // must be skipped purely on the quantized x test
        let store: Arc<CurveStore> =
            Arc::new(CurveStore::new(vec![fiber_at(0.0, 0.0, 0.1)]));
        let bounds = store.get(0).world_bound();
        let mut node: QuadNode = QuadNode::empty();
        node.set_child(0, &bounds, &bounds, NodeRef::leaf(0));
        node.child[3] = NodeRef::leaf(9999);
        let group: CurveGroup = CurveGroup {
            bounds,
            nodes: vec![node],
            leaves: vec![LeafEntry {
                id: 0_u32,
                end_of_run: true,
            }],
            store,
        };
        let mut ray: Ray = Ray::new(
            Point3f {
                x: 0.5,
                y: -5.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        );
        assert!(intersect_ray(&group, &mut ray));
        assert_eq!(ray.prim_id, Some(0_u32));
    }

    #[test]
    fn t_near_clips_the_front_of_the_interval() {
        let group: CurveGroup = single_fiber_group();
        let mut ray: Ray = Ray::new(
            Point3f {
                x: 0.5,
                y: -5.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        );
        // the fiber's whole slab lies before t_near
        ray.t_near = 6.0;
        assert!(!intersect_ray(&group, &mut ray));
        assert_eq!(ray.prim_id, None);
    }

    #[test]
    fn sort_top_orders_nearest_on_top() {
        let mut stack: [StackEntry; TRAVERSAL_STACK_SIZE] =
            [StackEntry::default(); TRAVERSAL_STACK_SIZE];
        let dists: [Float; 4] = [3.0, 1.0, 4.0, 2.0];
        for (i, d) in dists.iter().enumerate() {
            stack[i] = StackEntry {
                node: NodeRef::leaf(i),
                dist: *d,
            };
        }
        sort_top(&mut stack, 4, 4);
        assert_eq!(stack[3].dist, 1.0);
        assert!(stack[0].dist >= stack[1].dist);
        assert!(stack[1].dist >= stack[2].dist);
        assert!(stack[2].dist >= stack[3].dist);
    }

    #[test]
    fn mailbox_collision_evicts_but_never_suppresses_a_new_id() {
        let mut mailbox: Mailbox = Mailbox::new();
        assert!(!mailbox.already_tested(1_u32));
        assert!(mailbox.already_tested(1_u32));
        // id 33 maps to the same slot as id 1
        assert!(!mailbox.already_tested(33_u32));
        // the collision evicted id 1; worst case is a redundant re-test
        assert!(!mailbox.already_tested(1_u32));
    }
}
