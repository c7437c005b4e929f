//! Hair fibers as radius-varying cubic curve segments, and the
//! ray-space subdivision test deciding whether a ray passes within
//! the swept radius of one segment.
//!
//! The intersector never evaluates the cubic directly. It projects
//! the four control points into an orthonormal frame aligned with the
//! ray (the ray becomes the z axis), then repeatedly applies two-step
//! midpoint (corner-cutting) subdivision to the control polygon --
//! the same construction used to draw smooth curves by repeated chord
//! bisection. Before splitting, a whole sub-curve is rejected if its
//! control-point bound, expanded by the largest radius, misses the
//! ray axis or the valid depth interval. At the deepest level the
//! remaining chords are tested as 2D capsules in the cross-section
//! plane.
//!
//! Recursion is replaced by an explicit bounded stack, so one
//! intersection test allocates nothing and its stack use is fixed.

// hair
use crate::core::common::Float;
use crate::core::geometry::{
    bnd3_expand, bnd3_union_pnt3f, pnt4_max_pnt4, pnt4_min_pnt4, Bounds3f, Frame, Point3f, Point4f,
    Ray, Vector3f,
};

/// Default number of subdivision levels before the chord tests run.
pub const SUBDIV_DEPTH: i32 = 2;

/// Capacity of the explicit subdivision stack; one entry per deferred
/// far half, so anything beyond the maximum subdivision depth is
/// headroom.
pub const SEG_STACK_SIZE: usize = 20;

#[derive(Debug, Default, Copy, Clone)]
pub struct CurveVertex {
    pub p: Point3f,
    pub radius: Float,
}

/// One hair fiber segment: a cubic control polygon with a radius at
/// each control point.
#[derive(Debug, Default, Copy, Clone)]
pub struct CurveSegment {
    pub v: [CurveVertex; 4],
}

impl CurveSegment {
    pub fn new(p: &[Point3f; 4], radius: &[Float; 4]) -> Self {
        let mut v: [CurveVertex; 4] = [CurveVertex::default(); 4];
        for i in 0..4 {
            v[i] = CurveVertex {
                p: p[i],
                radius: radius[i],
            };
        }
        CurveSegment { v }
    }
    /// Conservative world bound: the control hull expanded by the
    /// largest control-point radius. Index packing builds child boxes
    /// from this, so quantized boxes cover the swept tube.
    pub fn world_bound(&self) -> Bounds3f {
        let mut b: Bounds3f = Bounds3f::default();
        let mut max_radius: Float = 0.0 as Float;
        for vertex in self.v.iter() {
            b = bnd3_union_pnt3f(&b, &vertex.p);
            max_radius = max_radius.max(vertex.radius);
        }
        bnd3_expand(&b, max_radius)
    }
}

/// Immutable table of curve segments. A segment id is its index into
/// the table; ids are stable and unique for the duration of a render.
#[derive(Debug, Default)]
pub struct CurveStore {
    pub segments: Vec<CurveSegment>,
}

impl CurveStore {
    pub fn new(segments: Vec<CurveSegment>) -> Self {
        CurveStore { segments }
    }
    pub fn get(&self, id: u32) -> &CurveSegment {
        &self.segments[id as usize]
    }
    pub fn len(&self) -> usize {
        self.segments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Project a segment's control points into a ray frame; the radius
/// rides along in the fourth lane.
pub fn project_segment(frame: &Frame, org: &Point3f, seg: &CurveSegment) -> [Point4f; 4] {
    let mut cp: [Point4f; 4] = [Point4f::default(); 4];
    for i in 0..4 {
        let local: Vector3f = frame.to_local(&(seg.v[i].p - *org));
        cp[i] = Point4f {
            x: local.x,
            y: local.y,
            z: local.z,
            w: seg.v[i].radius,
        };
    }
    cp
}

/// Conservative reject for a whole sub-curve: bound the four control
/// points, expand by the largest radius among them (the bound's
/// fourth lane), and test against the projected ray axis and the
/// ray's current valid depth interval. A `false` here guarantees the
/// sub-curve cannot produce a hit.
pub fn segment_test(v0: &Point4f, v1: &Point4f, v2: &Point4f, v3: &Point4f, ray: &Ray) -> bool {
    let min4: Point4f = pnt4_min_pnt4(&pnt4_min_pnt4(v0, v1), &pnt4_min_pnt4(v2, v3));
    let max4: Point4f = pnt4_max_pnt4(&pnt4_max_pnt4(v0, v1), &pnt4_max_pnt4(v2, v3));
    let max_r: Float = max4.w;
    if min4.x > max_r || max4.x < -max_r || min4.y > max_r || max4.y < -max_r {
        return false;
    }
    if min4.z - max_r > ray.t_far || max4.z + max_r < ray.t_near {
        return false;
    }
    true
}

/// Terminal capsule test for a single chord. The chord's endpoints
/// bound a 2D capsule in the cross-section plane; if the ray axis is
/// inside and the capsule's near depth beats the best depth found so
/// far, the hit is recorded: `t_far` shrinks and the unnormalized
/// chord tangent becomes the geometric-normal proxy (still in ray
/// space -- the caller rotates it back to world space).
pub fn final_line_test(a: &Point4f, b: &Point4f, ray: &mut Ray) -> bool {
    let min_p: Point4f = pnt4_min_pnt4(a, b);
    let max_p: Point4f = pnt4_max_pnt4(a, b);
    let max_r: Float = max_p.w;
    if min_p.x > max_r || max_p.x < -max_r || min_p.y > max_r || max_p.y < -max_r {
        return false;
    }
    // near surface of the capsule along the ray axis
    let z: Float = min_p.z - max_r;
    if z >= ray.t_far {
        return false;
    }
    ray.t_far = z;
    ray.ng = Vector3f {
        x: b.x - a.x,
        y: b.y - a.y,
        z: b.z - a.z,
    };
    true
}

// every chord gets a chance to shrink t_far, so no short-circuit
fn final_segment_test(
    v0: &Point4f,
    v1: &Point4f,
    v2: &Point4f,
    v3: &Point4f,
    ray: &mut Ray,
) -> bool {
    let h0: bool = final_line_test(v0, v1, ray);
    let h1: bool = final_line_test(v1, v2, ray);
    let h2: bool = final_line_test(v2, v3, ray);
    h0 | h1 | h2
}

#[derive(Debug, Default, Copy, Clone)]
struct SegStack {
    v0: Point4f,
    v1: Point4f,
    v2: Point4f,
    v3: Point4f,
    depth: i32,
}

/// Intersect one fiber segment at the default subdivision depth.
pub fn intersect_segment(frame: &Frame, org: &Point3f, seg: &CurveSegment, ray: &mut Ray) -> bool {
    intersect_segment_at_depth(frame, org, seg, SUBDIV_DEPTH, ray)
}

/// Intersect one fiber segment, refining the control polygon
/// `max_depth` times before the chord tests run. Returns true iff any
/// chord produced an accepted hit; the ray's best-hit fields are
/// updated as a side effect (`ng` is left in ray space).
pub fn intersect_segment_at_depth(
    frame: &Frame,
    org: &Point3f,
    seg: &CurveSegment,
    max_depth: i32,
    ray: &mut Ray,
) -> bool {
    assert!((max_depth as usize) < SEG_STACK_SIZE);
    let cp: [Point4f; 4] = project_segment(frame, org, seg);
    let mut v0: Point4f = cp[0];
    let mut v1: Point4f = cp[1];
    let mut v2: Point4f = cp[2];
    let mut v3: Point4f = cp[3];
    let mut depth: i32 = max_depth;
    let mut stack: [SegStack; SEG_STACK_SIZE] = [SegStack::default(); SEG_STACK_SIZE];
    let mut stack_ptr: usize = 0_usize;
    let half: Float = 0.5 as Float;
    let mut found_hit: bool = false;
    let mut have_current: bool = true;
    loop {
        if !have_current {
            if stack_ptr == 0_usize {
                break;
            }
            stack_ptr -= 1_usize;
            let top: SegStack = stack[stack_ptr];
            v0 = top.v0;
            v1 = top.v1;
            v2 = top.v2;
            v3 = top.v3;
            depth = top.depth;
        }
        have_current = false;
        if !segment_test(&v0, &v1, &v2, &v3, ray) {
            continue;
        }
        // two-step midpoint (corner-cutting) subdivision
        let v10: Point4f = (v0 + v1) * half;
        let v11: Point4f = (v1 + v2) * half;
        let v12: Point4f = (v2 + v3) * half;
        let v20: Point4f = (v10 + v11) * half;
        let v21: Point4f = (v11 + v12) * half;
        let v30: Point4f = (v20 + v21) * half;
        if depth == 0_i32 {
            found_hit |= final_segment_test(&v0, &v10, &v20, &v30, ray);
            found_hit |= final_segment_test(&v30, &v21, &v12, &v3, ray);
        } else {
            // defer the far half, keep refining the near half
            stack[stack_ptr] = SegStack {
                v0: v3,
                v1: v12,
                v2: v21,
                v3: v30,
                depth: depth - 1_i32,
            };
            stack_ptr += 1_usize;
            v1 = v10;
            v2 = v20;
            v3 = v30;
            depth -= 1_i32;
            have_current = true;
        }
    }
    found_hit
}
