//! Points, vectors, bounding boxes, and rays: the geometric
//! foundation the intersection code is built on.
//!
//! Besides the usual 3D classes there is a **Point4f**, a projected
//! control point of a fiber curve: x and y are the cross-section
//! coordinates perpendicular to a ray, z is the depth along the ray,
//! and the fourth lane carries the fiber radius at that control
//! point. The subdivision intersector works entirely on these.
//!
//! A **Ray** here owns its valid parametric interval *and* the best
//! hit found so far (depth, tangent proxy, primitive id); traversal
//! shrinks `t_far` monotonically as closer hits are found. A
//! **RayPacket** is a small fixed-size batch of independent rays with
//! an active-lane bitmask; lane order never influences per-lane
//! results.

// std
use std::ops;
// hair
use crate::core::common::Float;

/// Number of ray lanes carried by one [RayPacket](struct.RayPacket.html).
pub const RAY_PACKET_SIZE: usize = 8;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Vector3f {
    pub fn length_squared(&self) -> Float {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }
    pub fn normalize(&self) -> Vector3f {
        *self / self.length()
    }
    pub fn abs(&self) -> Vector3f {
        Vector3f {
            x: self.x.abs(),
            y: self.y.abs(),
            z: self.z.abs(),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

/// A projected curve control point: cross-section position (x, y),
/// depth along the ray (z), and fiber radius (w).
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point4f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
    pub w: Float,
}

impl_op_ex!(+|a: &Vector3f, b: &Vector3f| -> Vector3f {
    Vector3f {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
    }
});

impl_op_ex!(-|a: &Vector3f, b: &Vector3f| -> Vector3f {
    Vector3f {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
});

impl_op_ex!(*|a: &Vector3f, b: Float| -> Vector3f {
    Vector3f {
        x: a.x * b,
        y: a.y * b,
        z: a.z * b,
    }
});

impl_op_ex!(/|a: &Vector3f, b: Float| -> Vector3f {
    Vector3f {
        x: a.x / b,
        y: a.y / b,
        z: a.z / b,
    }
});

impl_op_ex!(+|a: &Point3f, b: &Point3f| -> Point3f {
    Point3f {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
    }
});

impl_op_ex!(+|a: &Point3f, b: &Vector3f| -> Point3f {
    Point3f {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
    }
});

impl_op_ex!(-|a: &Point3f, b: &Vector3f| -> Point3f {
    Point3f {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
});

impl_op_ex!(-|a: &Point3f, b: &Point3f| -> Vector3f {
    Vector3f {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
});

impl_op_ex!(*|a: &Point3f, b: Float| -> Point3f {
    Point3f {
        x: a.x * b,
        y: a.y * b,
        z: a.z * b,
    }
});

impl_op_ex!(+|a: &Point4f, b: &Point4f| -> Point4f {
    Point4f {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
        w: a.w + b.w,
    }
});

impl_op_ex!(*|a: &Point4f, b: Float| -> Point4f {
    Point4f {
        x: a.x * b,
        y: a.y * b,
        z: a.z * b,
        w: a.w * b,
    }
});

pub fn vec3_dot_vec3(v1: &Vector3f, v2: &Vector3f) -> Float {
    v1.x * v2.x + v1.y * v2.y + v1.z * v2.z
}

pub fn vec3_cross_vec3(v1: &Vector3f, v2: &Vector3f) -> Vector3f {
    let v1x: f64 = v1.x as f64;
    let v1y: f64 = v1.y as f64;
    let v1z: f64 = v1.z as f64;
    let v2x: f64 = v2.x as f64;
    let v2y: f64 = v2.y as f64;
    let v2z: f64 = v2.z as f64;
    Vector3f {
        x: ((v1y * v2z) - (v1z * v2y)) as Float,
        y: ((v1z * v2x) - (v1x * v2z)) as Float,
        z: ((v1x * v2y) - (v1y * v2x)) as Float,
    }
}

/// Construct a local coordinate system given only a single normalized
/// 3D vector.
pub fn vec3_coordinate_system(v1: &Vector3f, v2: &mut Vector3f, v3: &mut Vector3f) {
    if v1.x.abs() > v1.y.abs() {
        *v2 = Vector3f {
            x: -v1.z,
            y: 0.0 as Float,
            z: v1.x,
        } / (v1.x * v1.x + v1.z * v1.z).sqrt();
    } else {
        *v2 = Vector3f {
            x: 0.0 as Float,
            y: v1.z,
            z: -v1.y,
        } / (v1.y * v1.y + v1.z * v1.z).sqrt();
    }
    *v3 = vec3_cross_vec3(v1, &*v2);
}

pub fn pnt3_lerp(t: Float, p0: &Point3f, p1: &Point3f) -> Point3f {
    *p0 * (1.0 as Float - t) + *p1 * t
}

pub fn pnt3_distance(p1: &Point3f, p2: &Point3f) -> Float {
    (p2 - p1).length()
}

/// Component-wise minimum; the radius lane participates like any
/// other.
pub fn pnt4_min_pnt4(p1: &Point4f, p2: &Point4f) -> Point4f {
    Point4f {
        x: p1.x.min(p2.x),
        y: p1.y.min(p2.y),
        z: p1.z.min(p2.z),
        w: p1.w.min(p2.w),
    }
}

/// Component-wise maximum.
pub fn pnt4_max_pnt4(p1: &Point4f, p2: &Point4f) -> Point4f {
    Point4f {
        x: p1.x.max(p2.x),
        y: p1.y.max(p2.y),
        z: p1.z.max(p2.z),
        w: p1.w.max(p2.w),
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Bounds3f {
    pub p_min: Point3f,
    pub p_max: Point3f,
}

impl Default for Bounds3f {
    fn default() -> Bounds3f {
        let min_num: Float = std::f32::MIN;
        let max_num: Float = std::f32::MAX;
        // an inverted box, so that the first union assigns real bounds
        Bounds3f {
            p_min: Point3f {
                x: max_num,
                y: max_num,
                z: max_num,
            },
            p_max: Point3f {
                x: min_num,
                y: min_num,
                z: min_num,
            },
        }
    }
}

impl Bounds3f {
    pub fn new(p1: Point3f, p2: Point3f) -> Self {
        let p_min: Point3f = Point3f {
            x: p1.x.min(p2.x),
            y: p1.y.min(p2.y),
            z: p1.z.min(p2.z),
        };
        let p_max: Point3f = Point3f {
            x: p1.x.max(p2.x),
            y: p1.y.max(p2.y),
            z: p1.z.max(p2.z),
        };
        Bounds3f { p_min, p_max }
    }
    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }
}

/// Given a bounding box and a point, the **bnd3_union_pnt3f()**
/// function returns a new bounding box that encompasses that point as
/// well as the original box.
pub fn bnd3_union_pnt3f(b: &Bounds3f, p: &Point3f) -> Bounds3f {
    let p_min: Point3f = Point3f {
        x: b.p_min.x.min(p.x),
        y: b.p_min.y.min(p.y),
        z: b.p_min.z.min(p.z),
    };
    let p_max: Point3f = Point3f {
        x: b.p_max.x.max(p.x),
        y: b.p_max.y.max(p.y),
        z: b.p_max.z.max(p.z),
    };
    Bounds3f { p_min, p_max }
}

/// Construct a new box that bounds the space encompassed by two other
/// bounding boxes.
pub fn bnd3_union_bnd3f(b1: &Bounds3f, b2: &Bounds3f) -> Bounds3f {
    let p_min: Point3f = Point3f {
        x: b1.p_min.x.min(b2.p_min.x),
        y: b1.p_min.y.min(b2.p_min.y),
        z: b1.p_min.z.min(b2.p_min.z),
    };
    let p_max: Point3f = Point3f {
        x: b1.p_max.x.max(b2.p_max.x),
        y: b1.p_max.y.max(b2.p_max.y),
        z: b1.p_max.z.max(b2.p_max.z),
    };
    Bounds3f { p_min, p_max }
}

/// Pads the bounding box by a constant factor in all dimensions.
pub fn bnd3_expand(b: &Bounds3f, delta: Float) -> Bounds3f {
    Bounds3f::new(
        b.p_min
            - Vector3f {
                x: delta,
                y: delta,
                z: delta,
            },
        b.p_max
            + Vector3f {
                x: delta,
                y: delta,
                z: delta,
            },
    )
}

/// Orthonormal coordinate frame whose z axis is aligned with a ray
/// direction. Projecting geometry into this frame puts the ray on the
/// z axis, so a point's cross-section distance from the ray is just
/// its (x, y) length and its depth along the ray is z.
#[derive(Debug, Default, Copy, Clone)]
pub struct Frame {
    pub vx: Vector3f,
    pub vy: Vector3f,
    pub vz: Vector3f,
}

impl Frame {
    pub fn from_z(d: &Vector3f) -> Frame {
        let vz: Vector3f = d.normalize();
        let mut vx: Vector3f = Vector3f::default();
        let mut vy: Vector3f = Vector3f::default();
        vec3_coordinate_system(&vz, &mut vx, &mut vy);
        Frame { vx, vy, vz }
    }
    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f {
            x: vec3_dot_vec3(v, &self.vx),
            y: vec3_dot_vec3(v, &self.vy),
            z: vec3_dot_vec3(v, &self.vz),
        }
    }
    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.vx * v.x + self.vy * v.y + self.vz * v.z
    }
}

/// A ray, its valid parametric interval, and the best hit found so
/// far. Traversal only ever *shrinks* `t_far`.
#[derive(Debug, Copy, Clone)]
pub struct Ray {
    /// origin
    pub o: Point3f,
    /// direction; expected to be normalized so that depths are
    /// euclidean distances
    pub d: Vector3f,
    pub t_near: Float,
    pub t_far: Float,
    /// unnormalized tangent of the hit chord; a proxy for the
    /// geometric normal (the true surface normal needs a full curve
    /// evaluation)
    pub ng: Vector3f,
    pub prim_id: Option<u32>,
}

impl Default for Ray {
    fn default() -> Ray {
        Ray {
            o: Point3f::default(),
            d: Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
            t_near: 0.0 as Float,
            t_far: std::f32::INFINITY,
            ng: Vector3f::default(),
            prim_id: None,
        }
    }
}

impl Ray {
    pub fn new(o: Point3f, d: Vector3f) -> Ray {
        Ray {
            o,
            d,
            ..Ray::default()
        }
    }
    pub fn position(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

/// An ordered batch of independent ray lanes plus an active-lane
/// bitmask (bit *i* set = lane *i* participates).
#[derive(Debug, Copy, Clone)]
pub struct RayPacket {
    pub rays: [Ray; RAY_PACKET_SIZE],
    pub active: u8,
}

impl Default for RayPacket {
    fn default() -> RayPacket {
        RayPacket {
            rays: [Ray::default(); RAY_PACKET_SIZE],
            active: all_lanes(),
        }
    }
}

impl RayPacket {
    pub fn new(rays: [Ray; RAY_PACKET_SIZE]) -> RayPacket {
        RayPacket {
            rays,
            active: all_lanes(),
        }
    }
    pub fn lane_active(&self, lane: usize) -> bool {
        self.active & (1_u8 << lane) != 0_u8
    }
}

/// Bitmask with every packet lane active.
pub fn all_lanes() -> u8 {
    ((1_u16 << RAY_PACKET_SIZE) - 1) as u8
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_is_orthonormal() {
        let d: Vector3f = Vector3f {
            x: 0.3,
            y: -1.7,
            z: 0.4,
        };
        let frame: Frame = Frame::from_z(&d);
        assert!((frame.vx.length() - 1.0).abs() < 1e-6);
        assert!((frame.vy.length() - 1.0).abs() < 1e-6);
        assert!((frame.vz.length() - 1.0).abs() < 1e-6);
        assert!(vec3_dot_vec3(&frame.vx, &frame.vy).abs() < 1e-6);
        assert!(vec3_dot_vec3(&frame.vx, &frame.vz).abs() < 1e-6);
        assert!(vec3_dot_vec3(&frame.vy, &frame.vz).abs() < 1e-6);
        // round trip
        let v: Vector3f = Vector3f {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        };
        let w: Vector3f = frame.to_world(&frame.to_local(&v));
        assert!((w - v).length() < 1e-5);
    }

    #[test]
    fn bounds_union_and_expand() {
        let b: Bounds3f = Bounds3f::default();
        let b: Bounds3f = bnd3_union_pnt3f(
            &b,
            &Point3f {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
        );
        let b: Bounds3f = bnd3_union_pnt3f(
            &b,
            &Point3f {
                x: -1.0,
                y: 0.0,
                z: 5.0,
            },
        );
        assert_eq!(b.p_min.x, -1.0);
        assert_eq!(b.p_max.z, 5.0);
        let e: Bounds3f = bnd3_expand(&b, 0.5);
        assert_eq!(e.p_min.y, -0.5);
        assert_eq!(e.p_max.x, 1.5);
    }

    #[test]
    fn packet_lane_mask() {
        let packet: RayPacket = RayPacket::default();
        assert_eq!(packet.active, 0xff_u8);
        assert!(packet.lane_active(0));
        assert!(packet.lane_active(7));
    }
}
