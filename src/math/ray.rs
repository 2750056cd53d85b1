//! Ray type and operations

use crate::core::types::Vec3;
use super::aabb::Aabb;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Where a ray enters a box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Ray parameter at the entry point
    pub distance: f32,
    /// Entry point. The coordinate on `axis` is exactly the crossed box plane.
    pub point: Vec3,
    /// Axis (0 = x, 1 = y, 2 = z) whose slab the ray entered last
    pub axis: usize,
}

impl Ray {
    /// Create a new ray (direction does not need to be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Same direction, different origin
    pub fn with_origin(&self, origin: Vec3) -> Ray {
        Ray { origin, direction: self.direction }
    }

    /// Entry hit with a strictly positive distance.
    ///
    /// Rays starting inside or on the surface of `aabb` report no hit.
    pub fn hit_aabb(&self, aabb: &Aabb) -> Option<RayHit> {
        let (t_near, t_far, axis, plane) = self.slabs(aabb)?;
        if t_near > t_far || t_near <= 0.0 {
            return None;
        }
        let axis = axis?;

        let mut point = self.at(t_near);
        point[axis] = plane;
        Some(RayHit { distance: t_near, point, axis })
    }

    /// Per-axis slab clipping. Axes the ray runs parallel to only constrain
    /// the origin, which avoids 0 * inf on box boundaries.
    fn slabs(&self, aabb: &Aabb) -> Option<(f32, f32, Option<usize>, f32)> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut entry_axis = None;
        let mut entry_plane = 0.0;

        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

            if d == 0.0 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let (near_plane, far_plane) = if d > 0.0 { (lo, hi) } else { (hi, lo) };
            let t0 = (near_plane - o) / d;
            let t1 = (far_plane - o) / d;

            if t0 > t_near {
                t_near = t0;
                entry_axis = Some(axis);
                entry_plane = near_plane;
            }
            t_far = t_far.min(t1);
        }

        Some((t_near, t_far, entry_axis, entry_plane))
    }
}
