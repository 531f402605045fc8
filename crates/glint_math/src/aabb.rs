use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box, stored as one interval per axis.
///
/// This is the node volume of the renderer's BVH. Boxes are padded to a
/// minimum extent on construction so that axis-aligned triangles never
/// produce a zero-width slab.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create an AABB from two corner points (any opposing pair).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Extend the box to contain a point.
    pub fn grow(&mut self, p: Vec3) {
        self.x = Interval::new(self.x.min.min(p.x), self.x.max.max(p.x));
        self.y = Interval::new(self.y.min.min(p.y), self.y.max.max(p.y));
        self.z = Interval::new(self.z.min.min(p.z), self.z.max.max(p.z));
    }

    /// Slab test returning the entry distance along the ray.
    ///
    /// Returns `None` when the ray misses the box or the overlap falls
    /// outside `ray_t`. The returned value is the parametric distance at
    /// which the ray enters the box (clamped to `ray_t.min` when the
    /// origin is inside), which the BVH uses to order child visits.
    pub fn entry_distance(&self, r: &Ray, ray_t: Interval) -> Option<f32> {
        let mut t_min = ray_t.min;
        let mut t_max = ray_t.max;

        for axis in 0..3 {
            let (slab, origin, dir) = match axis {
                0 => (self.x, r.origin.x, r.direction.x),
                1 => (self.y, r.origin.y, r.direction.y),
                _ => (self.z, r.origin.z, r.direction.z),
            };

            let inv_d = 1.0 / dir;
            let mut t0 = (slab.min - origin) * inv_d;
            let mut t1 = (slab.max - origin) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t0.max(t_min);
            t_max = t1.min(t_max);
            if t_max <= t_min {
                return None;
            }
        }

        Some(t_min)
    }

    /// Boolean form of the slab test.
    pub fn hit(&self, r: &Ray, ray_t: Interval) -> bool {
        self.entry_distance(r, ray_t).is_some()
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(
            (self.x.min + self.x.max) * 0.5,
            (self.y.min + self.y.max) * 0.5,
            (self.z.min + self.z.max) * 0.5,
        )
    }

    /// Pad intervals to avoid zero-width slabs.
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

impl Default for Aabb {
    /// The empty box, so derived defaults start from an identity for
    /// [`Aabb::surrounding`] and `grow`.
    fn default() -> Self {
        Self::EMPTY
    }
}
