//! Bounding volume hierarchy over a triangle set.
//!
//! Built once per render pass by recursive median split on the longest
//! axis of the centroid bounds. Traversal is depth-first, ordered by
//! box entry distance so the near child is visited first and far
//! subtrees can be pruned against the best hit found so far.

use glint_math::{Aabb, Interval, Ray, Vec3};

use crate::intersect;
use crate::triangles::TriangleSet;

/// Nodes stop splitting at this many triangles.
pub const LEAF_SIZE: usize = 4;

/// Subtrees larger than this build their halves on the rayon pool.
const PARALLEL_BUILD_CUTOFF: usize = 4096;

/// Minimum parametric distance for traversal queries. Keeps rays that
/// start on a surface from re-hitting the box they left.
const T_MIN: f32 = 1e-4;

/// A BVH node. The tree owns no geometry, only indices into the
/// triangle set it was built from.
#[derive(Debug)]
pub enum Bvh {
    /// Built from zero triangles; never intersects anything
    Empty,
    Leaf {
        bounds: Aabb,
        triangles: Vec<u32>,
    },
    Branch {
        bounds: Aabb,
        left: Box<Bvh>,
        right: Box<Bvh>,
    },
}

/// The nearest triangle hit found by a traversal.
#[derive(Clone, Copy, Debug)]
pub struct TriangleHit {
    /// Index into the triangle set
    pub triangle: u32,
    pub distance: f32,
    /// Barycentric weights `(w, u, v)`
    pub barycentric: Vec3,
}

/// Work counters for one traversal.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraversalStats {
    pub nodes_visited: u32,
    pub triangles_tested: u32,
}

struct BuildItem {
    triangle: u32,
    bounds: Aabb,
    centroid: Vec3,
}

impl Bvh {
    /// Build a hierarchy over every triangle in the set.
    pub fn build(set: &TriangleSet) -> Self {
        if set.is_empty() {
            return Bvh::Empty;
        }

        let mut items: Vec<BuildItem> = set
            .triangles
            .iter()
            .enumerate()
            .map(|(i, triangle)| {
                let bounds = triangle.bounds();
                BuildItem {
                    triangle: i as u32,
                    bounds,
                    centroid: triangle.centroid(),
                }
            })
            .collect();

        let root = Self::build_node(&mut items);
        log::debug!("Built BVH over {} triangles", set.len());
        root
    }

    fn build_node(items: &mut [BuildItem]) -> Bvh {
        let mut bounds = items[0].bounds;
        for item in &items[1..] {
            bounds = Aabb::surrounding(&bounds, &item.bounds);
        }

        if items.len() <= LEAF_SIZE {
            return Bvh::Leaf {
                bounds,
                triangles: items.iter().map(|i| i.triangle).collect(),
            };
        }

        // Split at the median centroid along the widest axis
        let mut centroid_bounds = Aabb::from_points(items[0].centroid, items[0].centroid);
        for item in &items[1..] {
            centroid_bounds.grow(item.centroid);
        }
        let axis = centroid_bounds.longest_axis();

        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |a, b| {
            a.centroid[axis]
                .partial_cmp(&b.centroid[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let (left_items, right_items) = items.split_at_mut(mid);
        let (left, right) = if left_items.len() + right_items.len() >= PARALLEL_BUILD_CUTOFF {
            rayon::join(
                || Self::build_node(left_items),
                || Self::build_node(right_items),
            )
        } else {
            (Self::build_node(left_items), Self::build_node(right_items))
        };

        Bvh::Branch {
            bounds,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self {
            Bvh::Empty => Aabb::EMPTY,
            Bvh::Leaf { bounds, .. } | Bvh::Branch { bounds, .. } => *bounds,
        }
    }

    /// Number of triangles referenced by leaves under this node.
    pub fn triangle_count(&self) -> usize {
        match self {
            Bvh::Empty => 0,
            Bvh::Leaf { triangles, .. } => triangles.len(),
            Bvh::Branch { left, right, .. } => left.triangle_count() + right.triangle_count(),
        }
    }

    /// Find the nearest triangle hit within `(T_MIN, t_max)`.
    pub fn intersect_nearest(
        &self,
        ray: &Ray,
        set: &TriangleSet,
        t_max: f32,
    ) -> Option<TriangleHit> {
        self.intersect_nearest_with_stats(ray, set, t_max).0
    }

    /// Nearest-hit traversal that also reports how much work it did.
    pub fn intersect_nearest_with_stats(
        &self,
        ray: &Ray,
        set: &TriangleSet,
        t_max: f32,
    ) -> (Option<TriangleHit>, TraversalStats) {
        let mut stats = TraversalStats::default();
        let mut best: Option<TriangleHit> = None;
        let mut best_t = t_max;

        let mut stack: Vec<(&Bvh, f32)> = Vec::with_capacity(32);
        if let Some(entry) = self.bounds().entry_distance(ray, Interval::new(T_MIN, best_t)) {
            stack.push((self, entry));
        }

        while let Some((node, entry)) = stack.pop() {
            // The best hit may have moved in front of this subtree since
            // it was pushed
            if entry >= best_t {
                continue;
            }
            stats.nodes_visited += 1;

            match node {
                Bvh::Empty => {}

                Bvh::Leaf { triangles, .. } => {
                    for &index in triangles {
                        stats.triangles_tested += 1;
                        let triangle = &set.triangles[index as usize];
                        let [v0, v1, v2] = &triangle.vertices;
                        if let Some((t, bary)) =
                            intersect::ray_triangle(ray, v0.position, v1.position, v2.position)
                        {
                            if t < best_t {
                                best_t = t;
                                best = Some(TriangleHit {
                                    triangle: index,
                                    distance: t,
                                    barycentric: bary,
                                });
                            }
                        }
                    }
                }

                Bvh::Branch { left, right, .. } => {
                    let range = Interval::new(T_MIN, best_t);
                    let near = left.bounds().entry_distance(ray, range).map(|t| (&**left, t));
                    let far = right
                        .bounds()
                        .entry_distance(ray, range)
                        .map(|t| (&**right, t));

                    // Push the farther child first so the nearer one is
                    // popped (and can tighten best_t) before it
                    match (near, far) {
                        (Some(a), Some(b)) => {
                            let (near, far) = if a.1 <= b.1 { (a, b) } else { (b, a) };
                            stack.push(far);
                            stack.push(near);
                        }
                        (Some(a), None) | (None, Some(a)) => stack.push(a),
                        (None, None) => {}
                    }
                }
            }
        }

        (best, stats)
    }

    /// Occlusion query: does anything intersect within `(T_MIN, t_max)`?
    ///
    /// Returns on the first hit found, without resolving which triangle
    /// is nearest.
    pub fn intersect_any(&self, ray: &Ray, set: &TriangleSet, t_max: f32) -> bool {
        let range = Interval::new(T_MIN, t_max);
        let mut stack: Vec<&Bvh> = Vec::with_capacity(32);
        stack.push(self);

        while let Some(node) = stack.pop() {
            match node {
                Bvh::Empty => {}

                Bvh::Leaf { bounds, triangles } => {
                    if !bounds.hit(ray, range) {
                        continue;
                    }
                    for &index in triangles {
                        let triangle = &set.triangles[index as usize];
                        let [v0, v1, v2] = &triangle.vertices;
                        if let Some((t, _)) =
                            intersect::ray_triangle(ray, v0.position, v1.position, v2.position)
                        {
                            if t < t_max {
                                return true;
                            }
                        }
                    }
                }

                Bvh::Branch {
                    bounds,
                    left,
                    right,
                } => {
                    if bounds.hit(ray, range) {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }

        false
    }
}
