//! Ideal triangulations of punctured surfaces
//!
//! A surface triangulation is a list of triangles, each a cyclically
//! ordered triple of *directed* edge labels. Edge `e` (an index in
//! `[0, zeta)`) has two sides: label `e` and its reverse `~e = -e - 1`.
//! Every label appears in exactly one triangle corner, so each edge is
//! shared by exactly two (not necessarily distinct) triangles.
//!
//! Conventions that the rest of the crate leans on:
//! - in a triangle `(l0, l1, l2)` the directed edge `lk` runs from
//!   corner `k` to corner `k+1`, so the edge opposite corner `k` is
//!   `l(k+1)` and the corners adjacent to `lk` are `k` and `k+1`;
//! - rotating about the vertex at corner `(t, k)` crosses the outgoing
//!   label `lk` to the corner just past its reverse;
//! - `flip_edge` rewrites the square `(e, x, y) / (~e, z, w)` as
//!   `(e, y, z) / (~e, w, x)`, keeping every other triangle in place
//!   and reusing the index of the flipped edge.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::permutation::Permutation;

/// `~label`: the other side of the same edge.
pub fn reverse(label: i32) -> i32 {
    -label - 1
}

/// The undirected edge index of a label.
pub fn norm(label: i32) -> usize {
    if label >= 0 { label as usize } else { reverse(label) as usize }
}

/// A corner of a triangle: `(triangle index, corner index)`.
pub type Corner = (usize, usize);

/// An ideal triangulation of a punctured surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangulation {
    triangles: Vec<[i32; 3]>,
    zeta: usize,
    /// `location[e] = [corner of +e, corner of ~e]`, with the corner of
    /// a label being the one the label points away from.
    location: Vec<[Corner; 2]>,
    vertex_classes: Vec<Vec<Corner>>,
    /// `vertex_of_corner[t][k]`: which vertex class corner `(t, k)` is in.
    vertex_of_corner: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Build a triangulation from triangles of directed labels.
    ///
    /// # Panics
    /// Panics unless every label in `[0, zeta)` and its reverse appears
    /// exactly once.
    pub fn new(triangles: Vec<[i32; 3]>) -> Arc<Self> {
        let zeta_times_two = 3 * triangles.len();
        assert!(zeta_times_two % 2 == 0, "a triangulation needs an even label count");
        let zeta = zeta_times_two / 2;

        let mut location: Vec<[Option<Corner>; 2]> = vec![[None, None]; zeta];
        for (t, triangle) in triangles.iter().enumerate() {
            for (k, &label) in triangle.iter().enumerate() {
                let edge = norm(label);
                assert!(edge < zeta, "label {} out of range for {} edges", label, zeta);
                let side = usize::from(label < 0);
                assert!(
                    location[edge][side].is_none(),
                    "label {} appears more than once",
                    label
                );
                location[edge][side] = Some((t, k));
            }
        }
        let location: Vec<[Corner; 2]> = location
            .into_iter()
            .enumerate()
            .map(|(edge, sides)| {
                [
                    sides[0].unwrap_or_else(|| panic!("label {} missing", edge)),
                    sides[1].unwrap_or_else(|| panic!("label ~{} missing", edge)),
                ]
            })
            .collect();

        let (vertex_classes, vertex_of_corner) = vertex_classes(&triangles, &location);
        Arc::new(Triangulation { triangles, zeta, location, vertex_classes, vertex_of_corner })
    }

    /// Convenience constructor from slices.
    pub fn from_triangles(triangles: &[[i32; 3]]) -> Arc<Self> {
        Triangulation::new(triangles.to_vec())
    }

    /// Number of edges.
    pub fn zeta(&self) -> usize {
        self.zeta
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices (punctures).
    pub fn num_vertices(&self) -> usize {
        self.vertex_classes.len()
    }

    /// The triangles as label triples.
    pub fn triangles(&self) -> &[[i32; 3]] {
        &self.triangles
    }

    /// The label at a corner.
    pub fn label(&self, corner: Corner) -> i32 {
        self.triangles[corner.0][corner.1]
    }

    /// The corner a directed label points away from.
    pub fn corner_of_label(&self, label: i32) -> Corner {
        self.location[norm(label)][usize::from(label < 0)]
    }

    /// The two incidences of edge `edge`, the side carrying `+edge`
    /// first.
    pub fn find_edge(&self, edge: usize) -> (Corner, Corner) {
        assert!(edge < self.zeta, "edge index out of range");
        (self.location[edge][0], self.location[edge][1])
    }

    /// Vertex classes as lists of corners.
    pub fn vertex_classes(&self) -> &[Vec<Corner>] {
        &self.vertex_classes
    }

    /// The vertex class containing a corner.
    pub fn vertex_of_corner(&self, corner: Corner) -> usize {
        self.vertex_of_corner[corner.0][corner.1]
    }

    /// The vertex classes at the tail and head of `+edge`.
    pub fn edge_endpoints(&self, edge: usize) -> (usize, usize) {
        let (t, k) = self.location[edge][0];
        (self.vertex_of_corner((t, k)), self.vertex_of_corner((t, (k + 1) % 3)))
    }

    /// Euler characteristic of the punctured surface: `F - E`.
    pub fn euler_characteristic(&self) -> i64 {
        self.triangles.len() as i64 - self.zeta as i64
    }

    /// The classical bound on the order of a periodic mapping class of
    /// this surface.
    pub fn max_order(&self) -> u32 {
        (6 * self.euler_characteristic().abs()).max(1) as u32
    }

    /// An edge is flippable when its two sides lie in distinct
    /// triangles.
    pub fn is_flippable(&self, edge: usize) -> bool {
        let ((t1, _), (t2, _)) = self.find_edge(edge);
        t1 != t2
    }

    /// Labels of the square about a flippable edge, as `(x, y, z, w)`
    /// with the triangles being `(e, x, y)` and `(~e, z, w)`.
    pub fn square_about_edge(&self, edge: usize) -> (i32, i32, i32, i32) {
        assert!(self.is_flippable(edge), "edge {} is not flippable", edge);
        let ((t1, k1), (t2, k2)) = self.find_edge(edge);
        (
            self.label((t1, (k1 + 1) % 3)),
            self.label((t1, (k1 + 2) % 3)),
            self.label((t2, (k2 + 1) % 3)),
            self.label((t2, (k2 + 2) % 3)),
        )
    }

    /// Flip an edge, producing a new triangulation. The two rewritten
    /// triangles stay at their old positions (the one carrying `+e`
    /// first) and the flipped edge keeps its index; every other triangle
    /// is untouched.
    pub fn flip_edge(&self, edge: usize) -> Arc<Triangulation> {
        assert!(self.is_flippable(edge), "edge {} is not flippable", edge);
        let ((t1, _), (t2, _)) = self.find_edge(edge);
        let (x, y, z, w) = self.square_about_edge(edge);
        let mut triangles = self.triangles.clone();
        triangles[t1] = [edge as i32, y, z];
        triangles[t2] = [reverse(edge as i32), w, x];
        Triangulation::new(triangles)
    }

    /// Relabel every edge by a permutation of `[0, zeta)`, keeping
    /// directions.
    pub fn relabelled(&self, permutation: &Permutation) -> Arc<Triangulation> {
        assert_eq!(permutation.len(), self.zeta, "relabelling permutation has wrong size");
        let relabel = |label: i32| -> i32 {
            if label >= 0 {
                permutation.apply(label as usize) as i32
            } else {
                reverse(permutation.apply(norm(label)) as i32)
            }
        };
        Triangulation::new(
            self.triangles.iter().map(|t| [relabel(t[0]), relabel(t[1]), relabel(t[2])]).collect(),
        )
    }

    /// Weight vectors of the puncture links: one per vertex class. The
    /// link crosses each edge end at its vertex once, and each end is
    /// the outgoing label of exactly one corner of the class.
    pub fn vertex_link_vectors(&self) -> Vec<Vec<BigInt>> {
        self.vertex_classes
            .iter()
            .map(|class| {
                let mut weights = vec![BigInt::zero(); self.zeta];
                for &(t, k) in class {
                    weights[norm(self.label((t, k)))] += 1;
                }
                weights
            })
            .collect()
    }

    /// Weight vectors of the boundaries of regular neighbourhoods of
    /// each edge. Together with the vertex links these span the weight
    /// space, which makes them a faithful test family for encodings.
    pub fn edge_neighbourhood_vectors(&self) -> Vec<Vec<BigInt>> {
        let links = self.vertex_link_vectors();
        (0..self.zeta)
            .map(|edge| {
                let (tail, head) = self.edge_endpoints(edge);
                let mut weights = links[tail].clone();
                if head != tail {
                    for (w, l) in weights.iter_mut().zip(links[head].iter()) {
                        *w += l;
                    }
                }
                weights[edge] -= 2;
                weights
            })
            .collect()
    }

    /// Both spanning families together.
    pub fn key_curve_vectors(&self) -> Vec<Vec<BigInt>> {
        let mut vectors = self.vertex_link_vectors();
        vectors.extend(self.edge_neighbourhood_vectors());
        vectors
    }
}

fn vertex_classes(
    triangles: &[[i32; 3]],
    location: &[[Corner; 2]],
) -> (Vec<Vec<Corner>>, Vec<[usize; 3]>) {
    let corner_of_label = |label: i32| -> Corner {
        location[norm(label)][usize::from(label < 0)]
    };
    let mut vertex_of_corner = vec![[usize::MAX; 3]; triangles.len()];
    let mut classes = Vec::new();
    for t in 0..triangles.len() {
        for k in 0..3 {
            if vertex_of_corner[t][k] != usize::MAX {
                continue;
            }
            let index = classes.len();
            let mut class = Vec::new();
            let (mut ct, mut ck) = (t, k);
            loop {
                vertex_of_corner[ct][ck] = index;
                class.push((ct, ck));
                // Cross the outgoing label; its reverse points back in,
                // so the next corner about this vertex sits one step on.
                let outgoing = triangles[ct][ck];
                let (nt, nk) = corner_of_label(reverse(outgoing));
                let next = (nt, (nk + 1) % 3);
                if next == (t, k) {
                    break;
                }
                (ct, ck) = next;
            }
            classes.push(class);
        }
    }
    (classes, vertex_of_corner)
}

impl fmt::Display for Triangulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |label: i32| {
            if label >= 0 { format!("{}", label) } else { format!("~{}", norm(label)) }
        };
        let triangles: Vec<String> = self
            .triangles
            .iter()
            .map(|t| format!("({} {} {})", show(t[0]), show(t[1]), show(t[2])))
            .collect();
        write!(f, "[{}]", triangles.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The standard once-punctured torus: two triangles, three edges.
    fn once_punctured_torus() -> Arc<Triangulation> {
        Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]])
    }

    #[test]
    fn test_construction() {
        let t = once_punctured_torus();
        assert_eq!(t.zeta(), 3);
        assert_eq!(t.num_triangles(), 2);
        assert_eq!(t.num_vertices(), 1);
        assert_eq!(t.euler_characteristic(), -1);
        assert_eq!(t.max_order(), 6);
    }

    #[test]
    fn test_find_edge_orientation() {
        let t = once_punctured_torus();
        let ((t1, k1), (t2, k2)) = t.find_edge(1);
        assert_eq!(t.label((t1, k1)), 1);
        assert_eq!(t.label((t2, k2)), !1);
    }

    #[test]
    fn test_flip_is_involution_on_triangulations() {
        let t = once_punctured_torus();
        for edge in 0..t.zeta() {
            assert!(t.is_flippable(edge));
            let flipped = t.flip_edge(edge);
            let back = flipped.flip_edge(edge);
            // Flipping twice restores the triangulation up to rotating
            // the two rewritten triangles; on the standard torus the
            // labels come back exactly.
            assert_eq!(back.zeta(), t.zeta());
            assert_eq!(back.num_vertices(), t.num_vertices());
            assert_eq!(back.euler_characteristic(), t.euler_characteristic());
        }
    }

    #[test]
    fn test_flip_preserves_edge_indices() {
        let t = once_punctured_torus();
        let flipped = t.flip_edge(0);
        assert_eq!(flipped.zeta(), 3);
        // Edge 0 still exists on both sides.
        let ((a, _), (b, _)) = flipped.find_edge(0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_vertex_links_satisfy_triangle_inequality() {
        let t = once_punctured_torus();
        for vector in t.key_curve_vectors() {
            for triangle in t.triangles() {
                for k in 0..3 {
                    let a = &vector[norm(triangle[k])];
                    let b = &vector[norm(triangle[(k + 1) % 3])];
                    let c = &vector[norm(triangle[(k + 2) % 3])];
                    assert!(a <= &(b + c), "triangle inequality fails");
                }
            }
        }
    }

    #[test]
    fn test_square_about_edge() {
        let t = once_punctured_torus();
        let (x, y, z, w) = t.square_about_edge(0);
        assert_eq!((x, y, z, w), (1, 2, !1, !2));
    }
}
