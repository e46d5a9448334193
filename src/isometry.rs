//! Combinatorial isomorphisms of triangulations
//!
//! An [`Isometry`] maps the directed edge labels of one triangulation
//! onto those of another so that triangles go to triangles respecting
//! the cyclic corner order (so every isometry is orientation
//! preserving; a label may still map to a reversed label).
//!
//! Enumeration seeds every possible image of triangle zero and
//! propagates across shared edges; on a connected surface that forces
//! the whole map, so each seed either dies on a conflict or yields one
//! isometry.

use std::fmt;
use std::sync::Arc;

use crate::permutation::Permutation;
use crate::triangulation::{Triangulation, norm, reverse};

/// A combinatorial isomorphism between two triangulations.
#[derive(Debug, Clone)]
pub struct Isometry {
    source: Arc<Triangulation>,
    target: Arc<Triangulation>,
    /// Image of directed label `+e`, indexed by edge; the image of `~e`
    /// is the reverse of the image of `+e`.
    label_map: Vec<i32>,
}

impl Isometry {
    /// Build from an explicit map on nonnegative labels, validating
    /// that triangles map to triangles.
    ///
    /// # Panics
    /// Panics if the map is not an isometry; callers construct these
    /// from known relabellings.
    pub fn from_label_map(
        source: Arc<Triangulation>,
        target: Arc<Triangulation>,
        label_map: Vec<i32>,
    ) -> Self {
        let isometry = Isometry { source, target, label_map };
        assert!(isometry.is_valid(), "label map is not an isometry");
        isometry
    }

    /// Source triangulation.
    pub fn source(&self) -> &Arc<Triangulation> {
        &self.source
    }

    /// Target triangulation.
    pub fn target(&self) -> &Arc<Triangulation> {
        &self.target
    }

    /// Image of a directed label.
    pub fn apply_label(&self, label: i32) -> i32 {
        if label >= 0 {
            self.label_map[label as usize]
        } else {
            reverse(self.label_map[norm(label)])
        }
    }

    /// Image of an undirected edge.
    pub fn apply_edge(&self, edge: usize) -> usize {
        norm(self.label_map[edge])
    }

    /// The induced permutation on undirected edge indices.
    pub fn edge_permutation(&self) -> Permutation {
        Permutation::new((0..self.source.zeta()).map(|e| self.apply_edge(e)).collect())
    }

    /// Whether every edge keeps its index (directions may still
    /// reverse).
    pub fn is_edge_identity(&self) -> bool {
        (0..self.source.zeta()).all(|e| self.apply_edge(e) == e)
    }

    /// For each source triangle: the target triangle and the corner its
    /// corner zero lands on.
    pub fn triangle_map(&self) -> Vec<(usize, usize)> {
        self.source
            .triangles()
            .iter()
            .map(|t| {
                let image = self.apply_label(t[0]);
                let (triangle, corner) = self.target.corner_of_label(image);
                (triangle, corner)
            })
            .collect()
    }

    /// Push a weight vector forward along the isometry.
    pub fn push_forward<T: Clone>(&self, weights: &[T]) -> Vec<T> {
        assert_eq!(weights.len(), self.source.zeta(), "weight vector length mismatch");
        let mut out: Vec<Option<T>> = vec![None; weights.len()];
        for (edge, weight) in weights.iter().enumerate() {
            out[self.apply_edge(edge)] = Some(weight.clone());
        }
        out.into_iter().map(|w| w.expect("isometry is a bijection on edges")).collect()
    }

    /// The inverse isometry.
    pub fn inverse(&self) -> Isometry {
        let mut label_map = vec![0; self.source.zeta()];
        for e in 0..self.source.zeta() {
            let image = self.label_map[e];
            label_map[norm(image)] = if image >= 0 { e as i32 } else { reverse(e as i32) };
        }
        Isometry {
            source: Arc::clone(&self.target),
            target: Arc::clone(&self.source),
            label_map,
        }
    }

    fn is_valid(&self) -> bool {
        if self.label_map.len() != self.source.zeta()
            || self.source.zeta() != self.target.zeta()
        {
            return false;
        }
        let mut seen = vec![false; self.target.zeta()];
        for &image in &self.label_map {
            let edge = norm(image);
            if edge >= self.target.zeta() || seen[edge] {
                return false;
            }
            seen[edge] = true;
        }
        // Triangles map to triangles, cyclic order preserved.
        self.source.triangles().iter().all(|t| {
            let image = self.apply_label(t[0]);
            let (triangle, corner) = self.target.corner_of_label(image);
            (1..3).all(|j| {
                self.apply_label(t[j])
                    == self.target.label((triangle, (corner + j) % 3))
            })
        })
    }
}

impl fmt::Display for Isometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let images: Vec<String> = self
            .label_map
            .iter()
            .map(|&m| if m >= 0 { format!("{}", m) } else { format!("~{}", norm(m)) })
            .collect();
        write!(f, "[{}]", images.join(" "))
    }
}

/// All isometries from `source` to `target`, in the deterministic order
/// induced by the seed enumeration.
pub fn isometries_between(
    source: &Arc<Triangulation>,
    target: &Arc<Triangulation>,
) -> Vec<Isometry> {
    if source.zeta() != target.zeta()
        || source.num_triangles() != target.num_triangles()
        || source.num_vertices() != target.num_vertices()
    {
        return Vec::new();
    }
    let mut isometries = Vec::new();
    for seed_triangle in 0..target.num_triangles() {
        for rotation in 0..3 {
            if let Some(isometry) = propagate(source, target, seed_triangle, rotation) {
                isometries.push(isometry);
            }
        }
    }
    isometries
}

/// Whether two triangulations are combinatorially isomorphic.
pub fn is_isomorphic(source: &Arc<Triangulation>, target: &Arc<Triangulation>) -> bool {
    !isometries_between(source, target).is_empty()
}

fn propagate(
    source: &Arc<Triangulation>,
    target: &Arc<Triangulation>,
    seed_triangle: usize,
    rotation: usize,
) -> Option<Isometry> {
    // Map on directed labels, tracked on the nonnegative side.
    let mut label_map: Vec<Option<i32>> = vec![None; source.zeta()];
    let mut pending: Vec<(i32, i32)> = Vec::new();

    let mut assign = |label_map: &mut Vec<Option<i32>>,
                      pending: &mut Vec<(i32, i32)>,
                      label: i32,
                      image: i32|
     -> bool {
        let (edge, image) = if label >= 0 { (norm(label), image) } else { (norm(label), reverse(image)) };
        match label_map[edge] {
            Some(existing) => existing == image,
            None => {
                label_map[edge] = Some(image);
                pending.push((edge as i32, image));
                true
            }
        }
    };

    for j in 0..3 {
        let label = source.label((0, j));
        let image = target.label((seed_triangle, (rotation + j) % 3));
        if !assign(&mut label_map, &mut pending, label, image) {
            return None;
        }
    }

    while let Some((edge, image)) = pending.pop() {
        // The triangle on the far side of the edge is forced by this
        // assignment; push its other two labels.
        for (label, mapped) in [(edge, image), (reverse(edge), reverse(image))] {
            let (t, k) = source.corner_of_label(label);
            let (t_image, k_image) = target.corner_of_label(mapped);
            for j in 1..3 {
                let next = source.label((t, (k + j) % 3));
                let next_image = target.label((t_image, (k_image + j) % 3));
                if !assign(&mut label_map, &mut pending, next, next_image) {
                    return None;
                }
            }
        }
    }

    let label_map: Vec<i32> = label_map.into_iter().collect::<Option<Vec<_>>>()?;
    // Bijectivity on edges.
    let mut seen = vec![false; target.zeta()];
    for &image in &label_map {
        if seen[norm(image)] {
            return None;
        }
        seen[norm(image)] = true;
    }
    Some(Isometry {
        source: Arc::clone(source),
        target: Arc::clone(target),
        label_map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn once_punctured_torus() -> Arc<Triangulation> {
        Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]])
    }

    #[test]
    fn test_self_isometries_of_torus() {
        let t = once_punctured_torus();
        let isometries = isometries_between(&t, &t);
        // The once-punctured torus triangulation has a transitive
        // symmetry: any directed label can seed the identity corner, and
        // each seed extends uniquely.
        assert_eq!(isometries.len(), 6);
        assert!(isometries.iter().any(Isometry::is_edge_identity));
    }

    #[test]
    fn test_isometry_roundtrip() {
        let t = once_punctured_torus();
        for isometry in isometries_between(&t, &t) {
            let inverse = isometry.inverse();
            let composed_edges: Vec<usize> =
                (0..t.zeta()).map(|e| inverse.apply_edge(isometry.apply_edge(e))).collect();
            assert_eq!(composed_edges, vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_push_forward() {
        let t = once_punctured_torus();
        let isometry = isometries_between(&t, &t)
            .into_iter()
            .find(|i| !i.is_edge_identity())
            .expect("a nontrivial isometry");
        let weights = vec![10, 20, 30];
        let pushed = isometry.push_forward(&weights);
        let mut sorted = pushed.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![10, 20, 30]);
        assert_ne!(pushed, weights);
    }

    #[test]
    fn test_flip_changes_isomorphism_type_or_not() {
        let t = once_punctured_torus();
        let flipped = t.flip_edge(0);
        // The flipped torus triangulation is still a one-vertex
        // triangulation of the same surface, and for the punctured torus
        // it is isomorphic to the original.
        assert!(is_isomorphic(&t, &flipped));
    }
}
