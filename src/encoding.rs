//! Encodings: sequences of piecewise-linear moves
//!
//! An [`Encoding`] is a composition of basic piecewise-linear functions
//! on weight vectors: edge flips and relabelling isometries. Applying
//! one to a lamination traces which linear cell the lamination lies in
//! at every step; multiplying the chosen linear pieces gives the
//! integer *action matrix* of the encoding on that cell, and stacking
//! the choices gives the *condition matrix* cutting the cell out.
//!
//! Two encodings are equal when they agree on the key curves of their
//! source, a spanning family, so equality and `order()` are decided by
//! finitely many exact integer computations.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::error::{AbortSignal, Result, check_abort};
use crate::isometry::Isometry;
use crate::lamination::{Lamination, Weight};
use crate::matrix::Matrix;
use crate::triangulation::{Triangulation, norm};

/// One basic piecewise-linear move.
#[derive(Debug, Clone)]
enum Step {
    /// Flip an edge of `source`, landing on `target`. The inverse of a
    /// flip is recorded with the roles of the triangulations swapped:
    /// the weight action of a flip is an involution, so the same edge
    /// flips back.
    Flip { source: Arc<Triangulation>, target: Arc<Triangulation>, edge: usize },
    /// A relabelling.
    Relabel(Isometry),
}

impl Step {
    fn source(&self) -> &Arc<Triangulation> {
        match self {
            Step::Flip { source, .. } => source,
            Step::Relabel(isometry) => isometry.source(),
        }
    }

    fn target(&self) -> &Arc<Triangulation> {
        match self {
            Step::Flip { target, .. } => target,
            Step::Relabel(isometry) => isometry.target(),
        }
    }

    fn inverse(&self) -> Step {
        match self {
            Step::Flip { source, target, edge } => Step::Flip {
                source: Arc::clone(target),
                target: Arc::clone(source),
                edge: *edge,
            },
            Step::Relabel(isometry) => Step::Relabel(isometry.inverse()),
        }
    }

    /// Apply to a weight vector, returning the image weights.
    fn apply<W: Weight>(&self, weights: &[W]) -> Result<Vec<W>> {
        match self {
            Step::Flip { source, edge, .. } => {
                let (x, y, z, w) = source.square_about_edge(*edge);
                let ac = weights[norm(x)].add(&weights[norm(z)]);
                let bd = weights[norm(y)].add(&weights[norm(w)]);
                let larger = if ac.sub(&bd).sign()? == Ordering::Less { bd } else { ac };
                let mut out = weights.to_vec();
                out[*edge] = larger.sub(&weights[*edge]);
                Ok(out)
            }
            Step::Relabel(isometry) => Ok(isometry.push_forward(weights)),
        }
    }

    /// The linear piece acting on the cell of `weights`, and the row
    /// cutting that cell out (empty for relabellings).
    fn linear_piece<W: Weight>(
        &self,
        weights: &[W],
    ) -> Result<(Matrix<BigInt>, Option<Vec<BigInt>>)> {
        let zeta = weights.len();
        match self {
            Step::Flip { source, edge, .. } => {
                let (x, y, z, w) = source.square_about_edge(*edge);
                let ac = weights[norm(x)].add(&weights[norm(z)]);
                let bd = weights[norm(y)].add(&weights[norm(w)]);
                // On a tie both pieces agree; take the a+c side.
                let take_ac = ac.sub(&bd).sign()? != Ordering::Less;
                let (plus_one, plus_two) =
                    if take_ac { (norm(x), norm(z)) } else { (norm(y), norm(w)) };
                let mut action = Matrix::identity(zeta);
                let mut row = vec![BigInt::zero(); zeta];
                row[*edge] = -BigInt::one();
                row[plus_one] += 1;
                row[plus_two] += 1;
                let mut action_rows = action.rows().to_vec();
                action_rows[*edge] = row;
                action = Matrix::new(action_rows);
                // The chosen side is the larger: (a+c) - (b+d) >= 0.
                let mut condition = vec![BigInt::zero(); zeta];
                let (ca, cb) = if take_ac { (1, -1) } else { (-1, 1) };
                condition[norm(x)] += ca;
                condition[norm(z)] += ca;
                condition[norm(y)] += cb;
                condition[norm(w)] += cb;
                Ok((action, Some(condition)))
            }
            Step::Relabel(isometry) => {
                let rows = (0..zeta)
                    .map(|image| {
                        let mut row = vec![BigInt::zero(); zeta];
                        // Row `image` reads the preimage weight.
                        let preimage = (0..zeta)
                            .find(|&e| isometry.apply_edge(e) == image)
                            .expect("isometries are bijections");
                        row[preimage] = BigInt::one();
                        row
                    })
                    .collect();
                Ok((Matrix::new(rows), None))
            }
        }
    }
}

/// A composition of basic piecewise-linear moves between triangulations.
#[derive(Debug, Clone)]
pub struct Encoding {
    source: Arc<Triangulation>,
    target: Arc<Triangulation>,
    /// In application order: `steps[0]` acts first.
    steps: Vec<Step>,
}

impl Encoding {
    /// The identity encoding of a triangulation.
    pub fn identity(triangulation: Arc<Triangulation>) -> Self {
        Encoding {
            source: Arc::clone(&triangulation),
            target: triangulation,
            steps: Vec::new(),
        }
    }

    /// The encoding of a single edge flip.
    pub fn from_flip(source: Arc<Triangulation>, edge: usize) -> Self {
        let target = source.flip_edge(edge);
        Encoding {
            source: Arc::clone(&source),
            target: Arc::clone(&target),
            steps: vec![Step::Flip { source, target, edge }],
        }
    }

    /// The encoding of a relabelling isometry.
    pub fn from_isometry(isometry: Isometry) -> Self {
        Encoding {
            source: Arc::clone(isometry.source()),
            target: Arc::clone(isometry.target()),
            steps: vec![Step::Relabel(isometry)],
        }
    }

    /// Source triangulation.
    pub fn source(&self) -> &Arc<Triangulation> {
        &self.source
    }

    /// Target triangulation.
    pub fn target(&self) -> &Arc<Triangulation> {
        &self.target
    }

    /// Number of basic moves.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this is the empty composition.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether source and target are the same labelled triangulation, so
    /// powers compose.
    pub fn is_mapping_class(&self) -> bool {
        self.source == self.target
    }

    /// `self` after `other` (right-to-left composition).
    ///
    /// # Panics
    /// Panics if `other` does not land on the source of `self`.
    pub fn compose(&self, other: &Encoding) -> Encoding {
        assert_eq!(
            *other.target, *self.source,
            "encodings do not compose: target and source differ"
        );
        let mut steps = other.steps.clone();
        steps.extend(self.steps.iter().cloned());
        Encoding {
            source: Arc::clone(&other.source),
            target: Arc::clone(&self.target),
            steps,
        }
    }

    /// The inverse encoding.
    pub fn inverse(&self) -> Encoding {
        Encoding {
            source: Arc::clone(&self.target),
            target: Arc::clone(&self.source),
            steps: self.steps.iter().rev().map(Step::inverse).collect(),
        }
    }

    /// The `n`-th power of a mapping class.
    pub fn pow(&self, n: u32) -> Encoding {
        assert!(self.is_mapping_class(), "powers need a mapping class");
        let mut power = Encoding::identity(Arc::clone(&self.source));
        for _ in 0..n {
            power = self.compose(&power);
        }
        power
    }

    /// Apply to a lamination.
    pub fn apply<W: Weight>(&self, lamination: &Lamination<W>) -> Result<Lamination<W>> {
        assert_eq!(
            **lamination.triangulation(),
            *self.source,
            "lamination does not live on the source triangulation"
        );
        let mut weights = lamination.geometric().to_vec();
        for step in &self.steps {
            weights = step.apply(&weights)?;
        }
        Ok(Lamination::new_unchecked(Arc::clone(&self.target), weights))
    }

    /// The integer action matrix valid on the cell of `lamination`,
    /// together with the condition matrix cutting the cell out (rows
    /// dot any weight vector in the cell nonnegatively), both in source
    /// coordinates.
    pub fn applied_matrices<W: Weight>(
        &self,
        lamination: &Lamination<W>,
    ) -> Result<(Matrix<BigInt>, Matrix<BigInt>)> {
        let zeta = self.source.zeta();
        let mut action = Matrix::identity(zeta);
        let mut conditions: Vec<Vec<BigInt>> = Vec::new();
        let mut weights = lamination.geometric().to_vec();
        for step in &self.steps {
            let (piece, condition) = step.linear_piece(&weights)?;
            if let Some(row) = condition {
                // Transport the cell condition back to source
                // coordinates through the action so far.
                let transported: Vec<BigInt> = (0..zeta)
                    .map(|j| {
                        row.iter()
                            .enumerate()
                            .map(|(i, r)| r * action.entry(i, j))
                            .sum()
                    })
                    .collect();
                conditions.push(transported);
            }
            action = piece.compose(&action);
            weights = step.apply(&weights)?;
        }
        if conditions.is_empty() {
            conditions.push(vec![BigInt::zero(); zeta]);
        }
        Ok((action, Matrix::new(conditions)))
    }

    /// The key curves of the source triangulation as laminations.
    fn key_curves(&self) -> Vec<Lamination<BigInt>> {
        self.source
            .key_curve_vectors()
            .into_iter()
            .map(|weights| Lamination::new_unchecked(Arc::clone(&self.source), weights))
            .collect()
    }

    /// The order of a periodic mapping class: the least `n >= 1` with
    /// `self^n` the identity on all laminations, or `0` when the class
    /// has infinite order. Bounded by the torsion bound of the mapping
    /// class group of the surface.
    pub fn order(&self) -> u32 {
        self.order_with(None).expect("integer weights never fail to compare")
    }

    /// [`Encoding::order`] with a cancellation signal.
    pub fn order_with(&self, abort: Option<AbortSignal<'_>>) -> Result<u32> {
        if !self.is_mapping_class() {
            return Ok(0);
        }
        let originals = self.key_curves();
        let mut images = originals.clone();
        for n in 1..=self.source.max_order() {
            check_abort(abort, "order")?;
            let mut next = Vec::with_capacity(images.len());
            for image in &images {
                next.push(self.apply(image)?);
            }
            images = next;
            let identity_so_far = self.target == self.source
                && images
                    .iter()
                    .zip(originals.iter())
                    .all(|(a, b)| a.geometric() == b.geometric());
            if identity_so_far {
                return Ok(n);
            }
        }
        Ok(0)
    }

    /// Whether the mapping class has finite order.
    pub fn is_periodic(&self) -> bool {
        self.order() != 0
    }
}

impl PartialEq for Encoding {
    fn eq(&self, other: &Self) -> bool {
        if *self.source != *other.source || *self.target != *other.target {
            return false;
        }
        self.key_curves().iter().all(|curve| {
            let a = self.apply(curve).expect("integer weights never fail to compare");
            let b = other.apply(curve).expect("integer weights never fail to compare");
            a.geometric() == b.geometric()
        })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Flip { edge, .. } => format!("flip {}", edge),
                Step::Relabel(isometry) => format!("relabel {}", isometry),
            })
            .collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lamination::IntegerLamination;

    fn once_punctured_torus() -> Arc<Triangulation> {
        Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]])
    }

    fn curve(t: &Arc<Triangulation>, weights: &[i64]) -> IntegerLamination {
        IntegerLamination::from_weights(t, weights).expect("valid weights")
    }

    #[test]
    fn test_flip_weight_action() {
        let t = once_punctured_torus();
        let flip = Encoding::from_flip(Arc::clone(&t), 0);
        let c = curve(&t, &[1, 1, 0]);
        let image = flip.apply(&c).expect("apply");
        // max(2*1, 2*0) - 1 = 1.
        assert_eq!(image.geometric()[0], BigInt::from(1));
    }

    #[test]
    fn test_flip_involution_on_weights() {
        let t = once_punctured_torus();
        let flip = Encoding::from_flip(Arc::clone(&t), 1);
        let back = flip.inverse().compose(&flip);
        for weights in [[1, 1, 0], [0, 1, 1], [2, 1, 1], [3, 2, 1]] {
            let c = curve(&t, &weights);
            let image = back.apply(&c).expect("apply");
            assert_eq!(image.geometric(), c.geometric());
        }
    }

    #[test]
    fn test_action_matrix_matches_application() {
        let t = once_punctured_torus();
        let c = curve(&t, &[1, 1, 0]);
        let twist = c.encode_twist(1).expect("twist");
        let b = curve(&t, &[0, 1, 1]);
        let (action, condition) = twist.applied_matrices(&b).expect("matrices");
        let direct = twist.apply(&b).expect("apply");
        assert_eq!(action.apply(b.geometric()), direct.geometric());
        assert!(condition.nonnegative_image(b.geometric()));
    }

    #[test]
    fn test_identity_order() {
        let t = once_punctured_torus();
        let identity = Encoding::identity(t);
        assert_eq!(identity.order(), 1);
        assert!(identity.is_periodic());
    }

    #[test]
    fn test_twist_has_infinite_order() {
        let t = once_punctured_torus();
        let c = curve(&t, &[1, 1, 0]);
        let twist = c.encode_twist(1).expect("twist");
        assert_eq!(twist.order(), 0);
        assert!(!twist.is_periodic());
    }

    #[test]
    fn test_twist_times_inverse_is_identity() {
        let t = once_punctured_torus();
        let c = curve(&t, &[1, 1, 0]);
        let twist = c.encode_twist(1).expect("twist");
        let untwist = c.encode_twist(-1).expect("untwist");
        let product = twist.compose(&untwist);
        assert_eq!(product.order(), 1);
        assert_eq!(product, Encoding::identity(Arc::clone(&t)));
    }
}
