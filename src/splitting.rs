//! Splitting sequences of invariant laminations
//!
//! Starting from the invariant lamination of a pseudo-Anosov class,
//! repeatedly flip the edge of maximal weight. The weights contract by
//! the dilatation over each period, so the sequence of triangulations
//! eventually repeats up to a combinatorial isometry rescaling the
//! lamination projectively. Matching is exact: projective equality and
//! the dilatation identity are cross-multiplied relations in the
//! ambient number field, never interval coincidences.

use std::cmp::Ordering;
use std::sync::Arc;

use log::debug;

use crate::encoding::Encoding;
use crate::error::{AbortSignal, Error, Result, check_abort};
use crate::isometry::{Isometry, isometries_between};
use crate::lamination::{AlgebraicLamination, Lamination, Weight};
use crate::numberfield::NumberFieldElement;
use crate::triangulation::Triangulation;

/// Hard cap on the number of flips before the search is abandoned.
const MAX_SPLITS: usize = 2000;

/// A closed splitting sequence: the preperiodic prefix, the periodic
/// part, and every isometry closing the period onto itself.
#[derive(Debug, Clone)]
pub struct SplittingSequence {
    /// Edge indices flipped before the periodic part starts.
    pub preperiodic_flips: Vec<usize>,
    /// Edge indices flipped along one period.
    pub periodic_flips: Vec<usize>,
    /// The triangulation the periodic part starts (and, after the
    /// closing isometry, ends) on.
    pub periodic_triangulation: Arc<Triangulation>,
    /// The rescaled invariant lamination on that triangulation.
    pub periodic_lamination: AlgebraicLamination,
    /// The dilatation, verified against the weight contraction.
    pub dilatation: NumberFieldElement,
    /// All isometries closing the period, in deterministic order.
    pub closing_isometries: Vec<Isometry>,
}

/// Whether `candidate` carries `reference` to a positive multiple of
/// itself, by exact cross-multiplication in the field.
fn projectively_equal(
    mapped: &[NumberFieldElement],
    reference: &[NumberFieldElement],
) -> bool {
    let total_mapped = sum(mapped);
    let total_reference = sum(reference);
    mapped.iter().zip(reference.iter()).all(|(m, r)| {
        (&(m * &total_reference) - &(r * &total_mapped)).is_zero()
    })
}

fn sum(vector: &[NumberFieldElement]) -> NumberFieldElement {
    let mut total = vector[0].zero_like();
    for x in vector {
        total = &total + x;
    }
    total
}

/// Compute the splitting sequence of an invariant lamination with the
/// given dilatation.
///
/// Fails with [`Error::Computation`] if the sequence does not close
/// within the iteration budget and with [`Error::Assumption`] if the
/// lamination degenerates (no flippable edge carries the maximal
/// weight), which happens when the input is not filling.
pub fn splitting_sequence(
    lamination: &AlgebraicLamination,
    dilatation: &NumberFieldElement,
    abort: Option<AbortSignal<'_>>,
) -> Result<SplittingSequence> {
    // A lamination that misses an edge does not fill the surface: it is
    // carried by a proper subsurface, which is exactly the reducible
    // situation, and the maximal split could close up there.
    for weight in lamination.geometric() {
        if weight.sign()? != Ordering::Greater {
            return Err(Error::assumption(
                "invariant lamination is not filling: an edge carries no weight",
            ));
        }
    }

    let mut history: Vec<(Arc<Triangulation>, Vec<NumberFieldElement>)> = vec![(
        Arc::clone(lamination.triangulation()),
        lamination.geometric().to_vec(),
    )];
    let mut flips: Vec<usize> = Vec::new();
    let mut current = lamination.clone();

    for _ in 0..MAX_SPLITS {
        check_abort(abort, "splitting_sequence")?;
        let edge = max_flippable_edge(&current)?;
        let flip = Encoding::from_flip(Arc::clone(current.triangulation()), edge);
        current = flip.apply(&current)?;
        flips.push(edge);
        debug!("split edge {} ({} flips so far)", edge, flips.len());

        for (j, (earlier_triangulation, earlier_weights)) in history.iter().enumerate() {
            let mut closers: Vec<Isometry> = Vec::new();
            for isometry in isometries_between(current.triangulation(), earlier_triangulation)
            {
                let mapped = isometry.push_forward(current.geometric());
                if !projectively_equal(&mapped, earlier_weights) {
                    continue;
                }
                // The weights contract by the dilatation over a period.
                let contracted = &sum(&mapped) * dilatation;
                if !(&contracted - &sum(earlier_weights)).is_zero() {
                    continue;
                }
                closers.push(isometry);
            }
            if !closers.is_empty() {
                let periodic_lamination = Lamination::new_unchecked(
                    Arc::clone(earlier_triangulation),
                    earlier_weights.clone(),
                );
                return Ok(SplittingSequence {
                    preperiodic_flips: flips[..j].to_vec(),
                    periodic_flips: flips[j..].to_vec(),
                    periodic_triangulation: Arc::clone(earlier_triangulation),
                    periodic_lamination,
                    dilatation: dilatation.clone(),
                    closing_isometries: closers,
                });
            }
        }
        history.push((Arc::clone(current.triangulation()), current.geometric().to_vec()));
    }
    Err(Error::computation("splitting sequence did not close"))
}

/// The flippable edge of maximal weight, ties broken by lowest index.
fn max_flippable_edge(lamination: &AlgebraicLamination) -> Result<usize> {
    let triangulation = lamination.triangulation();
    let mut best: Option<usize> = None;
    for edge in 0..triangulation.zeta() {
        if !triangulation.is_flippable(edge) {
            continue;
        }
        let better = match best {
            Some(current) => {
                lamination.weight_on(edge).sub(lamination.weight_on(current)).sign()?
                    == Ordering::Greater
            }
            None => true,
        };
        if better {
            best = Some(edge);
        }
    }
    best.ok_or_else(|| Error::assumption("no flippable edge: lamination is not filling"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariant::{PureOracle, invariant_lamination};
    use crate::lamination::IntegerLamination;

    fn once_punctured_torus() -> Arc<Triangulation> {
        Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]])
    }

    fn ab_word() -> Encoding {
        let t = once_punctured_torus();
        let a = IntegerLamination::from_weights(&t, &[1, 1, 0]).expect("curve");
        let b = IntegerLamination::from_weights(&t, &[0, 1, 1]).expect("curve");
        a.encode_twist(1)
            .expect("twist a")
            .compose(&b.encode_twist(-1).expect("twist B"))
    }

    #[test]
    fn test_splitting_sequence_closes() {
        let word = ab_word();
        let invariant = invariant_lamination(&word, &PureOracle, None).expect("pseudo-Anosov");
        let splitting =
            splitting_sequence(&invariant.lamination, &invariant.dilatation, None)
                .expect("closes");
        assert!(!splitting.periodic_flips.is_empty());
        assert!(!splitting.closing_isometries.is_empty());
        // Replaying the periodic flips lands on a triangulation
        // isometric to the periodic one.
        let mut triangulation = Arc::clone(&splitting.periodic_triangulation);
        for &edge in &splitting.periodic_flips {
            triangulation = triangulation.flip_edge(edge);
        }
        let closer = &splitting.closing_isometries[0];
        assert_eq!(**closer.source(), *triangulation);
        assert_eq!(**closer.target(), *splitting.periodic_triangulation);
    }

    #[test]
    fn test_splitting_respects_abort() {
        let word = ab_word();
        let invariant = invariant_lamination(&word, &PureOracle, None).expect("pseudo-Anosov");
        let abort = || true;
        let result =
            splitting_sequence(&invariant.lamination, &invariant.dilatation, Some(&abort));
        assert!(matches!(result, Err(Error::Abort(_))));
    }
}
