//! Property tests for the quantified invariants of the arithmetic and
//! piecewise-linear layers.

use num_bigint::BigInt;
use quickcheck::{QuickCheck, TestResult};

use crate::{Encoding, Interval, IntegerLamination, Triangulation, isometries_between, s_1_1};
use std::sync::Arc;

fn interval_from(parts: (i32, u8, u8)) -> Option<Interval> {
    let (value, width, precision) = parts;
    let width = i64::from(width % 40) + 1;
    let precision = i64::from(precision % 6) + 1;
    let lower = BigInt::from(value);
    Interval::new(lower.clone(), lower + width, precision).ok()
}

#[test]
fn prop_interval_sum_contains_and_tracks_accuracy() {
    fn property(a: (i32, u8, u8), b: (i32, u8, u8)) -> TestResult {
        let (Some(i), Some(j)) = (interval_from(a), interval_from(b)) else {
            return TestResult::discard();
        };
        let sum = &i + &j;
        let m = i.accuracy().min(j.accuracy());
        if sum.accuracy() < m - 1 {
            return TestResult::error("accuracy bound violated");
        }
        if !sum.contains_rational(&(i.midpoint() + j.midpoint())) {
            return TestResult::error("sum does not contain the true value");
        }
        TestResult::passed()
    }
    QuickCheck::new().tests(300).quickcheck(
        property as fn((i32, u8, u8), (i32, u8, u8)) -> TestResult,
    );
}

#[test]
fn prop_interval_product_contains_true_value() {
    fn property(a: (i32, u8, u8), b: (i32, u8, u8)) -> TestResult {
        let (Some(i), Some(j)) = (interval_from(a), interval_from(b)) else {
            return TestResult::discard();
        };
        let product = &i * &j;
        if !product.contains_rational(&(i.midpoint() * j.midpoint())) {
            return TestResult::error("product does not contain the true value");
        }
        TestResult::passed()
    }
    QuickCheck::new().tests(300).quickcheck(
        property as fn((i32, u8, u8), (i32, u8, u8)) -> TestResult,
    );
}

#[test]
fn prop_interval_difference_of_self_straddles_zero() {
    fn property(a: (i32, u8, u8)) -> TestResult {
        let Some(i) = interval_from(a) else {
            return TestResult::discard();
        };
        let difference = &i - &i;
        if difference.sign() != std::cmp::Ordering::Equal {
            return TestResult::error("x - x must straddle zero");
        }
        TestResult::passed()
    }
    QuickCheck::new().tests(300).quickcheck(property as fn((i32, u8, u8)) -> TestResult);
}

fn torus() -> Arc<Triangulation> {
    Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]])
}

fn torus_lamination(weights: (u8, u8, u8)) -> Option<IntegerLamination> {
    let (x, y, z) = (i64::from(weights.0 % 8), i64::from(weights.1 % 8), i64::from(weights.2 % 8));
    IntegerLamination::from_weights(&torus(), &[x, y, z]).ok()
}

#[test]
fn prop_flip_is_an_involution_up_to_edge_identity() {
    fn property(edge: u8, weights: (u8, u8, u8)) -> TestResult {
        let edge = usize::from(edge % 3);
        let Some(lamination) = torus_lamination(weights) else {
            return TestResult::discard();
        };
        let t = torus();
        let there = Encoding::from_flip(Arc::clone(&t), edge);
        let back = there.inverse().compose(&there);
        let restored = back.apply(&lamination).expect("integer weights");
        if restored.geometric() != lamination.geometric() {
            return TestResult::error("double flip changed the weights");
        }
        // Flipping twice in the flipped triangulation returns a
        // triangulation isomorphic to the original by an isometry
        // fixing every edge index.
        let double = there.target().flip_edge(edge);
        let identity_like = isometries_between(&double, &t)
            .into_iter()
            .any(|iso| iso.is_edge_identity());
        if !identity_like {
            return TestResult::error("double flip lost the edge labelling");
        }
        TestResult::passed()
    }
    QuickCheck::new().tests(100).quickcheck(property as fn(u8, (u8, u8, u8)) -> TestResult);
}

#[test]
fn prop_action_matrix_agrees_with_application() {
    fn property(word_bits: Vec<bool>, weights: (u8, u8, u8)) -> TestResult {
        if word_bits.is_empty() || word_bits.len() > 6 {
            return TestResult::discard();
        }
        let Some(lamination) = torus_lamination(weights) else {
            return TestResult::discard();
        };
        let surface = s_1_1();
        let word: String =
            word_bits.iter().map(|&bit| if bit { 'a' } else { 'b' }).collect();
        let encoding = surface.mapping_class(&word).expect("word over generators");
        // The lamination lives on the same triangulation by
        // construction.
        let direct = encoding.apply(&lamination).expect("integer weights");
        let (action, condition) =
            encoding.applied_matrices(&lamination).expect("integer weights");
        if action.apply(lamination.geometric()) != direct.geometric() {
            return TestResult::error("action matrix disagrees with application");
        }
        if !condition.nonnegative_image(lamination.geometric()) {
            return TestResult::error("lamination escapes its own cell");
        }
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(60)
        .quickcheck(property as fn(Vec<bool>, (u8, u8, u8)) -> TestResult);
}

#[test]
fn prop_key_curves_are_valid_laminations() {
    for triangulation in [torus(), crate::s_1_2().triangulation().clone()] {
        for vector in triangulation.key_curve_vectors() {
            let weights: Vec<i64> = vector
                .iter()
                .map(|w| i64::try_from(w).expect("small weights"))
                .collect();
            assert!(
                IntegerLamination::from_weights(&triangulation, &weights).is_ok(),
                "key curve is not a lamination"
            );
        }
    }
}
