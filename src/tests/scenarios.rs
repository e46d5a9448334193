//! End-to-end classification scenarios on the standard surfaces.

use num_bigint::BigInt;

use crate::invariant::PureOracle;
use crate::polynomial::Polynomial;
use crate::{
    AlgebraicApproximation, Error, NielsenThurstonType, Triangulation3, bundle,
    nielsen_thurston_type, s_0_4, s_1_1, s_1_2,
};

#[test]
fn scenario_ab_is_pseudo_anosov_with_golden_dilatation() {
    // On S_{1,1} the word aB is pseudo-Anosov with dilatation
    // (3 + sqrt 5) / 2, the largest root of x^2 - 3x + 1.
    let surface = s_1_1();
    let kind = nielsen_thurston_type(&surface, "aB").expect("classification");
    let invariant = match kind {
        NielsenThurstonType::PseudoAnosov(invariant) => invariant,
        other => panic!("expected pseudo-Anosov, got {}", other),
    };
    assert_eq!(invariant.field.polynomial(), &Polynomial::from_coeffs(&[1, -3, 1]));

    // The eigen identity holds exactly in the field: applying the word
    // scales every weight by the dilatation.
    let word = surface.mapping_class("aB").expect("word");
    let image = word.apply(&invariant.lamination).expect("apply");
    for (weight, image_weight) in
        invariant.lamination.geometric().iter().zip(image.geometric().iter())
    {
        assert_eq!(&(weight * &invariant.dilatation), image_weight);
    }
}

#[test]
fn scenario_single_twist_is_reducible() {
    let surface = s_1_1();
    let kind = nielsen_thurston_type(&surface, "a").expect("classification");
    assert!(matches!(kind, NielsenThurstonType::Reducible));
}

#[test]
fn scenario_aa_inverse_has_order_one() {
    let surface = s_1_1();
    let kind = nielsen_thurston_type(&surface, "aA").expect("classification");
    assert!(matches!(kind, NielsenThurstonType::Periodic(1)));
}

#[test]
fn scenario_torus_twist_relations() {
    // In the mapping class group of the once-punctured torus the twist
    // generators satisfy the braid relation and (ab)^6 acts trivially.
    let surface = s_1_1();
    let aba = surface.mapping_class("aba").expect("word");
    let bab = surface.mapping_class("bab").expect("word");
    assert_eq!(aba, bab);
    assert_eq!(surface.mapping_class("ab").expect("word").order(), 6);
}

fn check_closed_bundle(manifold: &mut Triangulation3, expected_tetrahedra: usize) {
    assert!(manifold.is_closed());
    assert_eq!(manifold.len(), expected_tetrahedra);
    for &key in manifold.keys().to_vec().iter() {
        let tet = manifold.tetrahedron(key);
        for side in 0..4 {
            let (_, permutation) = tet.glued_to(side).expect("closed");
            assert!(!permutation.is_even(), "gluing permutations must be odd");
        }
        // Peripheral curves enter and leave each corner in balance.
        for side in 0..4 {
            let meridian: i64 = tet.meridians()[side].iter().sum();
            let longitude: i64 = tet.longitudes()[side].iter().sum();
            assert_eq!(meridian, 0, "meridian does not close up");
            assert_eq!(longitude, 0, "longitude does not close up");
        }
        // Every edge of a closed veering bundle carries a veer.
        for a in 0..4 {
            for b in a + 1..4 {
                assert!(tet.edge_label(a, b).is_some(), "edge {}{} has no veer", a, b);
            }
        }
    }
    let text = manifold.snappy_string().expect("closed manifold prints");
    assert!(text.starts_with("% Triangulation\nFlipper_triangulation\n"));
    assert!(text.contains("oriented_manifold"));
    assert!(text.contains("CS_unknown"));
    assert!(text.contains("torus   0.000000000000"));
}

#[test]
fn scenario_ab_bundles_are_the_two_census_sisters() {
    // The layered bundle of aB on S_{1,1} closes in exactly two ways;
    // the two closures are the two two-tetrahedron census manifolds.
    let surface = s_1_1();
    let mut first = bundle(&surface, "aB", 0).expect("first closure");
    let mut second = bundle(&surface, "aB", 1).expect("second closure");
    check_closed_bundle(&mut first, 2);
    check_closed_bundle(&mut second, 2);
    // The closures differ as labelled triangulations.
    assert_ne!(
        first.snappy_string().expect("prints"),
        second.snappy_string().expect("prints")
    );
    // And there is no third closure.
    assert!(matches!(bundle(&surface, "aB", 2), Err(Error::Assumption(_))));
}

#[test]
fn scenario_twice_punctured_torus_word_is_pseudo_anosov() {
    // acB is a Penner word on S_{1,2}: positive twists about the two
    // disjoint horizontal curves, a negative twist about the vertical
    // one, and the three curves fill.
    let surface = s_1_2();
    let kind = nielsen_thurston_type(&surface, "acB").expect("classification");
    let invariant = match kind {
        NielsenThurstonType::PseudoAnosov(invariant) => invariant,
        other => panic!("expected pseudo-Anosov, got {}", other),
    };
    // The dilatation exceeds one.
    let one = invariant.field.one();
    assert_eq!(
        (&invariant.dilatation - &one).sign().expect("sign"),
        std::cmp::Ordering::Greater
    );
}

#[test]
fn scenario_twice_punctured_torus_bundle_is_well_formed() {
    let surface = s_1_2();
    let mut manifold = bundle(&surface, "acB", 0).expect("bundle");
    let count = manifold.len();
    assert!(count >= 2);
    check_closed_bundle(&mut manifold, count);
}

#[test]
fn scenario_ab_on_twice_punctured_torus_is_reducible() {
    // a and b fill only the torus part; the boundary of the
    // twice-punctured disk they miss is preserved.
    let surface = s_1_2();
    let kind = nielsen_thurston_type(&surface, "aB").expect("classification");
    assert!(matches!(kind, NielsenThurstonType::Reducible));
}

#[test]
fn scenario_pants_boundary_on_twice_punctured_torus() {
    let surface = s_1_2();
    let p = surface.lamination("p").expect("named curve");
    assert!(p.is_curve());
    assert!(p.is_pants_boundary());
    // The torus curves bound no pants.
    assert!(!surface.lamination("a").expect("named curve").is_pants_boundary());
}

#[test]
fn scenario_isolating_curve_refuses_twists() {
    // The pants boundary on S_{1,2} isolates the unpunctured torus
    // side, so no ideal triangulation meets it twice and neither twist
    // is constructible along it.
    let surface = s_1_2();
    let p = surface.lamination("p").expect("named curve");
    assert!(p.is_isolating());
    assert!(matches!(p.encode_twist(1), Err(Error::Assumption(_))));
    assert!(matches!(p.encode_halftwist(1), Err(Error::Assumption(_))));
}

#[test]
fn scenario_halftwist_squares_to_the_twist() {
    // On the four-times-punctured sphere the half twist swapping two
    // punctures squares to the full twist about the curve around them.
    let surface = s_0_4();
    let half = surface.mapping_class("h").expect("half twist");
    let full = surface.mapping_class("t").expect("twist");
    assert_eq!(half.compose(&half), full);
    assert_eq!(surface.mapping_class("hh").expect("word"), full);
    // Half twists have infinite order.
    assert_eq!(half.order(), 0);
}

#[test]
fn scenario_halftwist_needs_a_pants_boundary() {
    let surface = s_1_1();
    let a = surface.lamination("a").expect("named curve");
    assert!(matches!(a.encode_halftwist(1), Err(Error::Assumption(_))));
}

#[test]
fn scenario_sqrt_two_squares_exactly() {
    // The leading root x of x^2 - 2 satisfies x * x = 2 exactly.
    let polynomial = Polynomial::from_coeffs(&[-2, 0, 1]);
    let approximation =
        polynomial.algebraic_approximate_leading_root(30, 1).expect("leading root");
    let square = (&approximation * &approximation).expect("product");
    let two = AlgebraicApproximation::from_integer(&BigInt::from(2), 40);
    assert!((&square - &two).expect("difference").is_zero());
}

#[test]
fn scenario_abort_propagates_through_classification() {
    let surface = s_1_1();
    let abort = || true;
    let result = surface.nielsen_thurston_type("aB", &PureOracle, Some(&abort));
    assert!(matches!(result, Err(Error::Abort(_))));
}
