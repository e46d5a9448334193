#![forbid(unsafe_code)]
//! Certified Nielsen-Thurston classification
//!
//! An exact engine for deciding whether a mapping class of a punctured
//! surface is periodic, reducible or pseudo-Anosov, and for building the
//! layered veering triangulation of the mapping torus in the
//! pseudo-Anosov case.
//!
//! # Features
//! - Interval arithmetic over decimal rationals with tracked accuracy
//! - Algebraic numbers certified by degree and height bounds
//! - Number-field arithmetic through companion matrices
//! - Piecewise-linear actions of flips and twists on weight vectors
//! - Splitting sequences closed by exact projective identities
//! - Veering tetrahedra with cusps and peripheral curves, printable in
//!   SnapPy's text format
//!
//! Nothing is ever decided from a floating-point value: every
//! classification answer is backed by an identity in a number field.
//!
//! # Usage Examples
//!
//! ```
//! use anosov::{NielsenThurstonType, nielsen_thurston_type, s_1_1};
//!
//! let surface = s_1_1();
//! let kind = nielsen_thurston_type(&surface, "aB").unwrap();
//! assert!(matches!(kind, NielsenThurstonType::PseudoAnosov(_)));
//! ```
//!
//! ```
//! use anosov::s_1_1;
//!
//! let surface = s_1_1();
//! // The twist relation (ab)^6 = 1 holds in the mapping class group of
//! // the once-punctured torus.
//! let ab = surface.mapping_class("ab").unwrap();
//! assert_eq!(ab.order(), 6);
//! ```

mod algebraic; // Certified approximations of algebraic numbers
mod encoding; // Piecewise-linear maps and action matrices
mod equipped; // Named laminations, mapping classes, the text format
mod error; // The four recoverable error kinds
mod interval; // Decimal-rational interval arithmetic
mod invariant; // Directed eigenvectors and the invariant-lamination driver
mod isometry; // Combinatorial isomorphisms of triangulations
mod lamination; // Weight vectors, predicates, twist construction
mod layered; // Layered veering triangulations of mapping tori
mod matrix; // Dense exact matrices over Z and over number fields
mod numberfield; // Q(lambda) and its elements
mod permutation; // Permutations, including the tetrahedral Perm4
mod polynomial; // Integer polynomials and isolated real roots
mod splitting; // Maximal-weight splitting sequences
mod triangulation; // Ideal triangulations of punctured surfaces

#[cfg(test)]
mod tests;

// Re-export the arithmetic stack.
pub use algebraic::AlgebraicApproximation;
pub use error::{AbortSignal, Error, Result};
pub use interval::Interval;
pub use matrix::{Entry, Matrix};
pub use numberfield::{NumberField, NumberFieldElement};
pub use polynomial::{Polynomial, PolynomialRoot};

// Re-export the surface calculus.
pub use encoding::Encoding;
pub use isometry::{Isometry, is_isomorphic, isometries_between};
pub use lamination::{AlgebraicLamination, IntegerLamination, Lamination, Weight};
pub use permutation::{Perm4, Permutation};
pub use triangulation::{Triangulation, norm, reverse};

// Re-export the classification drivers and the 3D layer.
pub use equipped::{
    EquippedTriangulation, NielsenThurstonType, parse_surface, s_0_4, s_1_1, s_1_2,
};
pub use invariant::{
    EigenvectorOracle, InvariantLamination, PureOracle, directed_eigenvector,
    invariant_lamination, triangle_inequality_matrix,
};
pub use layered::{LayeredTriangulation, TetKey, Tetrahedron, Triangulation3, Veering};
pub use splitting::{SplittingSequence, splitting_sequence};

/// Classify a word over the surface's named mapping classes with the
/// built-in oracle and no cancellation.
///
/// # Example
/// ```
/// use anosov::{NielsenThurstonType, nielsen_thurston_type, s_1_1};
/// let surface = s_1_1();
/// let kind = nielsen_thurston_type(&surface, "a").unwrap();
/// assert!(matches!(kind, NielsenThurstonType::Reducible));
/// ```
pub fn nielsen_thurston_type(
    surface: &EquippedTriangulation,
    word: &str,
) -> Result<NielsenThurstonType> {
    surface.nielsen_thurston_type(word, &PureOracle, None)
}

/// Build the veering triangulation of the mapping torus of a
/// pseudo-Anosov word, closed with the chosen closing isometry, with
/// the built-in oracle and no cancellation.
pub fn bundle(
    surface: &EquippedTriangulation,
    word: &str,
    isometry_index: usize,
) -> Result<Triangulation3> {
    surface.bundle(word, isometry_index, &PureOracle, None)
}
