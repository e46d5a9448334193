//! Number fields and their elements
//!
//! A [`NumberField`] is `Q(lambda)` for a fixed real root `lambda` of a
//! monic irreducible integer polynomial. Elements are integer linear
//! combinations of `1, lambda, ..., lambda^(d-1)`, so strictly speaking
//! this manipulates `Z[lambda]`; every value the engine produces
//! (eigenvector entries, weights, dilatations) lives there.
//!
//! Multiplication never leaves the ring: the left operand is expanded
//! into a sum of cached companion-matrix powers and applied to the right
//! operand's coordinate vector. Division escapes to the
//! [`AlgebraicApproximation`] layer at tripled accuracy, exactly like
//! sign decisions and comparisons.
//!
//! The only mutable state is the per-field cache of approximations of
//! the generator powers; its accuracy is monotonic, so sharing a field
//! behind an [`Arc`] is safe.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::{Arc, RwLock};

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::algebraic::AlgebraicApproximation;
use crate::error::{Error, Result};
use crate::interval::log_plus;
use crate::matrix::{Entry, Matrix};
use crate::polynomial::{Polynomial, PolynomialRoot};

/// How many times a failed approximation is retried at doubled accuracy
/// before the failure propagates.
const SIGN_RETRIES: u32 = 6;

struct PowerCache {
    root: PolynomialRoot,
    accuracy: i64,
    powers: Vec<AlgebraicApproximation>,
}

/// The field `Q(lambda)` for a fixed monic irreducible `lambda`.
pub struct NumberField {
    polynomial: Polynomial,
    degree: usize,
    companion_powers: Vec<Matrix<BigInt>>,
    sum_log_height_powers: f64,
    cache: RwLock<PowerCache>,
}

impl NumberField {
    /// Build the field generated by an isolated polynomial root.
    ///
    /// The root's minimal polynomial must be monic (the generator is an
    /// algebraic integer); anything else is an [`Error::Assumption`].
    pub fn new(root: PolynomialRoot) -> Result<Arc<Self>> {
        let polynomial = root.polynomial().clone();
        if !polynomial.is_monic() {
            return Err(Error::assumption(format!(
                "field generator must be an algebraic integer; {} is not monic",
                polynomial
            )));
        }
        let degree = polynomial.degree() as usize;
        let companion = companion_matrix(&polynomial);
        let mut companion_powers = Vec::with_capacity(degree);
        let mut power = Matrix::identity(degree);
        for _ in 0..degree {
            companion_powers.push(power.clone());
            power = companion.compose(&power);
        }
        let sum_log_height_powers = (degree * degree) as f64 * polynomial.log_height() as f64;
        let field = NumberField {
            polynomial,
            degree,
            companion_powers,
            sum_log_height_powers,
            cache: RwLock::new(PowerCache { root, accuracy: -1, powers: Vec::new() }),
        };
        field.increase_accuracy(100)?;
        Ok(Arc::new(field))
    }

    /// The rational field, generated by the root of `x - 1`.
    pub fn rationals() -> Arc<Self> {
        let roots = Polynomial::from_coeffs(&[-1, 1])
            .real_roots()
            .expect("x - 1 has a real root");
        NumberField::new(roots.into_iter().next().expect("one root"))
            .expect("x - 1 is monic")
    }

    /// The minimal polynomial of the generator.
    pub fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    /// Degree of the field over Q.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Whether this is Q itself.
    pub fn is_rationals(&self) -> bool {
        self.degree == 1
    }

    /// Grow the cached generator-power approximations to at least the
    /// requested accuracy. Growing is amortised by working to twice what
    /// was asked for; accuracy never shrinks.
    pub fn increase_accuracy(&self, accuracy: i64) -> Result<()> {
        let mut cache = self.cache.write().expect("number field cache poisoned");
        if cache.accuracy >= accuracy {
            return Ok(());
        }
        let target = 2 * accuracy.max(1);
        let mut powers = Vec::with_capacity(self.degree);
        for index in 0..self.degree {
            powers.push(cache.root.algebraic_approximation_of_power(target, index as u32)?);
        }
        cache.accuracy = target;
        cache.powers = powers;
        Ok(())
    }

    fn generator_powers(&self, accuracy: i64) -> Result<Vec<AlgebraicApproximation>> {
        self.increase_accuracy(accuracy)?;
        let cache = self.cache.read().expect("number field cache poisoned");
        Ok(cache.powers.clone())
    }

    /// The element with the given coordinates, padded with zeros.
    ///
    /// # Panics
    /// Panics if more than `degree` coordinates are supplied.
    pub fn element(self: &Arc<Self>, mut coefficients: Vec<BigInt>) -> NumberFieldElement {
        assert!(
            coefficients.len() <= self.degree,
            "linear combination has more terms than the field degree"
        );
        coefficients.resize(self.degree, BigInt::zero());
        NumberFieldElement { field: Arc::clone(self), coefficients }
    }

    /// The element `n`.
    pub fn from_integer(self: &Arc<Self>, n: BigInt) -> NumberFieldElement {
        self.element(vec![n])
    }

    /// One.
    pub fn one(self: &Arc<Self>) -> NumberFieldElement {
        self.from_integer(BigInt::one())
    }

    /// Zero.
    pub fn zero(self: &Arc<Self>) -> NumberFieldElement {
        self.element(Vec::new())
    }

    /// The generator `lambda` (which is `1` in the rational field).
    pub fn generator(self: &Arc<Self>) -> NumberFieldElement {
        if self.is_rationals() {
            self.one()
        } else {
            self.element(vec![BigInt::zero(), BigInt::one()])
        }
    }

    /// Semantic equality: same minimal polynomial, same root.
    pub fn same_field(self: &Arc<Self>, other: &Arc<Self>) -> bool {
        if Arc::ptr_eq(self, other) {
            return true;
        }
        if self.polynomial != other.polynomial {
            return false;
        }
        let a = self.cache.read().expect("number field cache poisoned");
        let b = other.cache.read().expect("number field cache poisoned");
        a.root.equals(&b.root)
    }
}

impl fmt::Debug for NumberField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QQ[x] / ({})", self.polynomial)
    }
}

impl fmt::Display for NumberField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QQ({})", self.polynomial)
    }
}

/// Multiplication-by-lambda on the basis `1, ..., lambda^(d-1)`.
fn companion_matrix(polynomial: &Polynomial) -> Matrix<BigInt> {
    let d = polynomial.degree() as usize;
    let coefficients = polynomial.coefficients();
    Matrix::new(
        (0..d)
            .map(|i| {
                (0..d)
                    .map(|j| {
                        if j + 1 == d {
                            -coefficients[i].clone()
                        } else if i == j + 1 {
                            BigInt::one()
                        } else {
                            BigInt::zero()
                        }
                    })
                    .collect()
            })
            .collect(),
    )
}

/// An element of a [`NumberField`]: `sum a_i lambda^i` with integer
/// coordinates.
#[derive(Clone)]
pub struct NumberFieldElement {
    field: Arc<NumberField>,
    coefficients: Vec<BigInt>,
}

impl NumberFieldElement {
    /// The field this element lives in.
    pub fn field(&self) -> &Arc<NumberField> {
        &self.field
    }

    /// Coordinates over the generator-power basis.
    pub fn coefficients(&self) -> &[BigInt] {
        &self.coefficients
    }

    fn assert_same_field(&self, other: &NumberFieldElement) {
        assert!(
            self.field.same_field(&other.field),
            "cannot mix elements of different number fields"
        );
    }

    /// Whether this is the zero element. Exact: the generator powers are
    /// a basis, so zero has zero coordinates.
    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(Zero::is_zero)
    }

    /// Multiply by a rational integer.
    pub fn scale(&self, n: &BigInt) -> NumberFieldElement {
        NumberFieldElement {
            field: Arc::clone(&self.field),
            coefficients: self.coefficients.iter().map(|c| c * n).collect(),
        }
    }

    /// Add a rational integer.
    pub fn add_integer(&self, n: &BigInt) -> NumberFieldElement {
        let mut coefficients = self.coefficients.clone();
        coefficients[0] += n;
        NumberFieldElement { field: Arc::clone(&self.field), coefficients }
    }

    /// The accuracy needed before an approximation of this element pins
    /// down a unique algebraic number.
    fn default_accuracy(&self) -> i64 {
        let d = self.field.degree as f64;
        let coefficient_heights: i64 =
            self.coefficients.iter().map(log_plus).sum();
        (coefficient_heights as f64 + self.field.sum_log_height_powers + d.log10() + 2.0 * d)
            .ceil() as i64
    }

    /// A certified approximation, correct to at least `accuracy` places
    /// (or to the element's own uniqueness bound if `None`).
    pub fn algebraic_approximation(
        &self,
        accuracy: Option<i64>,
    ) -> Result<AlgebraicApproximation> {
        let accuracy = accuracy.unwrap_or_else(|| self.default_accuracy()).max(8);
        if self.is_zero() {
            return Ok(AlgebraicApproximation::from_integer(&BigInt::zero(), 2 * accuracy));
        }
        let powers = self.field.generator_powers(accuracy)?;
        let mut total: Option<AlgebraicApproximation> = None;
        for (coefficient, power) in self.coefficients.iter().zip(powers.iter()) {
            if coefficient.is_zero() {
                continue;
            }
            let term = power.scale(coefficient)?;
            total = Some(match total {
                Some(sum) => (&sum + &term)?,
                None => term,
            });
        }
        Ok(total.expect("nonzero element has a nonzero coordinate"))
    }

    /// Certified sign. Zero is decided exactly from the coordinates;
    /// otherwise the approximation is refined, doubling the accuracy on
    /// failure a fixed number of times.
    pub fn sign(&self) -> Result<Ordering> {
        if self.is_zero() {
            return Ok(Ordering::Equal);
        }
        let mut accuracy = self.default_accuracy();
        let mut last_error = None;
        for _ in 0..SIGN_RETRIES {
            match self.algebraic_approximation(Some(accuracy)) {
                Ok(approximation) => {
                    let sign = approximation.sign();
                    if sign != Ordering::Equal {
                        return Ok(sign);
                    }
                }
                Err(error) if error.is_retryable() => last_error = Some(error),
                Err(error) => return Err(error),
            }
            accuracy *= 2;
        }
        Err(last_error.unwrap_or_else(|| {
            Error::approximation("sign of a nonzero field element stayed undecided")
        }))
    }

    /// Whether the element is positive.
    pub fn is_positive(&self) -> Result<bool> {
        Ok(self.sign()? == Ordering::Greater)
    }

    /// Whether the element is negative.
    pub fn is_negative(&self) -> Result<bool> {
        Ok(self.sign()? == Ordering::Less)
    }

    /// Exact comparison.
    pub fn compare(&self, other: &NumberFieldElement) -> Result<Ordering> {
        (self - other).sign()
    }

    /// Division, escaping to the approximation layer at tripled
    /// accuracy. The result is generally not in `Z[lambda]`.
    pub fn try_div(&self, other: &NumberFieldElement) -> Result<AlgebraicApproximation> {
        self.assert_same_field(other);
        if other.is_zero() {
            return Err(Error::approximation("division by zero field element"));
        }
        let accuracy = 3 * self.default_accuracy().max(other.default_accuracy());
        let numerator = self.algebraic_approximation(Some(accuracy))?;
        let denominator = other.algebraic_approximation(Some(accuracy))?;
        numerator.try_div(&denominator)
    }

    /// Exact ring division: the `q` with `q * other == self`, which the
    /// caller asserts exists in `Z[lambda]`.
    ///
    /// # Panics
    /// Panics when the quotient does not exist in the ring; callers
    /// (fraction-free elimination) guarantee it does.
    pub fn exact_div(&self, other: &NumberFieldElement) -> NumberFieldElement {
        self.assert_same_field(other);
        assert!(!other.is_zero(), "exact division by zero field element");
        let m = other.multiplication_matrix();
        let solution = m
            .solve_rational(&self.coefficients)
            .expect("multiplication by a nonzero field element is invertible");
        let coefficients: Vec<BigInt> = solution
            .iter()
            .map(|q| {
                assert!(q.is_integer(), "inexact division in Z[lambda]");
                q.to_integer()
            })
            .collect();
        NumberFieldElement { field: Arc::clone(&self.field), coefficients }
    }

    /// The matrix of multiplication by this element on the generator
    /// basis.
    fn multiplication_matrix(&self) -> Matrix<BigInt> {
        let d = self.field.degree;
        let mut total = Matrix::zero(d, d);
        for (coefficient, power) in
            self.coefficients.iter().zip(self.field.companion_powers.iter())
        {
            if coefficient.is_zero() {
                continue;
            }
            let scaled = Matrix::new(
                power.rows().iter().map(|row| row.iter().map(|v| v * coefficient).collect()).collect(),
            );
            total = total.add(&scaled);
        }
        total
    }
}

impl PartialEq for NumberFieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.field.same_field(&other.field) && self.coefficients == other.coefficients
    }
}

impl Eq for NumberFieldElement {}

impl fmt::Debug for NumberFieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.coefficients)
    }
}

impl fmt::Display for NumberFieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(index, coefficient)| match index {
                0 => format!("{}", coefficient),
                1 => format!("{} L", coefficient),
                _ => format!("{} L^{}", coefficient, index),
            })
            .collect();
        if terms.is_empty() { write!(f, "0") } else { write!(f, "{}", terms.join(" + ")) }
    }
}

impl Neg for &NumberFieldElement {
    type Output = NumberFieldElement;

    fn neg(self) -> NumberFieldElement {
        NumberFieldElement {
            field: Arc::clone(&self.field),
            coefficients: self.coefficients.iter().map(|c| -c).collect(),
        }
    }
}

impl Add for &NumberFieldElement {
    type Output = NumberFieldElement;

    fn add(self, other: &NumberFieldElement) -> NumberFieldElement {
        self.assert_same_field(other);
        NumberFieldElement {
            field: Arc::clone(&self.field),
            coefficients: self
                .coefficients
                .iter()
                .zip(other.coefficients.iter())
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

impl Sub for &NumberFieldElement {
    type Output = NumberFieldElement;

    fn sub(self, other: &NumberFieldElement) -> NumberFieldElement {
        self + &(-other)
    }
}

impl Mul for &NumberFieldElement {
    type Output = NumberFieldElement;

    fn mul(self, other: &NumberFieldElement) -> NumberFieldElement {
        self.assert_same_field(other);
        let m = self.multiplication_matrix();
        NumberFieldElement {
            field: Arc::clone(&self.field),
            coefficients: m.apply(&other.coefficients),
        }
    }
}

impl Entry for NumberFieldElement {
    fn is_zero_entry(&self) -> bool {
        self.is_zero()
    }

    fn add_entry(&self, other: &Self) -> Self {
        self + other
    }

    fn sub_entry(&self, other: &Self) -> Self {
        self - other
    }

    fn mul_entry(&self, other: &Self) -> Self {
        self * other
    }

    fn neg_entry(&self) -> Self {
        -self
    }

    fn exact_div_entry(&self, other: &Self) -> Self {
        self.exact_div(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Q(phi^2) where phi^2 is the largest root of x^2 - 3x + 1.
    fn golden_field() -> Arc<NumberField> {
        let roots = Polynomial::from_coeffs(&[1, -3, 1]).real_roots().expect("roots");
        NumberField::new(roots.into_iter().next().expect("leading root")).expect("monic")
    }

    #[test]
    fn test_generator_satisfies_polynomial() {
        let field = golden_field();
        let lambda = field.generator();
        // lambda^2 - 3 lambda + 1 == 0.
        let square = &lambda * &lambda;
        let rest = &square - &lambda.scale(&BigInt::from(3));
        let value = rest.add_integer(&BigInt::one());
        assert!(value.is_zero());
    }

    #[test]
    fn test_sign_of_generator() {
        let field = golden_field();
        let lambda = field.generator();
        // The leading root 2.618... exceeds 2 but not 3.
        assert_eq!(lambda.sign().expect("sign"), Ordering::Greater);
        let above = lambda.add_integer(&BigInt::from(-3));
        assert_eq!(above.sign().expect("sign"), Ordering::Less);
        let below = lambda.add_integer(&BigInt::from(-2));
        assert_eq!(below.sign().expect("sign"), Ordering::Greater);
    }

    #[test]
    fn test_product_against_approximation() {
        let field = golden_field();
        let lambda = field.generator();
        let x = lambda.add_integer(&BigInt::from(2)); // lambda + 2
        let product = &x * &lambda;
        // (lambda + 2) lambda = lambda^2 + 2 lambda = 5 lambda - 1.
        assert_eq!(product, field.element(vec![BigInt::from(-1), BigInt::from(5)]));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let field = golden_field();
        let lambda = field.generator();
        // lambda (3 - lambda) = 3 lambda - lambda^2 = -1 + 3 lambda - ... ;
        // lambda^2 = 3 lambda - 1 so lambda (3 - lambda) = 1.
        let other = (&field.from_integer(BigInt::from(3))) - &lambda;
        let product = &lambda * &other;
        assert_eq!(product, field.one());
        // And the approximation layer agrees: lambda / lambda == 1.
        let quotient = lambda.try_div(&lambda).expect("division");
        let one = AlgebraicApproximation::from_integer(&BigInt::one(), 20);
        assert!((&quotient - &one).expect("difference").is_zero());
    }

    #[test]
    fn test_exact_div() {
        let field = golden_field();
        let lambda = field.generator();
        let x = lambda.scale(&BigInt::from(2)).add_integer(&BigInt::from(5));
        let product = &x * &lambda;
        assert_eq!(product.exact_div(&lambda), x);
        assert_eq!(product.exact_div(&x), lambda);
    }

    #[test]
    fn test_rationals() {
        let field = NumberField::rationals();
        assert!(field.is_rationals());
        let two = field.from_integer(BigInt::from(2));
        let four = &two * &two;
        assert_eq!(four, field.from_integer(BigInt::from(4)));
        assert_eq!(field.generator(), field.one());
    }

    #[test]
    fn test_non_monic_rejected() {
        // 2x^2 - 1 is irreducible but not monic.
        let roots = Polynomial::from_coeffs(&[-1, 0, 2]).real_roots().expect("roots");
        let leading = roots.into_iter().next().expect("root");
        assert!(matches!(NumberField::new(leading), Err(Error::Assumption(_))));
    }

    #[test]
    fn test_mixed_fields_panic() {
        let a = golden_field();
        let b = NumberField::rationals();
        let x = a.one();
        let y = b.one();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| &x + &y));
        assert!(result.is_err());
    }
}
