//! Integer polynomials and certified real roots
//!
//! This module defines:
//! - [`Polynomial`] - dense integer polynomials, constant term first
//! - [`PolynomialRoot`] - an isolated real root of an irreducible factor
//!
//! Root finding is exact: the leading real root is located by Newton
//! iteration started at the Cauchy bound, all real roots are isolated by
//! Sturm chains, and every returned root is canonicalised by the
//! irreducible factor over Q that it satisfies.

mod factor;

pub(crate) use factor::irreducible_factors;

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::algebraic::AlgebraicApproximation;
use crate::error::{Error, Result};
use crate::interval::{Interval, log_plus, ten_pow};

/// Retry head-room used whenever an accuracy target has to be guessed
/// before the arithmetic that needs it has been done.
const ACCURACY_SLACK: i64 = 10;

/// A dense integer polynomial; `coefficients[i]` multiplies `x^i`.
///
/// The zero polynomial has no coefficients. All other polynomials keep
/// a nonzero leading coefficient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Polynomial {
    coefficients: Vec<BigInt>,
}

impl Polynomial {
    /// Build a polynomial, trimming leading zeros.
    pub fn new(mut coefficients: Vec<BigInt>) -> Self {
        while coefficients.last().is_some_and(Zero::is_zero) {
            coefficients.pop();
        }
        Polynomial { coefficients }
    }

    /// Convenience constructor from machine integers.
    pub fn from_coeffs(coefficients: &[i64]) -> Self {
        Polynomial::new(coefficients.iter().map(|&c| BigInt::from(c)).collect())
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        Polynomial { coefficients: Vec::new() }
    }

    /// Coefficients, constant term first.
    pub fn coefficients(&self) -> &[BigInt] {
        &self.coefficients
    }

    /// Degree; the zero polynomial has degree `-1`.
    pub fn degree(&self) -> i64 {
        self.coefficients.len() as i64 - 1
    }

    /// Whether this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Leading coefficient.
    ///
    /// # Panics
    /// Panics on the zero polynomial.
    pub fn leading_coefficient(&self) -> &BigInt {
        self.coefficients.last().expect("leading coefficient of zero polynomial")
    }

    /// Whether the leading coefficient is one.
    pub fn is_monic(&self) -> bool {
        self.coefficients.last().is_some_and(One::is_one)
    }

    /// `max |a_i|`, at least one.
    pub fn height(&self) -> BigInt {
        self.coefficients
            .iter()
            .map(Signed::abs)
            .max()
            .unwrap_or_else(BigInt::one)
            .max(BigInt::one())
    }

    /// An upper bound for `log10(height)`.
    pub fn log_height(&self) -> i64 {
        log_plus(&self.height())
    }

    /// Evaluate at an integer by Horner's rule.
    pub fn evaluate_integer(&self, x: &BigInt) -> BigInt {
        let mut total = BigInt::zero();
        for coefficient in self.coefficients.iter().rev() {
            total = total * x + coefficient;
        }
        total
    }

    /// Evaluate at a rational by Horner's rule.
    pub fn evaluate_rational(&self, x: &BigRational) -> BigRational {
        let mut total = BigRational::zero();
        for coefficient in self.coefficients.iter().rev() {
            total = total * x + BigRational::from(coefficient.clone());
        }
        total
    }

    /// Evaluate at an interval; the result contains the image of every
    /// point of the input.
    pub fn evaluate_interval(&self, x: &Interval) -> Interval {
        let mut total: Option<Interval> = None;
        for (index, coefficient) in self.coefficients.iter().enumerate().skip(1) {
            if coefficient.is_zero() {
                continue;
            }
            let term = x.pow(index as u32).scale(coefficient);
            total = Some(match total {
                Some(sum) => &sum + &term,
                None => term,
            });
        }
        let constant = self.coefficients.first().cloned().unwrap_or_else(BigInt::zero);
        match total {
            Some(sum) => sum.add_integer(&constant),
            None => Interval::from_integer(&constant, x.precision().max(1)),
        }
    }

    /// Formal derivative.
    pub fn derivative(&self) -> Polynomial {
        Polynomial::new(
            self.coefficients
                .iter()
                .enumerate()
                .skip(1)
                .map(|(index, coefficient)| coefficient * BigInt::from(index))
                .collect(),
        )
    }

    /// The sign of the polynomial at `+infinity` (`-infinity` with
    /// `at_negative`).
    fn sign_at_infinity(&self, at_negative: bool) -> Ordering {
        if self.is_zero() {
            return Ordering::Equal;
        }
        let lead = self.leading_coefficient();
        let flips = at_negative && self.degree() % 2 == 1;
        match (lead.is_positive(), flips) {
            (true, false) | (false, true) => Ordering::Greater,
            _ => Ordering::Less,
        }
    }

    /// gcd of the absolute values of the coefficients, at least one.
    pub fn content(&self) -> BigInt {
        let mut g = BigInt::zero();
        for coefficient in &self.coefficients {
            g = g.gcd(coefficient);
        }
        g.max(BigInt::one())
    }

    /// Divide out the content and normalise the leading sign to be
    /// positive.
    pub fn primitive(&self) -> Polynomial {
        if self.is_zero() {
            return Polynomial::zero();
        }
        let mut content = self.content();
        if self.leading_coefficient().is_negative() {
            content = -content;
        }
        Polynomial::new(self.coefficients.iter().map(|c| c / &content).collect())
    }

    /// Exact division, or `None` if `other` does not divide `self` over
    /// the rationals with an integer quotient.
    pub fn divide_exact(&self, other: &Polynomial) -> Option<Polynomial> {
        assert!(!other.is_zero(), "division by the zero polynomial");
        let (quotient, remainder) = rational_divmod(
            &to_rational(&self.coefficients),
            &to_rational(&other.coefficients),
        );
        if !remainder.iter().all(Zero::is_zero) {
            return None;
        }
        from_rational(&quotient)
    }

    /// gcd over Q, returned as a primitive integer polynomial with a
    /// positive leading coefficient.
    pub fn gcd(&self, other: &Polynomial) -> Polynomial {
        let mut a = to_rational(&self.coefficients);
        let mut b = to_rational(&other.coefficients);
        while !b.iter().all(Zero::is_zero) {
            let (_, r) = rational_divmod(&a, &b);
            a = b;
            b = r;
        }
        primitive_of_rational(&a)
    }

    /// `self / gcd(self, self')`: the same roots, all simple.
    pub fn square_free(&self) -> Polynomial {
        if self.degree() <= 1 {
            return self.primitive();
        }
        let g = self.gcd(&self.derivative());
        if g.degree() == 0 {
            self.primitive()
        } else {
            self.divide_exact(&g)
                .map(|q| q.primitive())
                .unwrap_or_else(|| self.primitive())
        }
    }

    /// `height * degree + 1`: every real root has absolute value below
    /// this.
    pub fn cauchy_bound(&self) -> BigInt {
        self.height() * BigInt::from(self.degree().max(1)) + 1
    }

    /// A rational approximation to the largest real root, correct to
    /// `10^-precision`, by Newton iteration from the Cauchy bound.
    ///
    /// Iterates while the gap between consecutive iterates has not yet
    /// shrunk below the target. Fails with [`Error::Computation`] if the
    /// iteration does not settle, which happens exactly when the
    /// polynomial has no real root.
    pub fn find_leading_root(&self, precision: i64) -> Result<BigRational> {
        assert!(self.degree() >= 1, "root of a constant polynomial");
        let f = self;
        let f_prime = self.derivative();
        let tolerance = BigRational::new(BigInt::one(), ten_pow(precision));

        let mut root = BigRational::from(self.cauchy_bound());
        let mut old_root: Option<BigRational> = None;
        // Iterates are rounded up to a decimal grid that refines as the
        // iteration converges, so numerators stay manageable.
        let mut grid = 8i64;
        let max_steps = 128 + 4 * (precision.max(1) + self.log_height() * self.degree());
        for _ in 0..max_steps {
            if let Some(old) = &old_root {
                if (&root - old).abs() < tolerance {
                    return Ok(root);
                }
            }
            let denominator = f_prime.evaluate_rational(&root);
            if denominator.is_zero() {
                return Err(Error::computation("Newton iteration hit a critical point"));
            }
            let next = &root - f.evaluate_rational(&root) / denominator;
            grid = (2 * grid).min(2 * precision + ACCURACY_SLACK);
            old_root = Some(root);
            root = round_up_to_grid(&next, grid);
        }
        Err(Error::computation("Newton iteration did not converge: no real root"))
    }

    /// An [`AlgebraicApproximation`] of the `power`-th power of the
    /// largest real root, correct to at least `precision` decimal places.
    pub fn algebraic_approximate_leading_root(
        &self,
        precision: i64,
        power: u32,
    ) -> Result<AlgebraicApproximation> {
        let roots = self.real_roots()?;
        let mut leading = roots
            .into_iter()
            .next()
            .ok_or_else(|| Error::assumption("polynomial has no real root"))?;
        leading.algebraic_approximation_of_power(precision, power)
    }

    /// All real roots, canonicalised by irreducible factor and returned
    /// in descending order.
    pub fn real_roots(&self) -> Result<Vec<PolynomialRoot>> {
        if self.degree() < 1 {
            return Ok(Vec::new());
        }
        let square_free = self.square_free();
        let mut roots = Vec::new();
        for factor in irreducible_factors(&square_free) {
            roots.extend(PolynomialRoot::roots_of_irreducible(&factor));
        }
        // Descending; roots of distinct irreducible factors are distinct,
        // so refinement always separates them.
        sort_roots_descending(&mut roots)?;
        Ok(roots)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let terms: Vec<String> = self
            .coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(index, coefficient)| match index {
                0 => format!("{}", coefficient),
                1 => format!("{} x", coefficient),
                _ => format!("{} x^{}", coefficient, index),
            })
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| -c).collect())
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, other: &Polynomial) -> Polynomial {
        let n = self.coefficients.len().max(other.coefficients.len());
        Polynomial::new(
            (0..n)
                .map(|i| {
                    let a = self.coefficients.get(i).cloned().unwrap_or_else(BigInt::zero);
                    let b = other.coefficients.get(i).cloned().unwrap_or_else(BigInt::zero);
                    a + b
                })
                .collect(),
        )
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, other: &Polynomial) -> Polynomial {
        self + &(-other)
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }
        let mut out = vec![BigInt::zero(); self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coefficients.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }
}

// ---------------------------------------------------------------------------
// Rational scaffolding
// ---------------------------------------------------------------------------

fn to_rational(coefficients: &[BigInt]) -> Vec<BigRational> {
    coefficients.iter().map(|c| BigRational::from(c.clone())).collect()
}

fn from_rational(coefficients: &[BigRational]) -> Option<Polynomial> {
    let mut out = Vec::with_capacity(coefficients.len());
    for c in coefficients {
        if !c.is_integer() {
            return None;
        }
        out.push(c.to_integer());
    }
    Some(Polynomial::new(out))
}

fn trim(mut coefficients: Vec<BigRational>) -> Vec<BigRational> {
    while coefficients.last().is_some_and(Zero::is_zero) {
        coefficients.pop();
    }
    coefficients
}

/// Long division over Q; returns `(quotient, remainder)`.
fn rational_divmod(
    a: &[BigRational],
    b: &[BigRational],
) -> (Vec<BigRational>, Vec<BigRational>) {
    let b = trim(b.to_vec());
    assert!(!b.is_empty(), "rational division by zero polynomial");
    let mut remainder = trim(a.to_vec());
    if remainder.len() < b.len() {
        return (Vec::new(), remainder);
    }
    let mut quotient = vec![BigRational::zero(); remainder.len() - b.len() + 1];
    let lead = b.last().expect("nonzero divisor").clone();
    while remainder.len() >= b.len() {
        let shift = remainder.len() - b.len();
        let factor = remainder.last().expect("nonzero remainder").clone() / &lead;
        quotient[shift] = factor.clone();
        for (i, c) in b.iter().enumerate() {
            let delta = &factor * c;
            remainder[shift + i] -= delta;
        }
        remainder = trim(remainder);
        if remainder.is_empty() {
            break;
        }
    }
    (quotient, remainder)
}

/// Clear denominators and normalise the sign: the primitive integer
/// polynomial proportional to the rational one by a positive factor.
fn primitive_of_rational(coefficients: &[BigRational]) -> Polynomial {
    let coefficients = trim(coefficients.to_vec());
    if coefficients.is_empty() {
        return Polynomial::zero();
    }
    let mut lcm = BigInt::one();
    for c in &coefficients {
        lcm = lcm.lcm(c.denom());
    }
    let integral: Vec<BigInt> =
        coefficients.iter().map(|c| (c * BigRational::from(lcm.clone())).to_integer()).collect();
    Polynomial::new(integral).primitive()
}

/// Round a rational up onto the grid `Z / 10^digits`.
fn round_up_to_grid(x: &BigRational, digits: i64) -> BigRational {
    let scale = ten_pow(digits);
    let scaled = x * BigRational::from(scale.clone());
    let mut numerator = scaled.numer().div_floor(scaled.denom());
    if !(&scaled - BigRational::from(numerator.clone())).is_zero() {
        numerator += 1;
    }
    BigRational::new(numerator, scale)
}

// ---------------------------------------------------------------------------
// Sturm chains
// ---------------------------------------------------------------------------

/// The Sturm chain of a square-free polynomial, each element reduced to
/// its primitive integer form (positive rescaling preserves the sign
/// structure).
struct SturmChain {
    chain: Vec<Polynomial>,
}

impl SturmChain {
    fn new(polynomial: &Polynomial) -> Self {
        let mut chain = vec![polynomial.clone(), polynomial.derivative()];
        loop {
            let n = chain.len();
            let previous = &chain[n - 2];
            let current = &chain[n - 1];
            if current.is_zero() {
                chain.pop();
                break;
            }
            let (_, remainder) = rational_divmod(
                &to_rational(previous.coefficients()),
                &to_rational(current.coefficients()),
            );
            let next = primitive_of_rational(&remainder);
            if next.is_zero() {
                break;
            }
            chain.push(-&next);
        }
        SturmChain { chain }
    }

    fn variations_at(&self, x: &BigRational) -> usize {
        let signs = self.chain.iter().map(|p| {
            let value = p.evaluate_rational(x);
            if value.is_positive() {
                Ordering::Greater
            } else if value.is_negative() {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        });
        count_variations(signs)
    }

    fn variations_at_infinity(&self, at_negative: bool) -> usize {
        count_variations(self.chain.iter().map(|p| p.sign_at_infinity(at_negative)))
    }

    /// Number of distinct real roots in `(a, b]`.
    fn roots_in(&self, a: &BigRational, b: &BigRational) -> usize {
        self.variations_at(a).saturating_sub(self.variations_at(b))
    }
}

fn count_variations(signs: impl Iterator<Item = Ordering>) -> usize {
    let mut count = 0;
    let mut last: Option<Ordering> = None;
    for sign in signs {
        if sign == Ordering::Equal {
            continue;
        }
        if let Some(previous) = last {
            if previous != sign {
                count += 1;
            }
        }
        last = Some(sign);
    }
    count
}

// ---------------------------------------------------------------------------
// PolynomialRoot
// ---------------------------------------------------------------------------

/// An isolated real root of an irreducible integer polynomial.
///
/// The pair `(polynomial, (lower, upper))` determines the root exactly:
/// the polynomial is irreducible over Q with a positive leading
/// coefficient, and the open interval contains exactly one of its real
/// roots. Refinement narrows the interval in place; the represented
/// number never changes.
#[derive(Debug, Clone)]
pub struct PolynomialRoot {
    polynomial: Polynomial,
    lower: BigRational,
    upper: BigRational,
}

impl PolynomialRoot {
    /// Isolate every real root of an irreducible polynomial, in
    /// ascending order.
    fn roots_of_irreducible(polynomial: &Polynomial) -> Vec<PolynomialRoot> {
        assert!(polynomial.degree() >= 1, "roots of a constant polynomial");
        if polynomial.degree() == 1 {
            // Exact rational root -a0/a1.
            let root = BigRational::new(
                -polynomial.coefficients()[0].clone(),
                polynomial.coefficients()[1].clone(),
            );
            return vec![PolynomialRoot {
                polynomial: polynomial.primitive(),
                lower: &root - BigRational::one(),
                upper: &root + BigRational::one(),
            }];
        }

        let chain = SturmChain::new(polynomial);
        let bound = BigRational::from(polynomial.cauchy_bound());
        let total = chain
            .variations_at_infinity(true)
            .saturating_sub(chain.variations_at_infinity(false));
        let mut found = Vec::new();
        if total > 0 {
            let mut pending = vec![(-&bound, bound.clone(), chain.roots_in(&-&bound, &bound))];
            while let Some((lo, hi, count)) = pending.pop() {
                match count {
                    0 => {}
                    1 => found.push((lo, hi)),
                    _ => {
                        let mid = (&lo + &hi) / BigRational::from(BigInt::from(2));
                        // An irreducible polynomial of degree >= 2 has no
                        // rational roots, so the midpoint is never a root.
                        let left = chain.roots_in(&lo, &mid);
                        pending.push((lo, mid.clone(), left));
                        pending.push((mid, hi, count - left));
                    }
                }
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
            .into_iter()
            .map(|(lower, upper)| PolynomialRoot {
                polynomial: polynomial.primitive(),
                lower,
                upper,
            })
            .collect()
    }

    /// The irreducible polynomial this root satisfies.
    pub fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    /// Degree of the minimal polynomial.
    pub fn degree(&self) -> i64 {
        self.polynomial.degree()
    }

    /// `log10` bound for the height of the minimal polynomial.
    pub fn log_height(&self) -> i64 {
        self.polynomial.log_height()
    }

    /// Current isolating interval.
    pub fn bounds(&self) -> (&BigRational, &BigRational) {
        (&self.lower, &self.upper)
    }

    /// Whether the root is an exact rational (degree-one minimal
    /// polynomial).
    pub fn as_rational(&self) -> Option<BigRational> {
        (self.degree() == 1).then(|| {
            BigRational::new(
                -self.polynomial.coefficients()[0].clone(),
                self.polynomial.coefficients()[1].clone(),
            )
        })
    }

    /// Index of this root among the real roots of its minimal
    /// polynomial, counted from the largest.
    pub fn root_index(&self) -> usize {
        if self.degree() == 1 {
            return 0;
        }
        let chain = SturmChain::new(&self.polynomial);
        // Roots strictly above the isolating interval.
        let top = BigRational::from(self.polynomial.cauchy_bound());
        chain.roots_in(&self.upper, &top)
    }

    /// Shrink the isolating interval below `10^-accuracy` by decimal
    /// bisection.
    pub fn refine(&mut self, accuracy: i64) {
        let tolerance = BigRational::new(BigInt::one(), ten_pow(accuracy.max(1)));
        if let Some(root) = self.as_rational() {
            self.lower = &root - &tolerance;
            self.upper = &root + &tolerance;
            return;
        }
        let sign_at_lower = self.polynomial.evaluate_rational(&self.lower).is_positive();
        while &self.upper - &self.lower >= tolerance {
            // A decimal midpoint keeps denominators as powers of ten.
            let width = &self.upper - &self.lower;
            let grid = grid_for(&width) + 1;
            let mid = round_up_to_grid(
                &((&self.lower + &self.upper) / BigRational::from(BigInt::from(2))),
                grid,
            );
            let mid = if mid >= self.upper || mid <= self.lower {
                (&self.lower + &self.upper) / BigRational::from(BigInt::from(2))
            } else {
                mid
            };
            if self.polynomial.evaluate_rational(&mid).is_positive() == sign_at_lower {
                self.lower = mid;
            } else {
                self.upper = mid;
            }
        }
    }

    /// A decimal [`Interval`] around the root, accurate to `accuracy`
    /// places.
    pub fn interval(&mut self, accuracy: i64) -> Interval {
        self.refine(accuracy + 2);
        let precision = accuracy + 2;
        let scale = ten_pow(precision);
        let lower =
            (self.lower.numer() * &scale).div_floor(self.lower.denom());
        let upper =
            (self.upper.numer() * &scale).div_floor(self.upper.denom()) + 1;
        Interval::new(lower, upper, precision).expect("isolating interval has positive width")
    }

    /// An [`AlgebraicApproximation`] of the root to at least `accuracy`
    /// correct places.
    pub fn algebraic_approximation(&mut self, accuracy: i64) -> Result<AlgebraicApproximation> {
        self.algebraic_approximation_of_power(accuracy, 1)
    }

    /// An [`AlgebraicApproximation`] of the `power`-th power of the root.
    pub fn algebraic_approximation_of_power(
        &mut self,
        accuracy: i64,
        power: u32,
    ) -> Result<AlgebraicApproximation> {
        let log_degree = (self.degree() as f64).max(1.0).log10();
        // height(r^k) <= height(r)^k for an algebraic integer; keep the
        // bookkeeping in log10 form.
        let height = (self.log_height() as f64 + 1.0) * f64::from(power.max(1));
        let needed = AlgebraicApproximation::accuracy_needed(log_degree, height);
        let target = accuracy.max(needed) + ACCURACY_SLACK;
        let mut working = target + ACCURACY_SLACK;
        for _ in 0..8 {
            let interval = self.interval(working).pow(power);
            if interval.accuracy() >= target {
                return AlgebraicApproximation::new(
                    interval.simplify(target),
                    log_degree,
                    height,
                );
            }
            working *= 2;
        }
        Err(Error::approximation("could not refine root to the requested accuracy"))
    }

    /// Exact comparison of this root against a rational integer.
    pub fn compare_integer(&mut self, n: &BigInt) -> Ordering {
        if let Some(root) = self.as_rational() {
            return root.cmp(&BigRational::from(n.clone()));
        }
        // The root is irrational, so refining eventually excludes n.
        let n = BigRational::from(n.clone());
        let mut accuracy = ACCURACY_SLACK;
        loop {
            self.refine(accuracy);
            if self.lower >= n {
                return Ordering::Greater;
            }
            if self.upper <= n {
                return Ordering::Less;
            }
            accuracy *= 2;
        }
    }

    /// Exact equality of represented roots.
    pub fn equals(&self, other: &PolynomialRoot) -> bool {
        self.polynomial == other.polynomial
            && {
                let mut a = self.clone();
                let mut b = other.clone();
                a.refine(ACCURACY_SLACK);
                b.refine(ACCURACY_SLACK);
                a.root_index() == b.root_index()
            }
    }
}

impl fmt::Display for PolynomialRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root of {} in ({}, {})", self.polynomial, self.lower, self.upper)
    }
}

fn grid_for(width: &BigRational) -> i64 {
    // Smallest d with 10^-d below the width, clamped to be nonnegative.
    let mut d = 0;
    let mut scale = BigRational::one();
    let tenth = BigRational::new(BigInt::one(), BigInt::from(10));
    while &scale > width && d < 1_000_000 {
        scale *= &tenth;
        d += 1;
    }
    d
}

/// Sort roots in descending numeric order, refining isolating intervals
/// until every pair separates.
fn sort_roots_descending(roots: &mut [PolynomialRoot]) -> Result<()> {
    // Refine until pairwise disjoint, then interval order is total.
    let mut accuracy = ACCURACY_SLACK;
    for _ in 0..64 {
        for root in roots.iter_mut() {
            root.refine(accuracy);
        }
        let disjoint = |a: &PolynomialRoot, b: &PolynomialRoot| {
            a.upper <= b.lower || b.upper <= a.lower || a.equals(b)
        };
        let all_separated = roots
            .iter()
            .enumerate()
            .all(|(i, a)| roots.iter().skip(i + 1).all(|b| disjoint(a, b)));
        if all_separated {
            roots.sort_by(|a, b| b.lower.cmp(&a.lower));
            return Ok(());
        }
        accuracy *= 2;
    }
    Err(Error::computation("could not separate real roots"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        let p = Polynomial::from_coeffs(&[1, -3, 1]); // 1 - 3x + x^2
        assert_eq!(p.evaluate_integer(&BigInt::from(3)), BigInt::from(1));
        assert_eq!(p.degree(), 2);
        assert_eq!(p.height(), BigInt::from(3));
    }

    #[test]
    fn test_derivative() {
        let p = Polynomial::from_coeffs(&[5, 0, -4, 2]);
        assert_eq!(p.derivative(), Polynomial::from_coeffs(&[0, -8, 6]));
    }

    #[test]
    fn test_square_free() {
        // (x - 1)^2 (x + 2) = x^3 - 3x + 2
        let p = Polynomial::from_coeffs(&[2, -3, 0, 1]);
        let sf = p.square_free();
        // (x - 1)(x + 2) = x^2 + x - 2
        assert_eq!(sf, Polynomial::from_coeffs(&[-2, 1, 1]));
    }

    #[test]
    fn test_gcd() {
        let a = Polynomial::from_coeffs(&[-1, 0, 1]); // x^2 - 1
        let b = Polynomial::from_coeffs(&[1, 1]); // x + 1
        assert_eq!(a.gcd(&b), b);
    }

    #[test]
    fn test_find_leading_root_golden_ratio_squared() {
        // x^2 - 3x + 1 has largest root (3 + sqrt 5) / 2 = 2.618033...
        let p = Polynomial::from_coeffs(&[1, -3, 1]);
        let r = p.find_leading_root(12).expect("leading root");
        let lo = BigRational::new(2_618_033_988_749i64.into(), ten_pow(12));
        let hi = BigRational::new(2_618_033_988_751i64.into(), ten_pow(12));
        assert!(r > lo && r < hi, "got {}", r);
    }

    #[test]
    fn test_real_roots_sorted_descending() {
        // (x^2 - 2)(x - 3) = x^3 - 3x^2 - 2x + 6
        let p = Polynomial::from_coeffs(&[6, -2, -3, 1]);
        let roots = p.real_roots().expect("roots");
        assert_eq!(roots.len(), 3);
        assert_eq!(roots[0].degree(), 1); // 3
        assert_eq!(roots[1].degree(), 2); // sqrt 2
        assert_eq!(roots[2].degree(), 2); // -sqrt 2
        assert_eq!(roots[0].as_rational(), Some(BigRational::from(BigInt::from(3))));
    }

    #[test]
    fn test_sqrt2_squared_is_two() {
        let p = Polynomial::from_coeffs(&[-2, 0, 1]);
        let mut roots = p.real_roots().expect("roots");
        let root = &mut roots[0];
        let approx = root.algebraic_approximation(20).expect("approximation");
        let square = (&approx * &approx).expect("product");
        let difference = (&square - &AlgebraicApproximation::from_integer(&BigInt::from(2), 30))
            .expect("difference");
        assert!(difference.is_zero());
    }

    #[test]
    fn test_root_interval_contains_root() {
        let p = Polynomial::from_coeffs(&[-2, 0, 1]);
        let mut roots = p.real_roots().expect("roots");
        let interval = roots[0].interval(15);
        // 1.41421356237309...
        assert!(interval.contains_rational(&BigRational::new(
            1_414_213_562_373i64.into(),
            ten_pow(12)
        )));
        assert!(interval.accuracy() >= 15);
    }

    #[test]
    fn test_sturm_counts() {
        let p = Polynomial::from_coeffs(&[-2, 0, 1]); // x^2 - 2
        let chain = SturmChain::new(&p);
        let a = BigRational::from(BigInt::from(-3));
        let b = BigRational::from(BigInt::from(3));
        assert_eq!(chain.roots_in(&a, &b), 2);
        let zero = BigRational::zero();
        assert_eq!(chain.roots_in(&zero, &b), 1);
    }
}
