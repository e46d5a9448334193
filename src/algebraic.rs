//! Certified approximations of real algebraic numbers
//!
//! Suppose `f(x) = a_n x^n + ... + a_0` over Z is a (not necessarily
//! irreducible) polynomial with `a_n != 0`. Write `h(f)` for
//! `log10(max |a_i|)` and `deg(f) = n`; the height and degree of an
//! algebraic number are those of its minimal polynomial.
//!
//! The bookkeeping rests on two classical facts:
//!  1. `h(x + y) <= h(x) + h(y) + log 2`, `h(x y) <= h(x) + h(y)` and
//!     `h(1/x) = h(x)` (Waldschmidt, "Diophantine approximation on
//!     linear algebraic groups", property 3.3).
//!  2. A nonzero root of `f` has absolute value at least
//!     `1 / sum|a_i / a_0|` (Basu-Pollack-Roy, lemma 10.3).
//!
//! Together: an interval of accuracy at least
//! `ceil(log deg) + ceil(height) + 2` pins down at most one algebraic
//! number of that degree and height, so such an interval plus the two
//! bounds is an exact representation. Arithmetic that cannot maintain
//! the bound fails with [`Error::Approximation`]; the caller retries
//! with better input intervals.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::interval::{Interval, log_plus};

const LOG_2: f64 = 0.301_029_995_663_981_2;

/// An algebraic number, represented by an interval that is small enough
/// (relative to the degree and height bounds) to determine it uniquely.
#[derive(Debug, Clone)]
pub struct AlgebraicApproximation {
    interval: Interval,
    log_degree: f64,
    height: f64,
}

impl AlgebraicApproximation {
    /// Accuracy an interval must reach before it pins down a unique
    /// algebraic number of the given log-degree and log-height.
    pub fn accuracy_needed(log_degree: f64, height: f64) -> i64 {
        (log_degree.ceil() as i64) + (height.ceil() as i64) + 2
    }

    /// Wrap an interval with its degree/height certificate.
    ///
    /// Fails with [`Error::Approximation`] when the interval is too wide
    /// for the certificate.
    pub fn new(interval: Interval, log_degree: f64, height: f64) -> Result<Self> {
        // Round the height up a little so repeated bookkeeping never
        // rounds an upper bound downwards.
        let height = (height * 100_000.0).round() / 100_000.0 + 0.000_01;
        let accuracy_needed = Self::accuracy_needed(log_degree, height);
        let accuracy = interval.accuracy();
        if accuracy < accuracy_needed {
            return Err(Error::approximation(format!(
                "an algebraic number with log degree {} and height {:.3} needs accuracy {}, not {}",
                log_degree, height, accuracy_needed, accuracy
            )));
        }
        Ok(AlgebraicApproximation { interval, log_degree, height })
    }

    /// The rational integer `n` as an algebraic number, known to
    /// `accuracy` places.
    pub fn from_integer(n: &BigInt, accuracy: i64) -> Self {
        let height = log_plus(n) as f64 + 1.0;
        let needed = Self::accuracy_needed(0.0, height);
        AlgebraicApproximation {
            interval: Interval::from_integer(n, accuracy.max(needed).max(8)),
            log_degree: 0.0,
            height,
        }
    }

    /// The underlying interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Upper bound for `log10` of the degree.
    pub fn log_degree(&self) -> f64 {
        self.log_degree
    }

    /// Upper bound for `log10` of the height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Accuracy of the underlying interval.
    pub fn accuracy(&self) -> i64 {
        self.interval.accuracy()
    }

    /// The accuracy the certificate requires.
    pub fn accuracy_required(&self) -> i64 {
        Self::accuracy_needed(self.log_degree, self.height)
    }

    /// Round the interval down to roughly `accuracy` correct places,
    /// keeping the certificate valid.
    pub fn simplify(&self, accuracy: i64) -> Result<Self> {
        let target = accuracy.max(self.accuracy_required());
        AlgebraicApproximation::new(
            self.interval.simplify(target),
            self.log_degree,
            self.height,
        )
    }

    /// Whether the represented number is positive.
    pub fn is_positive(&self) -> bool {
        self.interval.sign() == Ordering::Greater
    }

    /// Whether the represented number is negative.
    pub fn is_negative(&self) -> bool {
        self.interval.sign() == Ordering::Less
    }

    /// Whether the represented number is zero.
    ///
    /// Sound because the interval is narrower than the root separation
    /// bound implied by the certificate: if the number were nonzero the
    /// interval could not straddle zero.
    pub fn is_zero(&self) -> bool {
        self.interval.sign() == Ordering::Equal
    }

    /// Certified sign as an [`Ordering`] against zero.
    pub fn sign(&self) -> Ordering {
        self.interval.sign()
    }

    /// Compare two algebraic numbers exactly.
    pub fn compare(&self, other: &AlgebraicApproximation) -> Result<Ordering> {
        Ok((self - other)?.sign())
    }

    /// Add a rational integer.
    pub fn add_integer(&self, n: &BigInt) -> Result<Self> {
        AlgebraicApproximation::new(
            self.interval.add_integer(n),
            self.log_degree,
            self.height + log_plus(n) as f64 + LOG_2,
        )
    }

    /// Multiply by a nonzero rational integer.
    pub fn scale(&self, n: &BigInt) -> Result<Self> {
        AlgebraicApproximation::new(
            self.interval.scale(n),
            self.log_degree,
            self.height + log_plus(n) as f64,
        )
    }

    /// Divide by another algebraic number.
    pub fn try_div(&self, other: &AlgebraicApproximation) -> Result<Self> {
        AlgebraicApproximation::new(
            self.interval.try_div(&other.interval)?,
            self.log_degree + other.log_degree,
            self.height + other.height,
        )
    }

    /// Non-negative integer power by repeated squaring.
    pub fn pow(&self, power: u32) -> Result<Self> {
        if power == 0 {
            return Ok(AlgebraicApproximation::from_integer(
                &BigInt::from(1),
                self.interval.accuracy(),
            ));
        }
        if power == 1 {
            return Ok(self.clone());
        }
        let sqrt = self.pow(power / 2)?;
        let square = (&sqrt * &sqrt)?;
        if power % 2 == 1 { &square * self } else { Ok(square) }
    }
}

impl fmt::Display for AlgebraicApproximation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interval)
    }
}

impl Neg for &AlgebraicApproximation {
    type Output = AlgebraicApproximation;

    fn neg(self) -> AlgebraicApproximation {
        AlgebraicApproximation {
            interval: -&self.interval,
            log_degree: self.log_degree,
            height: self.height,
        }
    }
}

impl Add for &AlgebraicApproximation {
    type Output = Result<AlgebraicApproximation>;

    fn add(self, other: &AlgebraicApproximation) -> Result<AlgebraicApproximation> {
        AlgebraicApproximation::new(
            &self.interval + &other.interval,
            self.log_degree + other.log_degree,
            self.height + other.height + LOG_2,
        )
    }
}

impl Sub for &AlgebraicApproximation {
    type Output = Result<AlgebraicApproximation>;

    fn sub(self, other: &AlgebraicApproximation) -> Result<AlgebraicApproximation> {
        AlgebraicApproximation::new(
            &self.interval - &other.interval,
            self.log_degree + other.log_degree,
            self.height + other.height + LOG_2,
        )
    }
}

impl Mul for &AlgebraicApproximation {
    type Output = Result<AlgebraicApproximation>;

    fn mul(self, other: &AlgebraicApproximation) -> Result<AlgebraicApproximation> {
        AlgebraicApproximation::new(
            &self.interval * &other.interval,
            self.log_degree + other.log_degree,
            self.height + other.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqrt2(accuracy: i64) -> AlgebraicApproximation {
        use crate::polynomial::Polynomial;
        let p = Polynomial::from_coeffs(&[-2, 0, 1]);
        let mut roots = p.real_roots().expect("roots of x^2 - 2");
        roots.remove(0).algebraic_approximation(accuracy).expect("approximation")
    }

    #[test]
    fn test_certificate_enforced() {
        // An interval of width 1 cannot represent a degree-2 number of
        // height 10.
        let wide = Interval::new(BigInt::from(14), BigInt::from(15), 1).expect("interval");
        assert!(matches!(
            AlgebraicApproximation::new(wide, 2f64.log10(), 1.0),
            Err(Error::Approximation(_))
        ));
    }

    #[test]
    fn test_accuracy_invariant_after_arithmetic() {
        let a = sqrt2(30);
        let sum = (&a + &a).expect("sum");
        assert!(sum.accuracy() >= sum.accuracy_required());
        let product = (&a * &a).expect("product");
        assert!(product.accuracy() >= product.accuracy_required());
    }

    #[test]
    fn test_sqrt2_squared_minus_two_is_zero() {
        let a = sqrt2(30);
        let square = (&a * &a).expect("square");
        let two = AlgebraicApproximation::from_integer(&BigInt::from(2), 40);
        let difference = (&square - &two).expect("difference");
        assert!(difference.is_zero());
        assert!(!difference.is_positive());
        assert!(!difference.is_negative());
    }

    #[test]
    fn test_compare() {
        let a = sqrt2(30);
        let one = AlgebraicApproximation::from_integer(&BigInt::from(1), 40);
        let two = AlgebraicApproximation::from_integer(&BigInt::from(2), 40);
        assert_eq!(a.compare(&one).expect("compare"), Ordering::Greater);
        assert_eq!(a.compare(&two).expect("compare"), Ordering::Less);
    }

    #[test]
    fn test_division_roundtrip() {
        let a = sqrt2(40);
        let one = AlgebraicApproximation::from_integer(&BigInt::from(1), 60);
        let inverse = one.try_div(&a).expect("inverse");
        let product = (&a * &inverse).expect("product");
        let difference = (&product - &one).expect("difference");
        assert!(difference.is_zero());
    }
}
