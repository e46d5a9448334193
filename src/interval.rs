//! Interval arithmetic over decimal rationals
//!
//! An [`Interval`] represents the open interval
//! `(lower / 10^precision, upper / 10^precision)` with integer endpoints.
//! Every arithmetic operation preserves containment of the true value.
//!
//! For an interval `I` let `acc(I)` denote its accuracy, that is
//! `acc(I) := I.precision - floor(log10(I.upper - I.lower))`.
//! For an integer `x` let `log+(x) := log10(max(|x|, 1))`.
//!
//! Suppose `I` and `J` are intervals, `x` is an integer and
//! `m := min(acc(I), acc(J))`. Then:
//!   - `acc(I + J) >= m - 1`
//!   - `acc(I * J) >= m - log(|I.lower| + |J.lower| + 1)`
//!   - `acc(I / J) >= m - log+(J)`
//!   - `acc(x * I) >= acc(I) - log+(x)`

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::error::{Error, Result};

/// Number of decimal digits of `|n|`; `digits(0) == 1`.
pub(crate) fn digits(n: &BigInt) -> i64 {
    if n.is_zero() {
        return 1;
    }
    // For b bits, 2^(b-1) <= |n| < 2^b, so the digit count is determined
    // up to one; settle it by comparison.
    let bits = n.bits();
    let low = (((bits - 1) as f64) * std::f64::consts::LOG10_2).floor() as i64;
    if n.abs() >= ten_pow(low + 1) { low + 2 } else { low + 1 }
}

/// `floor(log10(n))` for `n >= 1`.
pub(crate) fn log10_floor(n: &BigInt) -> i64 {
    assert!(n.is_positive(), "log10 of a non-positive integer");
    digits(n) - 1
}

/// `ceil(log10(max(|n|, 1)))`, an upper bound for `log+(n)`.
pub(crate) fn log_plus(n: &BigInt) -> i64 {
    if n.abs() <= BigInt::one() { 0 } else { digits(n) }
}

/// `10^k` for `k >= 0`.
pub(crate) fn ten_pow(k: i64) -> BigInt {
    assert!(k >= 0, "negative power of ten");
    BigInt::from(10u32).pow(k as u32)
}

/// An open interval `(lower / 10^precision, upper / 10^precision)`.
///
/// Invariant: `lower < upper`. A collapsed interval cannot be built; the
/// constructors report [`Error::Approximation`] instead, since a zero
/// width only ever arises from insufficient working precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    lower: BigInt,
    upper: BigInt,
    precision: i64,
}

impl Interval {
    /// Build an interval from scaled endpoints.
    ///
    /// # Panics
    /// Panics if `lower > upper` (a programming error); equal endpoints
    /// are an [`Error::Approximation`].
    pub fn new(lower: BigInt, upper: BigInt, precision: i64) -> Result<Self> {
        if lower == upper {
            return Err(Error::approximation("interval has collapsed to a point"));
        }
        assert!(lower < upper, "interval endpoints out of order");
        Ok(Interval { lower, upper, precision })
    }

    fn make(lower: BigInt, upper: BigInt, precision: i64) -> Self {
        assert!(lower < upper, "interval endpoints out of order");
        Interval { lower, upper, precision }
    }

    /// Parse a decimal string such as `"2.2360679"`; the result is the
    /// width-two interval about the written value at its written
    /// precision.
    pub fn from_string(string: &str) -> Result<Self> {
        let (integral, fractional) = match string.split_once('.') {
            Some((i, f)) => (i, f),
            None => (string, ""),
        };
        let joined = format!("{}{}", integral, fractional);
        let x: BigInt = joined
            .parse()
            .unwrap_or_else(|_| panic!("malformed decimal string {:?}", string));
        Interval::new(&x - 1, &x + 1, fractional.len() as i64)
    }

    /// The width-two interval about `integer` at the given accuracy.
    pub fn from_integer(integer: &BigInt, accuracy: i64) -> Self {
        let x = integer * ten_pow(accuracy);
        Interval::make(&x - 1, &x + 1, accuracy)
    }

    /// The width-two interval about `numerator / denominator`.
    pub fn from_fraction(numerator: &BigInt, denominator: &BigInt, accuracy: i64) -> Self {
        assert!(!denominator.is_zero(), "fraction with zero denominator");
        let (numerator, denominator) = if denominator.is_negative() {
            (-numerator, -denominator)
        } else {
            (numerator.clone(), denominator.clone())
        };
        let x = (numerator * ten_pow(accuracy)).div_floor(&denominator);
        Interval::make(&x - 1, &x + 1, accuracy)
    }

    /// The width-two interval about a rational at the given accuracy.
    pub fn from_rational(rational: &BigRational, accuracy: i64) -> Self {
        Interval::from_fraction(rational.numer(), rational.denom(), accuracy)
    }

    /// Scaled lower endpoint.
    pub fn lower(&self) -> &BigInt {
        &self.lower
    }

    /// Scaled upper endpoint.
    pub fn upper(&self) -> &BigInt {
        &self.upper
    }

    /// The power of ten both endpoints are scaled by.
    pub fn precision(&self) -> i64 {
        self.precision
    }

    /// The number of correct decimal places this interval determines.
    /// The width of the interval is at most `10^-accuracy`.
    pub fn accuracy(&self) -> i64 {
        self.precision - log10_floor(&(&self.upper - &self.lower))
    }

    /// An upper bound for `log10` of the magnitude of the represented
    /// number, at least one.
    pub fn log_plus(&self) -> i64 {
        let l = digits(&self.lower) - self.precision;
        let u = digits(&self.upper) - self.precision;
        l.max(u).max(1) + 1
    }

    /// Rescale the endpoints to a new denominator, rounding outwards
    /// when digits are dropped.
    pub fn change_denominator(&self, new_denominator: i64) -> Self {
        let d = new_denominator - self.precision;
        match d.cmp(&0) {
            Ordering::Greater => {
                let shift = ten_pow(d);
                Interval::make(&self.lower * &shift, &self.upper * &shift, new_denominator)
            }
            Ordering::Equal => self.clone(),
            Ordering::Less => {
                let shift = ten_pow(-d);
                Interval::make(
                    self.lower.div_floor(&shift),
                    self.upper.div_floor(&shift) + 1,
                    new_denominator,
                )
            }
        }
    }

    /// Round down to roughly the requested accuracy, keeping containment.
    /// Simplifying an interval that is already coarser is a no-op.
    pub fn simplify(&self, accuracy: i64) -> Self {
        let excess = self.accuracy() - accuracy;
        if excess <= 0 {
            self.clone()
        } else {
            self.change_denominator(self.precision - excess)
        }
    }

    /// Whether `other` lies strictly inside this interval.
    pub fn contains(&self, other: &Interval) -> bool {
        let p = self.precision.max(other.precision);
        let (a, b) = (self.change_denominator(p), other.change_denominator(p));
        a.lower < b.lower && b.upper < a.upper
    }

    /// Whether the integer `x` lies strictly inside this interval.
    pub fn contains_integer(&self, x: &BigInt) -> bool {
        let scaled = x * ten_pow(self.precision);
        self.lower < scaled && scaled < self.upper
    }

    /// Whether a rational lies strictly inside this interval.
    pub fn contains_rational(&self, x: &BigRational) -> bool {
        // lower / 10^p < n / d  <=>  lower * d < n * 10^p  (for d > 0).
        let mut numer = x.numer().clone();
        let mut denom = x.denom().clone();
        if denom.is_negative() {
            numer = -numer;
            denom = -denom;
        }
        let scaled = &numer * ten_pow(self.precision);
        &self.lower * &denom < scaled && scaled < &self.upper * &denom
    }

    /// The sign of every number in the interval: `Greater` or `Less` if
    /// the interval is entirely positive or negative, `Equal` when it
    /// straddles zero and the sign is undecidable at this accuracy.
    pub fn sign(&self) -> Ordering {
        if self.lower.is_positive() {
            Ordering::Greater
        } else if self.upper.is_negative() {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    /// Midpoint as an exact rational.
    pub fn midpoint(&self) -> BigRational {
        BigRational::new(&self.lower + &self.upper, 2 * ten_pow(self.precision))
    }

    /// Multiply by a nonzero integer.
    ///
    /// # Panics
    /// Panics on a zero multiplier: the result would be a point, which an
    /// open interval cannot represent.
    pub fn scale(&self, x: &BigInt) -> Self {
        assert!(!x.is_zero(), "scaling an interval by zero");
        let (a, b) = (&self.lower * x, &self.upper * x);
        if x.is_positive() {
            Interval::make(a, b, self.precision)
        } else {
            Interval::make(b, a, self.precision)
        }
    }

    /// Add an integer.
    pub fn add_integer(&self, x: &BigInt) -> Self {
        let shift = x * ten_pow(self.precision);
        Interval::make(&self.lower + &shift, &self.upper + &shift, self.precision)
    }

    /// Subtract an integer.
    pub fn sub_integer(&self, x: &BigInt) -> Self {
        self.add_integer(&-x)
    }

    /// Divide by another interval. Fails with [`Error::Approximation`] if
    /// the denominator contains zero or the quotient collapses.
    pub fn try_div(&self, other: &Interval) -> Result<Self> {
        if other.sign() == Ordering::Equal {
            return Err(Error::approximation("denominator interval contains zero"));
        }
        let common = self.precision.max(other.precision) + other.log_plus();
        let p = self.change_denominator(common);
        let q = other.change_denominator(common);
        let scale = ten_pow(common);
        let values = [
            (&p.lower * &scale).div_floor(&q.lower),
            (&p.upper * &scale).div_floor(&q.lower),
            (&p.lower * &scale).div_floor(&q.upper),
            (&p.upper * &scale).div_floor(&q.upper),
        ];
        let lower = values.iter().min().expect("four candidates").clone();
        let upper = values.iter().max().expect("four candidates").clone() + 1;
        Interval::new(lower, upper, common)
    }

    /// Non-negative integer power by repeated squaring.
    pub fn pow(&self, power: u32) -> Self {
        match power {
            0 => Interval::from_integer(&BigInt::one(), self.precision.max(1)),
            1 => self.clone(),
            _ => {
                let sqrt = self.pow(power / 2);
                let square = &sqrt * &sqrt;
                if power % 2 == 1 { &square * self } else { square }
            }
        }
    }

    fn endpoint_string(value: &BigInt, precision: i64) -> String {
        let digits = value.abs().to_string();
        let digits = if (digits.len() as i64) <= precision {
            format!("{}{}", "0".repeat((precision + 1 - digits.len() as i64) as usize), digits)
        } else {
            digits
        };
        let split = digits.len() - precision as usize;
        format!(
            "{}{}.{}",
            if value.is_negative() { "-" } else { "" },
            &digits[..split],
            &digits[split..]
        )
    }

    /// Render `accuracy` correct decimal places followed by `?`.
    pub fn approximate_string(&self, accuracy: i64) -> String {
        let shown = accuracy.min(self.accuracy() - 1).max(0);
        let rounded = self.change_denominator(shown);
        let s = Interval::endpoint_string(&((&rounded.lower + &rounded.upper) / 2), shown);
        format!("{}?", s)
    }

    /// Render both endpoints in full.
    pub fn interval_string(&self) -> String {
        format!(
            "({}, {})",
            Interval::endpoint_string(&self.lower, self.precision),
            Interval::endpoint_string(&self.upper, self.precision)
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.approximate_string(6))
    }
}

impl Neg for &Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        Interval::make(-&self.upper, -&self.lower, self.precision)
    }
}

impl Add for &Interval {
    type Output = Interval;

    fn add(self, other: &Interval) -> Interval {
        let common = self.precision.max(other.precision);
        let p = self.change_denominator(common);
        let q = other.change_denominator(common);
        Interval::make(&p.lower + &q.lower, &p.upper + &q.upper, common)
    }
}

impl Sub for &Interval {
    type Output = Interval;

    fn sub(self, other: &Interval) -> Interval {
        let common = self.precision.max(other.precision);
        let p = self.change_denominator(common);
        let q = other.change_denominator(common);
        Interval::make(&p.lower - &q.upper, &p.upper - &q.lower, common)
    }
}

impl Mul for &Interval {
    type Output = Interval;

    fn mul(self, other: &Interval) -> Interval {
        let common = self.precision.max(other.precision);
        let p = self.change_denominator(common);
        let q = other.change_denominator(common);
        let values = [
            &p.lower * &q.lower,
            &p.upper * &q.lower,
            &p.lower * &q.upper,
            &p.upper * &q.upper,
        ];
        let lower = values.iter().min().expect("four candidates").clone();
        let upper = values.iter().max().expect("four candidates").clone();
        Interval::make(lower, upper, 2 * common)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(s: &str) -> Interval {
        Interval::from_string(s).expect("test interval")
    }

    #[test]
    fn test_from_string() {
        let i = interval("1.41421356");
        assert_eq!(i.precision(), 8);
        assert_eq!(i.accuracy(), 8);
        assert!(i.contains_rational(&BigRational::new(141_421_356.into(), 100_000_000.into())));
    }

    #[test]
    fn test_change_denominator_keeps_containment() {
        let i = interval("3.14159265");
        let coarse = i.change_denominator(3);
        assert!(coarse.contains(&i.change_denominator(12)));
        let fine = i.change_denominator(12);
        assert_eq!(fine.accuracy(), i.accuracy());
    }

    #[test]
    fn test_addition_accuracy_bound() {
        let i = interval("1.41421356");
        let j = interval("2.23606797");
        let sum = &i + &j;
        let m = i.accuracy().min(j.accuracy());
        assert!(sum.accuracy() >= m - 1);
        assert!(sum.contains_rational(&(i.midpoint() + j.midpoint())));
    }

    #[test]
    fn test_multiplication_contains_product() {
        let i = interval("1.41421356");
        let j = interval("1.41421356");
        let product = &i * &j;
        assert!(product.contains_integer(&BigInt::from(2)));
    }

    #[test]
    fn test_division_by_zero_interval_fails() {
        let i = interval("1.5");
        let j = Interval::new(BigInt::from(-1), BigInt::from(1), 3).expect("interval");
        assert!(matches!(i.try_div(&j), Err(Error::Approximation(_))));
    }

    #[test]
    fn test_division_inverse() {
        let i = interval("2.00000000");
        let one = Interval::from_integer(&BigInt::one(), 8);
        let half = one.try_div(&i).expect("division");
        assert!(half.contains_rational(&BigRational::new(1.into(), 2.into())));
    }

    #[test]
    fn test_sign() {
        assert_eq!(interval("2.5").sign(), Ordering::Greater);
        assert_eq!((-&interval("2.5")).sign(), Ordering::Less);
        let z = Interval::new(BigInt::from(-1), BigInt::from(1), 5).expect("interval");
        assert_eq!(z.sign(), Ordering::Equal);
    }

    #[test]
    fn test_scale_flips_for_negative() {
        let i = interval("1.25");
        let scaled = i.scale(&BigInt::from(-3));
        assert_eq!(scaled.sign(), Ordering::Less);
        assert!(scaled.contains_rational(&BigRational::new((-15).into(), 4.into())));
    }

    #[test]
    fn test_pow() {
        let i = interval("1.41421356");
        let fourth = i.pow(4);
        assert!(fourth.contains_integer(&BigInt::from(4)));
    }

    #[test]
    fn test_collapsed_interval_is_approximation_error() {
        assert!(matches!(
            Interval::new(BigInt::from(5), BigInt::from(5), 2),
            Err(Error::Approximation(_))
        ));
    }

    #[test]
    fn test_display() {
        let i = interval("1.4142135623");
        let shown = format!("{}", i);
        assert!(shown.starts_with("1.41421"));
        assert!(shown.ends_with('?'));
    }
}
