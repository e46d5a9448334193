//! Irreducible factorisation over Q
//!
//! The classical Zassenhaus route: reduce to a monic square-free
//! polynomial, factor modulo a small prime with Berlekamp's algorithm,
//! Hensel-lift the modular factors past the Mignotte coefficient bound,
//! and recombine subsets that multiply to true integer factors.
//!
//! Degrees in this crate come from characteristic polynomials of edge
//! transition matrices, so inputs are small; clarity wins over
//! asymptotics throughout.

use num_bigint::BigInt;
use num_traits::One;

use super::Polynomial;

const SMALL_PRIMES: [u64; 28] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109,
];

/// Irreducible factors over Q of a square-free primitive polynomial,
/// each primitive with a positive leading coefficient, sorted by degree
/// then coefficients.
///
/// # Panics
/// Panics if no usable prime is found, which cannot happen for a
/// square-free input.
pub(crate) fn irreducible_factors(polynomial: &Polynomial) -> Vec<Polynomial> {
    let f = polynomial.primitive();
    assert!(f.degree() >= 1, "factoring a constant polynomial");
    if f.degree() == 1 {
        return vec![f];
    }

    let lead = f.leading_coefficient().clone();
    let monic = if lead.is_one() { f.clone() } else { monicise(&f) };

    let mut factors: Vec<Polynomial> = factor_monic(&monic)
        .into_iter()
        .map(|g| if lead.is_one() { g } else { substitute_scaled(&g, &lead).primitive() })
        .collect();

    factors.sort_by(|a, b| {
        a.degree().cmp(&b.degree()).then_with(|| a.coefficients().cmp(b.coefficients()))
    });
    debug_assert_eq!(
        factors.iter().fold(Polynomial::from_coeffs(&[1]), |acc, g| &acc * g).primitive(),
        f,
        "factorisation does not multiply back"
    );
    factors
}

/// `lc^(n-1) f(x / lc)`: monic with integer coefficients.
fn monicise(f: &Polynomial) -> Polynomial {
    let n = f.degree();
    let lead = f.leading_coefficient();
    Polynomial::new(
        f.coefficients()
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if i as i64 == n {
                    BigInt::one()
                } else {
                    a * lead.pow((n - 1 - i as i64) as u32)
                }
            })
            .collect(),
    )
}

/// `g(lc * x)`: undoes [`monicise`] on a factor.
fn substitute_scaled(g: &Polynomial, lead: &BigInt) -> Polynomial {
    Polynomial::new(
        g.coefficients()
            .iter()
            .enumerate()
            .map(|(i, a)| a * lead.pow(i as u32))
            .collect(),
    )
}

fn factor_monic(f: &Polynomial) -> Vec<Polynomial> {
    let p = SMALL_PRIMES
        .iter()
        .copied()
        .find(|&p| {
            let fp = ModPoly::from_polynomial(f, p);
            let fp_prime = ModPoly::from_polynomial(&f.derivative(), p);
            fp.degree() == f.degree() as isize && fp.gcd(&fp_prime).degree() == 0
        })
        .expect("a square-free polynomial stays square-free modulo some small prime");

    let modular = berlekamp(&ModPoly::from_polynomial(f, p));
    if modular.len() == 1 {
        return vec![f.clone()];
    }

    // Mignotte-style bound: coefficients of any monic factor are below
    // (n + 1) * 2^n * height(f); lift past twice that.
    let n = f.degree() as u32;
    let bound = BigInt::from(n + 1) * BigInt::from(2u32).pow(n) * f.height();
    let mut exponent = 1u32;
    let mut modulus = BigInt::from(p);
    while modulus <= BigInt::from(2) * &bound {
        modulus *= BigInt::from(p);
        exponent += 1;
    }

    let lifted = hensel_lift_tree(f.clone(), &modular, p, exponent);
    recombine(f.clone(), lifted, &modulus)
}

// ---------------------------------------------------------------------------
// Arithmetic in F_p[x]
// ---------------------------------------------------------------------------

/// Dense polynomial over `F_p` for a small prime `p`; constant first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModPoly {
    c: Vec<u64>,
    p: u64,
}

impl ModPoly {
    fn new(mut c: Vec<u64>, p: u64) -> Self {
        for x in &mut c {
            *x %= p;
        }
        while c.last() == Some(&0) {
            c.pop();
        }
        ModPoly { c, p }
    }

    fn from_polynomial(f: &Polynomial, p: u64) -> Self {
        let prime = BigInt::from(p);
        ModPoly::new(
            f.coefficients().iter().map(|a| a.mod_floor_u64(&prime)).collect(),
            p,
        )
    }

    fn zero(p: u64) -> Self {
        ModPoly { c: Vec::new(), p }
    }

    fn constant(value: u64, p: u64) -> Self {
        ModPoly::new(vec![value], p)
    }

    fn x(p: u64) -> Self {
        ModPoly::new(vec![0, 1], p)
    }

    fn degree(&self) -> isize {
        self.c.len() as isize - 1
    }

    fn is_zero(&self) -> bool {
        self.c.is_empty()
    }

    fn lead(&self) -> u64 {
        *self.c.last().expect("leading coefficient of zero polynomial")
    }

    fn inv_mod(a: u64, p: u64) -> u64 {
        // Fermat: a^(p-2) mod p.
        let mut result = 1u64;
        let mut base = a % p;
        let mut e = p - 2;
        while e > 0 {
            if e & 1 == 1 {
                result = result * base % p;
            }
            base = base * base % p;
            e >>= 1;
        }
        result
    }

    fn scale(&self, k: u64) -> ModPoly {
        ModPoly::new(self.c.iter().map(|&a| a * (k % self.p)).collect(), self.p)
    }

    fn monic(&self) -> ModPoly {
        if self.is_zero() {
            return self.clone();
        }
        self.scale(Self::inv_mod(self.lead(), self.p))
    }

    fn add(&self, other: &ModPoly) -> ModPoly {
        let n = self.c.len().max(other.c.len());
        ModPoly::new(
            (0..n)
                .map(|i| {
                    self.c.get(i).copied().unwrap_or(0) + other.c.get(i).copied().unwrap_or(0)
                })
                .collect(),
            self.p,
        )
    }

    fn sub(&self, other: &ModPoly) -> ModPoly {
        let n = self.c.len().max(other.c.len());
        ModPoly::new(
            (0..n)
                .map(|i| {
                    self.c.get(i).copied().unwrap_or(0) + self.p
                        - other.c.get(i).copied().unwrap_or(0) % self.p
                })
                .collect(),
            self.p,
        )
    }

    fn mul(&self, other: &ModPoly) -> ModPoly {
        if self.is_zero() || other.is_zero() {
            return ModPoly::zero(self.p);
        }
        let mut out = vec![0u64; self.c.len() + other.c.len() - 1];
        for (i, &a) in self.c.iter().enumerate() {
            for (j, &b) in other.c.iter().enumerate() {
                out[i + j] = (out[i + j] + a * b) % self.p;
            }
        }
        ModPoly::new(out, self.p)
    }

    /// `(quotient, remainder)` with `self = quotient * other + remainder`.
    fn divmod(&self, other: &ModPoly) -> (ModPoly, ModPoly) {
        assert!(!other.is_zero(), "division by zero in F_p[x]");
        let mut remainder = self.clone();
        if remainder.degree() < other.degree() {
            return (ModPoly::zero(self.p), remainder);
        }
        let mut quotient = vec![0u64; (remainder.degree() - other.degree() + 1) as usize];
        let lead_inv = Self::inv_mod(other.lead(), self.p);
        while !remainder.is_zero() && remainder.degree() >= other.degree() {
            let shift = (remainder.degree() - other.degree()) as usize;
            let factor = remainder.lead() * lead_inv % self.p;
            quotient[shift] = factor;
            let mut scaled = vec![0u64; shift];
            scaled.extend(other.c.iter().map(|&a| a * factor % self.p));
            remainder = remainder.sub(&ModPoly::new(scaled, self.p));
        }
        (ModPoly::new(quotient, self.p), remainder)
    }

    fn rem(&self, other: &ModPoly) -> ModPoly {
        self.divmod(other).1
    }

    fn gcd(&self, other: &ModPoly) -> ModPoly {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a.monic()
    }

    /// Extended Euclid: `(s, t)` with `s*self + t*other = gcd = 1`.
    fn bezout(&self, other: &ModPoly) -> (ModPoly, ModPoly) {
        let p = self.p;
        let (mut r0, mut r1) = (self.clone(), other.clone());
        let (mut s0, mut s1) = (ModPoly::constant(1, p), ModPoly::zero(p));
        let (mut t0, mut t1) = (ModPoly::zero(p), ModPoly::constant(1, p));
        while !r1.is_zero() {
            let (q, r) = r0.divmod(&r1);
            let s = s0.sub(&q.mul(&s1));
            let t = t0.sub(&q.mul(&t1));
            r0 = r1;
            r1 = r;
            s0 = s1;
            s1 = s;
            t0 = t1;
            t1 = t;
        }
        assert_eq!(r0.degree(), 0, "bezout of non-coprime polynomials");
        let scale = Self::inv_mod(r0.lead(), p);
        (s0.scale(scale), t0.scale(scale))
    }

    /// `base^e mod self`.
    fn pow_mod(&self, base: &ModPoly, mut e: u64) -> ModPoly {
        let mut result = ModPoly::constant(1, self.p);
        let mut base = base.rem(self);
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(&base).rem(self);
            }
            base = base.mul(&base).rem(self);
            e >>= 1;
        }
        result
    }
}

trait ModFloorU64 {
    fn mod_floor_u64(&self, p: &BigInt) -> u64;
}

impl ModFloorU64 for BigInt {
    fn mod_floor_u64(&self, p: &BigInt) -> u64 {
        use num_integer::Integer;
        let r = self.mod_floor(p);
        let (_, digits) = r.to_u64_digits();
        digits.first().copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Berlekamp factorisation over F_p
// ---------------------------------------------------------------------------

/// Factor a monic square-free polynomial over `F_p` into monic
/// irreducibles.
fn berlekamp(f: &ModPoly) -> Vec<ModPoly> {
    let p = f.p;
    let n = f.degree() as usize;

    // Frobenius matrix: column i holds x^(i*p) mod f.
    let xp = f.pow_mod(&ModPoly::x(p), p);
    let mut power = ModPoly::constant(1, p);
    let mut frobenius = vec![vec![0u64; n]; n];
    for column in frobenius.iter_mut().take(n) {
        for (row, entry) in column.iter_mut().enumerate() {
            *entry = power.c.get(row).copied().unwrap_or(0);
        }
        power = power.mul(&xp).rem(f);
    }
    // Nullspace of (Frobenius - I).
    for (i, column) in frobenius.iter_mut().enumerate() {
        column[i] = (column[i] + p - 1) % p;
    }
    let basis = nullspace_mod_p(&frobenius, p);
    let r = basis.len();
    let mut factors = vec![f.monic()];
    if r == 1 {
        return factors;
    }

    'outer: for vector in &basis {
        let v = ModPoly::new(vector.clone(), p);
        if v.degree() <= 0 {
            continue; // The constants split nothing.
        }
        let mut next = Vec::new();
        for u in factors.drain(..) {
            if u.degree() <= 1 {
                next.push(u);
                continue;
            }
            let mut pieces = Vec::new();
            let mut rest = u.clone();
            for s in 0..p {
                if rest.degree() <= 0 {
                    break;
                }
                let g = rest.gcd(&v.sub(&ModPoly::constant(s, p)));
                if g.degree() >= 1 {
                    let (q, _) = rest.divmod(&g);
                    pieces.push(g);
                    rest = q;
                }
            }
            if pieces.is_empty() {
                next.push(u);
            } else {
                next.extend(pieces);
            }
        }
        factors = next;
        if factors.len() == r {
            break 'outer;
        }
    }
    factors.into_iter().map(|g| g.monic()).collect()
}

/// Basis of the nullspace of a square matrix over `F_p` (columns are
/// vectors; the matrix is given column-major).
fn nullspace_mod_p(columns: &[Vec<u64>], p: u64) -> Vec<Vec<u64>> {
    let n = columns.len();
    // Row-major working copy of the transpose-free system M v = 0 where
    // M[r][c] = columns[c][r].
    let mut m = vec![vec![0u64; n]; n];
    for (c, column) in columns.iter().enumerate() {
        for (r, &value) in column.iter().enumerate() {
            m[r][c] = value;
        }
    }
    let mut pivot_of_column = vec![None; n];
    let mut rank = 0;
    for col in 0..n {
        let pivot_row = (rank..n).find(|&r| m[r][col] != 0);
        let Some(pivot_row) = pivot_row else { continue };
        m.swap(rank, pivot_row);
        let inv = ModPoly::inv_mod(m[rank][col], p);
        for x in m[rank].iter_mut() {
            *x = *x * inv % p;
        }
        for r in 0..n {
            if r != rank && m[r][col] != 0 {
                let factor = m[r][col];
                let pivot = m[rank].clone();
                for (x, &pv) in m[r].iter_mut().zip(pivot.iter()) {
                    *x = (*x + (p - factor % p) * pv) % p;
                }
            }
        }
        pivot_of_column[col] = Some(rank);
        rank += 1;
    }

    let mut basis = Vec::new();
    for free in 0..n {
        if pivot_of_column[free].is_some() {
            continue;
        }
        let mut v = vec![0u64; n];
        v[free] = 1;
        for col in 0..n {
            if let Some(row) = pivot_of_column[col] {
                v[col] = (p - m[row][free] % p) % p;
            }
        }
        basis.push(v);
    }
    basis
}

// ---------------------------------------------------------------------------
// Hensel lifting
// ---------------------------------------------------------------------------

/// Symmetric representative in `(-m/2, m/2]`.
fn symmetric(value: &BigInt, modulus: &BigInt) -> BigInt {
    use num_integer::Integer;
    let r = value.mod_floor(modulus);
    if &r * 2 > *modulus { r - modulus } else { r }
}

fn reduce_symmetric(f: &Polynomial, modulus: &BigInt) -> Polynomial {
    Polynomial::new(f.coefficients().iter().map(|c| symmetric(c, modulus)).collect())
}

fn lift_symmetric(f: &ModPoly) -> Polynomial {
    let p = BigInt::from(f.p);
    Polynomial::new(f.c.iter().map(|&a| symmetric(&BigInt::from(a), &p)).collect())
}

/// Lift the modular factorisation of a monic `f` to `mod p^exponent`,
/// one factor per input factor.
fn hensel_lift_tree(f: Polynomial, factors: &[ModPoly], p: u64, exponent: u32) -> Vec<Polynomial> {
    if factors.len() == 1 {
        let modulus = BigInt::from(p).pow(exponent);
        return vec![reduce_symmetric(&f, &modulus)];
    }
    let half = factors.len() / 2;
    let (left, right) = factors.split_at(half);
    let g0 = left.iter().fold(ModPoly::constant(1, p), |acc, x| acc.mul(x));
    let h0 = right.iter().fold(ModPoly::constant(1, p), |acc, x| acc.mul(x));
    let (g, h) = hensel_pair_lift(&f, &g0, &h0, p, exponent);
    let mut out = hensel_lift_tree(g, left, p, exponent);
    out.extend(hensel_lift_tree(h, right, p, exponent));
    out
}

/// Lift `f = g0 * h0 (mod p)` to `f = G * H (mod p^exponent)` with
/// monic `G`, `H` congruent to `g0`, `h0` mod `p`.
fn hensel_pair_lift(
    f: &Polynomial,
    g0: &ModPoly,
    h0: &ModPoly,
    p: u64,
    exponent: u32,
) -> (Polynomial, Polynomial) {
    let (sigma, tau) = g0.bezout(h0);
    let mut g = lift_symmetric(&g0.monic());
    let mut h = lift_symmetric(&h0.monic());
    let big_p = BigInt::from(p);
    let mut q = big_p.clone();
    for _ in 1..exponent {
        // f - g h is divisible by q; the quotient drives the correction.
        let delta = f - &(&g * &h);
        let quotient = Polynomial::new(delta.coefficients().iter().map(|c| c / &q).collect());
        let d = ModPoly::from_polynomial(&quotient, p);
        // u h0 + v g0 = d with deg u < deg g0.
        let (qd, u) = tau.mul(&d).divmod(g0);
        let v = sigma.mul(&d).add(&qd.mul(h0));
        let v = v.rem(h0);
        g = &g + &scale_poly(&lift_symmetric(&u), &q);
        h = &h + &scale_poly(&lift_symmetric(&v), &q);
        q *= &big_p;
    }
    let modulus = BigInt::from(p).pow(exponent);
    (reduce_symmetric(&g, &modulus), reduce_symmetric(&h, &modulus))
}

fn scale_poly(f: &Polynomial, k: &BigInt) -> Polynomial {
    Polynomial::new(f.coefficients().iter().map(|c| c * k).collect())
}

// ---------------------------------------------------------------------------
// Recombination
// ---------------------------------------------------------------------------

/// Combine lifted modular factors into true irreducible integer factors
/// of the monic polynomial `f`.
fn recombine(f: Polynomial, lifted: Vec<Polynomial>, modulus: &BigInt) -> Vec<Polynomial> {
    let mut remaining = lifted;
    let mut current = f;
    let mut result = Vec::new();
    let mut size = 1;
    while 2 * size <= remaining.len() {
        let mut advanced = false;
        for subset in combinations(remaining.len(), size) {
            let candidate = subset
                .iter()
                .fold(Polynomial::from_coeffs(&[1]), |acc, &i| &acc * &remaining[i]);
            let candidate = reduce_symmetric(&candidate, modulus);
            if let Some(quotient) = current.divide_exact(&candidate) {
                result.push(candidate);
                current = quotient;
                // Drop the consumed modular factors, highest index first.
                for &i in subset.iter().rev() {
                    remaining.remove(i);
                }
                advanced = true;
                break;
            }
        }
        if !advanced {
            size += 1;
        }
    }
    if current.degree() >= 1 {
        result.push(current);
    }
    result
}

/// All `size`-element index subsets of `0..n` in lexicographic order.
fn combinations(n: usize, size: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut stack = vec![(Vec::new(), 0)];
    while let Some((prefix, start)) = stack.pop() {
        if prefix.len() == size {
            out.push(prefix);
            continue;
        }
        // Reverse order so lexicographically smaller subsets pop first.
        for first in (start..n).rev() {
            let mut next = prefix.clone();
            next.push(first);
            stack.push((next, first + 1));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(coeffs: &[i64]) -> Polynomial {
        Polynomial::from_coeffs(coeffs)
    }

    #[test]
    fn test_irreducible_quadratic() {
        let factors = irreducible_factors(&poly(&[-2, 0, 1])); // x^2 - 2
        assert_eq!(factors, vec![poly(&[-2, 0, 1])]);
    }

    #[test]
    fn test_splits_linear_from_quadratic() {
        // (x - 1)(x^2 - 3x + 1) = x^3 - 4x^2 + 4x - 1
        let factors = irreducible_factors(&poly(&[-1, 4, -4, 1]));
        assert_eq!(factors, vec![poly(&[-1, 1]), poly(&[1, -3, 1])]);
    }

    #[test]
    fn test_two_quadratics() {
        // (x^2 - 2)(x^2 - 3) = x^4 - 5x^2 + 6
        let factors = irreducible_factors(&poly(&[6, 0, -5, 0, 1]));
        assert_eq!(factors, vec![poly(&[-3, 0, 1]), poly(&[-2, 0, 1])]);
    }

    #[test]
    fn test_cyclotomic_like() {
        // x^4 - 1 = (x-1)(x+1)(x^2+1).
        let factors = irreducible_factors(&poly(&[-1, 0, 0, 0, 1]));
        assert_eq!(factors, vec![poly(&[-1, 1]), poly(&[1, 1]), poly(&[1, 0, 1])]);
    }

    #[test]
    fn test_non_monic() {
        // (2x - 1)(x + 3) = 2x^2 + 5x - 3
        let factors = irreducible_factors(&poly(&[-3, 5, 2]));
        assert_eq!(factors, vec![poly(&[-1, 2]), poly(&[3, 1])]);
    }

    #[test]
    fn test_irreducible_quartic() {
        // x^4 - 2x^3 - 2x + 1: the aBC dilatation polynomial.
        let factors = irreducible_factors(&poly(&[1, -2, 0, -2, 1]));
        assert_eq!(factors.len(), 1);
    }

    #[test]
    fn test_mod_poly_gcd() {
        let p = 7;
        // (x + 1)(x + 2) and (x + 1)(x + 3) share x + 1.
        let a = ModPoly::new(vec![2, 3, 1], p);
        let b = ModPoly::new(vec![3, 4, 1], p);
        assert_eq!(a.gcd(&b), ModPoly::new(vec![1, 1], p));
    }

    #[test]
    fn test_bezout() {
        let p = 5;
        let a = ModPoly::new(vec![1, 1], p); // x + 1
        let b = ModPoly::new(vec![2, 1], p); // x + 2
        let (s, t) = a.bezout(&b);
        let one = a.mul(&s).add(&b.mul(&t));
        assert_eq!(one, ModPoly::constant(1, p));
    }
}
