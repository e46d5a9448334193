//! Dense exact matrices
//!
//! [`Matrix`] is generic over its entry ring through the [`Entry`]
//! trait; the two rings in use are the integers and a fixed real number
//! field. Elimination is fraction-free (Bareiss), so every intermediate
//! value stays in the ring: the pivot divisions are exact because each
//! entry is a minor of the original matrix.
//!
//! Kernels are computed from the echelon form by signed maximal minors,
//! which keeps number-field kernels inside `Z[lambda]` without ever
//! inverting a field element.

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::polynomial::Polynomial;

/// Ring operations elimination needs. `exact_div` may assume the
/// division is exact (Bareiss guarantees it) and should panic otherwise:
/// a failed exact division is a programming error, not an input error.
pub trait Entry: Clone + PartialEq + fmt::Debug {
    /// Additive test.
    fn is_zero_entry(&self) -> bool;
    /// Sum.
    fn add_entry(&self, other: &Self) -> Self;
    /// Difference.
    fn sub_entry(&self, other: &Self) -> Self;
    /// Product.
    fn mul_entry(&self, other: &Self) -> Self;
    /// Negation.
    fn neg_entry(&self) -> Self;
    /// Exact ring division.
    fn exact_div_entry(&self, other: &Self) -> Self;
}

impl Entry for BigInt {
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
        let (quotient, remainder) = self.div_rem(other);
        assert!(remainder.is_zero(), "inexact integer division in elimination");
        quotient
    }
}

/// A dense rectangular matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    rows: Vec<Vec<T>>,
    width: usize,
}

impl<T: Entry> Matrix<T> {
    /// Build from rows.
    ///
    /// # Panics
    /// Panics if the rows are ragged.
    pub fn new(rows: Vec<Vec<T>>) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        assert!(rows.iter().all(|r| r.len() == width), "ragged matrix rows");
        Matrix { rows, width }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row slices.
    pub fn rows(&self) -> &[Vec<T>] {
        &self.rows
    }

    /// A single entry.
    pub fn entry(&self, row: usize, column: usize) -> &T {
        &self.rows[row][column]
    }

    /// Columns become rows.
    pub fn transpose(&self) -> Matrix<T> {
        Matrix::new(
            (0..self.width)
                .map(|c| self.rows.iter().map(|r| r[c].clone()).collect())
                .collect(),
        )
    }

    /// Stack `other` below `self`.
    pub fn join(&self, other: &Matrix<T>) -> Matrix<T> {
        assert_eq!(self.width, other.width, "joining matrices of different widths");
        let mut rows = self.rows.clone();
        rows.extend(other.rows.clone());
        Matrix::new(rows)
    }

    /// Apply the matrix to a column vector.
    pub fn apply(&self, vector: &[T]) -> Vec<T> {
        assert_eq!(vector.len(), self.width, "vector length does not match matrix width");
        self.rows.iter().map(|row| dot(row, vector)).collect()
    }

    /// Entrywise sum.
    pub fn add(&self, other: &Matrix<T>) -> Matrix<T> {
        assert_eq!(
            (self.height(), self.width),
            (other.height(), other.width),
            "adding matrices of different shapes"
        );
        Matrix::new(
            self.rows
                .iter()
                .zip(other.rows.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| x.add_entry(y)).collect())
                .collect(),
        )
    }

    /// Entrywise difference.
    pub fn sub(&self, other: &Matrix<T>) -> Matrix<T> {
        assert_eq!(
            (self.height(), self.width),
            (other.height(), other.width),
            "subtracting matrices of different shapes"
        );
        Matrix::new(
            self.rows
                .iter()
                .zip(other.rows.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| x.sub_entry(y)).collect())
                .collect(),
        )
    }

    /// Matrix product.
    pub fn compose(&self, other: &Matrix<T>) -> Matrix<T> {
        assert_eq!(self.width, other.height(), "matrix dimensions do not compose");
        let transposed = other.transpose();
        Matrix::new(
            self.rows
                .iter()
                .map(|row| transposed.rows.iter().map(|col| dot(row, col)).collect())
                .collect(),
        )
    }

    /// A zero entry of the ring, synthesised from an existing entry.
    fn zero_entry(&self) -> T {
        let witness = &self.rows[0][0];
        witness.sub_entry(witness)
    }

    /// Fraction-free Gaussian elimination. Returns the echelon matrix,
    /// the pivot columns and the sign of the row permutation used.
    pub fn echelon(&self) -> (Matrix<T>, Vec<usize>, i32) {
        let mut m = self.rows.clone();
        let mut pivots = Vec::new();
        let mut sign = 1;
        let mut previous: Option<T> = None;
        let mut rank = 0;
        for column in 0..self.width {
            let Some(pivot_row) = (rank..m.len()).find(|&r| !m[r][column].is_zero_entry())
            else {
                continue;
            };
            if pivot_row != rank {
                m.swap(rank, pivot_row);
                sign = -sign;
            }
            let pivot = m[rank][column].clone();
            for r in rank + 1..m.len() {
                let lead = m[r][column].clone();
                for c in 0..self.width {
                    let mut value =
                        pivot.mul_entry(&m[r][c]).sub_entry(&lead.mul_entry(&m[rank][c]));
                    if let Some(p) = &previous {
                        value = value.exact_div_entry(p);
                    }
                    m[r][c] = value;
                }
            }
            previous = Some(pivot);
            pivots.push(column);
            rank += 1;
            if rank == m.len() {
                break;
            }
        }
        (Matrix::new(m), pivots, sign)
    }

    /// Determinant of a square matrix: the last Bareiss pivot, adjusted
    /// by the row-swap sign.
    pub fn determinant(&self) -> T {
        assert_eq!(self.height(), self.width, "determinant of a non-square matrix");
        let n = self.width;
        if n == 0 {
            panic!("determinant of an empty matrix");
        }
        let (echelon, pivots, sign) = self.echelon();
        if pivots.len() < n {
            return self.zero_entry();
        }
        let value = echelon.rows[n - 1][pivots[n - 1]].clone();
        if sign < 0 { value.neg_entry() } else { value }
    }

    /// A basis for the kernel, one vector per free column, with entries
    /// in the ring (signed maximal minors of the echelon form).
    pub fn kernel(&self) -> Vec<Vec<T>> {
        let (echelon, pivots, _) = self.echelon();
        let rank = pivots.len();
        let zero = self.zero_entry();
        let mut basis = Vec::new();
        for free in (0..self.width).filter(|c| !pivots.contains(c)) {
            let mut columns: Vec<usize> = pivots.clone();
            columns.push(free);
            columns.sort_unstable();
            // r x (r+1) submatrix of the nonzero echelon rows.
            let sub: Vec<Vec<T>> = (0..rank)
                .map(|r| columns.iter().map(|&c| echelon.rows[r][c].clone()).collect())
                .collect();
            let mut vector = vec![zero.clone(); self.width];
            for (t, &column) in columns.iter().enumerate() {
                let minor: Vec<Vec<T>> = sub
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter(|(i, _)| *i != t)
                            .map(|(_, v)| v.clone())
                            .collect()
                    })
                    .collect();
                let value = if rank == 0 {
                    // Empty minor: the kernel vector is a unit vector.
                    if column == free { self.make_one() } else { zero.clone() }
                } else {
                    Matrix::new(minor).determinant()
                };
                vector[column] = if t % 2 == 0 { value } else { value.neg_entry() };
            }
            debug_assert!(
                self.apply(&vector).iter().all(Entry::is_zero_entry),
                "kernel vector fails to annihilate"
            );
            basis.push(vector);
        }
        basis
    }

    // With no rows to eliminate the ring has no obvious unit; fall back
    // to a pivot-free construction only integer callers can reach.
    fn make_one(&self) -> T {
        let witness = &self.rows[0][0];
        if !witness.is_zero_entry() {
            return witness.exact_div_entry(witness);
        }
        for row in &self.rows {
            for value in row {
                if !value.is_zero_entry() {
                    return value.exact_div_entry(value);
                }
            }
        }
        panic!("cannot synthesise a unit from the zero matrix");
    }
}

fn dot<T: Entry>(a: &[T], b: &[T]) -> T {
    assert_eq!(a.len(), b.len(), "dot product of different lengths");
    assert!(!a.is_empty(), "dot product of empty vectors");
    let mut total = a[0].mul_entry(&b[0]);
    for (x, y) in a.iter().zip(b.iter()).skip(1) {
        total = total.add_entry(&x.mul_entry(y));
    }
    total
}

impl<T: Entry> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{:?}", row)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Integer matrices
// ---------------------------------------------------------------------------

impl Matrix<BigInt> {
    /// The n x n identity.
    pub fn identity(n: usize) -> Self {
        Matrix::new(
            (0..n)
                .map(|r| (0..n).map(|c| if r == c { BigInt::one() } else { BigInt::zero() }).collect())
                .collect(),
        )
    }

    /// The h x w zero matrix.
    pub fn zero(height: usize, width: usize) -> Self {
        Matrix { rows: vec![vec![BigInt::zero(); width]; height], width }
    }

    /// Build from machine integers.
    pub fn from_rows(rows: &[&[i64]]) -> Self {
        Matrix::new(rows.iter().map(|r| r.iter().map(|&v| BigInt::from(v)).collect()).collect())
    }

    /// Integer power by repeated squaring.
    pub fn pow(&self, power: u32) -> Matrix<BigInt> {
        assert_eq!(self.height(), self.width, "power of a non-square matrix");
        match power {
            0 => Matrix::identity(self.width),
            1 => self.clone(),
            _ => {
                let sqrt = self.pow(power / 2);
                let square = sqrt.compose(&sqrt);
                if power % 2 == 1 { square.compose(self) } else { square }
            }
        }
    }

    /// Trace.
    pub fn trace(&self) -> BigInt {
        assert_eq!(self.height(), self.width, "trace of a non-square matrix");
        (0..self.width).map(|i| &self.rows[i][i]).sum()
    }

    /// `det(x I - A)` by the Faddeev-LeVerrier recurrence; every
    /// division is exact.
    pub fn characteristic_polynomial(&self) -> Polynomial {
        assert_eq!(self.height(), self.width, "characteristic polynomial of a non-square matrix");
        let n = self.width;
        let mut coefficients = vec![BigInt::zero(); n + 1];
        coefficients[n] = BigInt::one();
        let mut m = Matrix::identity(n);
        for k in 1..=n {
            let am = self.compose(&m);
            let c = -am.trace() / BigInt::from(k);
            coefficients[n - k] = c.clone();
            m = am;
            for i in 0..n {
                m.rows[i][i] = &m.rows[i][i] + &c;
            }
        }
        Polynomial::new(coefficients)
    }

    /// Whether every coordinate of `M v` is nonnegative.
    pub fn nonnegative_image(&self, vector: &[BigInt]) -> bool {
        self.apply(vector).iter().all(|x| !x.is_negative())
    }

    /// Kernel basis scaled to primitive integer vectors.
    pub fn integral_kernel(&self) -> Vec<Vec<BigInt>> {
        self.kernel()
            .into_iter()
            .map(|vector| {
                let mut content = BigInt::zero();
                for v in &vector {
                    content = content.gcd(v);
                }
                if content.is_zero() || content.is_one() {
                    vector
                } else {
                    vector.into_iter().map(|v| v / &content).collect()
                }
            })
            .collect()
    }

    /// Solve `self * x = rhs` exactly over the rationals, if a unique
    /// solution exists.
    pub fn solve_rational(&self, rhs: &[BigInt]) -> Option<Vec<BigRational>> {
        assert_eq!(self.height(), self.width, "rational solve needs a square matrix");
        assert_eq!(rhs.len(), self.width, "right-hand side length mismatch");
        let n = self.width;
        let mut m: Vec<Vec<BigRational>> = self
            .rows
            .iter()
            .zip(rhs.iter())
            .map(|(row, b)| {
                row.iter()
                    .map(|v| BigRational::from(v.clone()))
                    .chain(std::iter::once(BigRational::from(b.clone())))
                    .collect()
            })
            .collect();
        for column in 0..n {
            let pivot_row = (column..n).find(|&r| !m[r][column].is_zero())?;
            m.swap(column, pivot_row);
            let pivot = m[column][column].clone();
            for c in column..=n {
                m[column][c] = &m[column][c] / &pivot;
            }
            for r in 0..n {
                if r != column && !m[r][column].is_zero() {
                    let factor = m[r][column].clone();
                    for c in column..=n {
                        let delta = &factor * &m[column][c];
                        m[r][c] = &m[r][c] - &delta;
                    }
                }
            }
        }
        Some(m.into_iter().map(|row| row[n].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_and_apply() {
        let a = Matrix::from_rows(&[&[1, 2], &[3, 4]]);
        let b = Matrix::from_rows(&[&[0, 1], &[1, 0]]);
        let ab = a.compose(&b);
        assert_eq!(ab, Matrix::from_rows(&[&[2, 1], &[4, 3]]));
        let v = vec![BigInt::from(1), BigInt::from(1)];
        assert_eq!(a.apply(&v), vec![BigInt::from(3), BigInt::from(7)]);
    }

    #[test]
    fn test_pow() {
        let a = Matrix::from_rows(&[&[1, 1], &[1, 0]]);
        let a6 = a.pow(6);
        // Fibonacci: F(7) = 13.
        assert_eq!(*a6.entry(0, 0), BigInt::from(13));
    }

    #[test]
    fn test_determinant() {
        let a = Matrix::from_rows(&[&[2, 0, 1], &[1, 1, 0], &[0, 3, 1]]);
        assert_eq!(a.determinant(), BigInt::from(5));
        let singular = Matrix::from_rows(&[&[1, 2], &[2, 4]]);
        assert_eq!(singular.determinant(), BigInt::zero());
    }

    #[test]
    fn test_characteristic_polynomial() {
        // [[2, 1], [1, 1]] has char poly x^2 - 3x + 1.
        let a = Matrix::from_rows(&[&[2, 1], &[1, 1]]);
        assert_eq!(a.characteristic_polynomial(), Polynomial::from_coeffs(&[1, -3, 1]));
    }

    #[test]
    fn test_kernel() {
        // Rank one: kernel is two dimensional.
        let a = Matrix::from_rows(&[&[1, 2, 3], &[2, 4, 6]]);
        let kernel = a.integral_kernel();
        assert_eq!(kernel.len(), 2);
        for vector in &kernel {
            assert!(a.apply(vector).iter().all(Zero::is_zero));
        }
    }

    #[test]
    fn test_kernel_of_eigen_system() {
        // [[1,1],[1,0]] - phi I over Z is not integer; instead check an
        // integer eigen-kernel: [[2,2],[2,2]] - 4I has kernel (1, 1).
        let a = Matrix::from_rows(&[&[-2, 2], &[2, -2]]);
        let kernel = a.integral_kernel();
        assert_eq!(kernel.len(), 1);
        let v = &kernel[0];
        assert_eq!(v[0], v[1]);
    }

    #[test]
    fn test_solve_rational() {
        let a = Matrix::from_rows(&[&[2, 0], &[0, 4]]);
        let rhs = vec![BigInt::from(1), BigInt::from(2)];
        let x = a.solve_rational(&rhs).expect("solvable");
        assert_eq!(x[0], BigRational::new(1.into(), 2.into()));
        assert_eq!(x[1], BigRational::new(1.into(), 2.into()));
    }

    #[test]
    fn test_nonnegative_image() {
        let a = Matrix::from_rows(&[&[1, -1], &[0, 1]]);
        assert!(a.nonnegative_image(&[BigInt::from(2), BigInt::from(1)]));
        assert!(!a.nonnegative_image(&[BigInt::from(1), BigInt::from(2)]));
    }

    #[test]
    fn test_echelon_pivots() {
        let a = Matrix::from_rows(&[&[0, 1, 2], &[1, 0, 1], &[1, 1, 3]]);
        let (_, pivots, _) = a.echelon();
        assert_eq!(pivots, vec![0, 1]);
    }
}
