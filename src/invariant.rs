//! Invariant laminations of aperiodic mapping classes
//!
//! Given a non-periodic encoding, find its invariant projective
//! measured lamination and stretch factor: for each linear cell the
//! encoding is driven through, take the cell's integer action matrix,
//! enumerate the real eigenvalues above one in decreasing order, and
//! look for an eigenvector inside the cone of laminations. Everything
//! is exact: eigenvalues are isolated polynomial roots, eigenvectors
//! live in `Z[eigenvalue]`, and cone membership is decided by certified
//! signs.
//!
//! The eigenvalue/kernel steps go through [`EigenvectorOracle`], so a
//! symbolic backend can be substituted for the built-in pure
//! implementation.

use std::cmp::Ordering;
use std::sync::Arc;

use log::debug;
use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::encoding::Encoding;
use crate::error::{AbortSignal, Error, Result, check_abort};
use crate::lamination::{AlgebraicLamination, Lamination};
use crate::matrix::Matrix;
use crate::numberfield::{NumberField, NumberFieldElement};
use crate::polynomial::{Polynomial, PolynomialRoot};
use crate::triangulation::{Triangulation, norm};

/// How many times each key curve is pushed through the encoding while
/// hunting for the invariant cell.
const MAX_CELL_POWER: usize = 64;

/// The narrow contract a symbolic backend must satisfy to replace the
/// pure eigenvector machinery.
pub trait EigenvectorOracle {
    /// All real roots of the polynomial, canonicalised and sorted in
    /// descending order.
    fn real_roots(&self, polynomial: &Polynomial) -> Result<Vec<PolynomialRoot>>;

    /// A basis of the kernel of a matrix over a number field.
    fn kernel_basis(
        &self,
        matrix: &Matrix<NumberFieldElement>,
    ) -> Result<Vec<Vec<NumberFieldElement>>>;
}

/// The built-in oracle: Sturm isolation and fraction-free elimination.
#[derive(Debug, Clone, Copy, Default)]
pub struct PureOracle;

impl EigenvectorOracle for PureOracle {
    fn real_roots(&self, polynomial: &Polynomial) -> Result<Vec<PolynomialRoot>> {
        polynomial.real_roots()
    }

    fn kernel_basis(
        &self,
        matrix: &Matrix<NumberFieldElement>,
    ) -> Result<Vec<Vec<NumberFieldElement>>> {
        Ok(matrix.kernel())
    }
}

/// The invariant data of a pseudo-Anosov mapping class: the field
/// `Q(dilatation)`, the dilatation (its generator), and the projective
/// lamination, normalised to a positive total weight.
#[derive(Debug, Clone)]
pub struct InvariantLamination {
    /// `Q(dilatation)`.
    pub field: Arc<NumberField>,
    /// The stretch factor as the generator of the field.
    pub dilatation: NumberFieldElement,
    /// The invariant lamination with weights in the field.
    pub lamination: AlgebraicLamination,
}

/// Rows asserting the triangle inequality of every face: for each
/// corner, (sum of adjacent sides) - (opposite side) is nonnegative.
pub fn triangle_inequality_matrix(triangulation: &Triangulation) -> Matrix<BigInt> {
    let zeta = triangulation.zeta();
    let mut rows = Vec::with_capacity(3 * triangulation.num_triangles());
    for triangle in triangulation.triangles() {
        for k in 0..3 {
            let mut row = vec![BigInt::zero(); zeta];
            row[norm(triangle[k])] += 1;
            row[norm(triangle[(k + 2) % 3])] += 1;
            row[norm(triangle[(k + 1) % 3])] -= 1;
            rows.push(row);
        }
    }
    Matrix::new(rows)
}

/// Search the action of one cell for a directed eigenvector: an
/// eigenvalue above one whose eigenspace meets the cone cut out by
/// nonnegativity and `condition`.
pub fn directed_eigenvector(
    action: &Matrix<BigInt>,
    condition: &Matrix<BigInt>,
    oracle: &dyn EigenvectorOracle,
) -> Result<(Arc<NumberField>, Vec<NumberFieldElement>)> {
    let characteristic = action.characteristic_polynomial().square_free();
    let one = BigInt::one();
    let eigenvalues: Vec<PolynomialRoot> = oracle
        .real_roots(&characteristic)?
        .into_iter()
        .filter(|root| root.clone().compare_integer(&one) == Ordering::Greater)
        .collect();

    for eigenvalue in eigenvalues {
        debug!("trying eigenvalue root of {}", eigenvalue.polynomial());
        let field = NumberField::new(eigenvalue)?;
        let lambda = field.generator();
        // action - lambda I over the field.
        let shifted = Matrix::new(
            action
                .rows()
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(j, entry)| {
                            let lifted = field.from_integer(entry.clone());
                            if i == j { &lifted - &lambda } else { lifted }
                        })
                        .collect()
                })
                .collect(),
        );
        let kernel = oracle.kernel_basis(&shifted)?;
        match kernel.len() {
            0 => continue,
            1 => {
                let mut eigenvector = kernel.into_iter().next().expect("one basis vector");
                let total = sum_vector(&field, &eigenvector);
                if total.sign()? == Ordering::Less {
                    eigenvector = eigenvector.iter().map(|x| -x).collect();
                }
                if vector_nonnegative(&eigenvector)?
                    && image_nonnegative(condition, &eigenvector, &field)?
                {
                    return Ok((field, eigenvector));
                }
            }
            _ => {
                // The eigenspace is bigger; search its intersection with
                // the cone directly.
                let transpose_columns: Vec<Vec<NumberFieldElement>> = kernel.clone();
                let zeta = action.width();
                let mut rows: Vec<Vec<NumberFieldElement>> = (0..zeta)
                    .map(|coordinate| {
                        transpose_columns.iter().map(|v| v[coordinate].clone()).collect()
                    })
                    .collect();
                for condition_row in condition.rows() {
                    rows.push(
                        transpose_columns
                            .iter()
                            .map(|v| dot_int(condition_row, v, &field))
                            .collect(),
                    );
                }
                let system = Matrix::new(rows);
                let strict: Vec<NumberFieldElement> =
                    transpose_columns.iter().map(|v| sum_vector(&field, v)).collect();
                match system.find_vector_with_nonnegative_image(&strict) {
                    Ok(combination) => {
                        let eigenvector: Vec<NumberFieldElement> = (0..zeta)
                            .map(|coordinate| {
                                let mut total = field.zero();
                                for (v, c) in kernel.iter().zip(combination.iter()) {
                                    total = &total + &(&v[coordinate] * c);
                                }
                                total
                            })
                            .collect();
                        return Ok((field, eigenvector));
                    }
                    Err(Error::Assumption(_)) => continue,
                    Err(error) => return Err(error),
                }
            }
        }
    }
    Err(Error::computation("no interesting eigenvalues in cell"))
}

fn sum_vector(field: &Arc<NumberField>, vector: &[NumberFieldElement]) -> NumberFieldElement {
    let mut total = field.zero();
    for x in vector {
        total = &total + x;
    }
    total
}

fn vector_nonnegative(vector: &[NumberFieldElement]) -> Result<bool> {
    for x in vector {
        if x.sign()? == Ordering::Less {
            return Ok(false);
        }
    }
    Ok(true)
}

fn dot_int(
    row: &[BigInt],
    vector: &[NumberFieldElement],
    field: &Arc<NumberField>,
) -> NumberFieldElement {
    let mut total = field.zero();
    for (c, x) in row.iter().zip(vector.iter()) {
        if !c.is_zero() {
            total = &total + &x.scale(c);
        }
    }
    total
}

fn image_nonnegative(
    matrix: &Matrix<BigInt>,
    vector: &[NumberFieldElement],
    field: &Arc<NumberField>,
) -> Result<bool> {
    for row in matrix.rows() {
        if dot_int(row, vector, field).sign()? == Ordering::Less {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Find the invariant lamination and dilatation of an aperiodic mapping
/// class, driving key curves through powers of the encoding to visit
/// its linear cells.
///
/// Fails with [`Error::Computation`] when every visited cell is
/// exhausted, which in practice means the class is reducible.
pub fn invariant_lamination(
    encoding: &Encoding,
    oracle: &dyn EigenvectorOracle,
    abort: Option<AbortSignal<'_>>,
) -> Result<InvariantLamination> {
    assert!(encoding.is_mapping_class(), "invariant laminations need a mapping class");
    let triangle_rows = triangle_inequality_matrix(encoding.source());
    let mut seen_cells: Vec<(Matrix<BigInt>, Matrix<BigInt>)> = Vec::new();

    let curves: Vec<Lamination<BigInt>> = encoding
        .source()
        .key_curve_vectors()
        .into_iter()
        .map(|weights| Lamination::new_unchecked(Arc::clone(encoding.source()), weights))
        .collect();

    for curve in curves {
        let mut current = curve;
        for power in 0..MAX_CELL_POWER {
            check_abort(abort, "invariant_lamination")?;
            let (action, cell) = encoding.applied_matrices(&current)?;
            let condition = cell.join(&triangle_rows);
            let key = (action, condition);
            if !seen_cells.contains(&key) {
                debug!("invariant lamination: new cell at power {}", power);
                let (action, condition) = &key;
                match directed_eigenvector(action, condition, oracle) {
                    Ok((field, eigenvector)) => {
                        let lamination = Lamination::new_unchecked(
                            Arc::clone(encoding.source()),
                            eigenvector,
                        );
                        let dilatation = field.generator();
                        return Ok(InvariantLamination { field, dilatation, lamination });
                    }
                    Err(Error::Computation(_)) => {}
                    Err(error) => return Err(error),
                }
                seen_cells.push(key);
            }
            current = encoding.apply(&current)?;
        }
    }
    Err(Error::computation("probably reducible: no cell carries an invariant lamination"))
}

// ---------------------------------------------------------------------------
// Exact cone feasibility over an ordered number field
// ---------------------------------------------------------------------------

/// A fraction of field elements with a positive denominator.
#[derive(Clone)]
struct FieldFraction {
    numerator: NumberFieldElement,
    denominator: NumberFieldElement,
}

impl FieldFraction {
    fn new(numerator: NumberFieldElement, denominator: NumberFieldElement) -> Result<Self> {
        match denominator.sign()? {
            Ordering::Greater => Ok(FieldFraction { numerator, denominator }),
            Ordering::Less => {
                Ok(FieldFraction { numerator: -&numerator, denominator: -&denominator })
            }
            Ordering::Equal => Err(Error::approximation("fraction with zero denominator")),
        }
    }

    fn from_integer(field: &Arc<NumberField>, n: i64) -> FieldFraction {
        FieldFraction {
            numerator: field.from_integer(BigInt::from(n)),
            denominator: field.one(),
        }
    }

    fn add(&self, other: &FieldFraction) -> FieldFraction {
        FieldFraction {
            numerator: &(&self.numerator * &other.denominator)
                + &(&other.numerator * &self.denominator),
            denominator: &self.denominator * &other.denominator,
        }
    }

    fn mul_element(&self, x: &NumberFieldElement) -> FieldFraction {
        FieldFraction {
            numerator: &self.numerator * x,
            denominator: self.denominator.clone(),
        }
    }

    fn div_element(&self, x: &NumberFieldElement) -> Result<FieldFraction> {
        FieldFraction::new(self.numerator.clone(), &self.denominator * x)
    }

    fn neg(&self) -> FieldFraction {
        FieldFraction { numerator: -&self.numerator, denominator: self.denominator.clone() }
    }

    fn compare(&self, other: &FieldFraction) -> Result<Ordering> {
        // Denominators are positive, so cross multiplication preserves
        // order.
        (&(&self.numerator * &other.denominator) - &(&other.numerator * &self.denominator)).sign()
    }
}

#[derive(Clone)]
struct Constraint {
    coefficients: Vec<NumberFieldElement>,
    strict: bool,
}

impl Matrix<NumberFieldElement> {
    /// Find `y` with `self * y >= 0` coordinatewise and `strict . y > 0`,
    /// scaled to have entries in the ring. Fails with
    /// [`Error::Assumption`] when the cone is empty.
    ///
    /// Fourier-Motzkin elimination over the ordered field: elimination
    /// itself is division-free; only the final back-substitution works
    /// in the fraction field, and the result is cleared back to the
    /// ring, which is harmless for a cone.
    pub fn find_vector_with_nonnegative_image(
        &self,
        strict: &[NumberFieldElement],
    ) -> Result<Vec<NumberFieldElement>> {
        assert!(self.height() > 0, "empty feasibility system");
        let field = Arc::clone(self.entry(0, 0).field());
        let k = self.width();
        assert_eq!(strict.len(), k, "strict functional has wrong arity");

        let mut constraints: Vec<Constraint> = self
            .rows()
            .iter()
            .map(|row| Constraint { coefficients: row.clone(), strict: false })
            .collect();
        constraints.push(Constraint { coefficients: strict.to_vec(), strict: true });

        // Eliminate variables k-1, ..., 1, saving each pre-elimination
        // system for back-substitution.
        let mut saved: Vec<Vec<Constraint>> = Vec::new();
        for variable in (1..k).rev() {
            saved.push(constraints.clone());
            let mut positive = Vec::new();
            let mut negative = Vec::new();
            let mut reduced: Vec<Constraint> = Vec::new();
            for constraint in constraints {
                match constraint.coefficients[variable].sign()? {
                    Ordering::Greater => positive.push(constraint),
                    Ordering::Less => negative.push(constraint),
                    Ordering::Equal => {
                        let mut c = constraint;
                        c.coefficients.truncate(variable);
                        if c.coefficients.iter().all(NumberFieldElement::is_zero) && c.strict {
                            return Err(Error::assumption("cone is empty"));
                        }
                        reduced.push(c);
                    }
                }
            }
            for p in &positive {
                for n in &negative {
                    let a = &p.coefficients[variable];
                    let b = &n.coefficients[variable];
                    // (-b) p + a n has no `variable` term; both
                    // multipliers are positive.
                    let coefficients: Vec<NumberFieldElement> = (0..variable)
                        .map(|j| {
                            &(&p.coefficients[j] * &-b) + &(&n.coefficients[j] * a)
                        })
                        .collect();
                    let strict = p.strict || n.strict;
                    if coefficients.iter().all(NumberFieldElement::is_zero) && strict {
                        return Err(Error::assumption("cone is empty"));
                    }
                    reduced.push(Constraint { coefficients, strict });
                }
            }
            if reduced.len() > 20_000 {
                return Err(Error::computation("feasibility system exploded"));
            }
            constraints = reduced;
        }

        // One variable left.
        let mut needs_positive = false;
        let mut needs_negative = false;
        let mut strict_nonzero = false;
        for constraint in &constraints {
            match constraint.coefficients[0].sign()? {
                Ordering::Greater => {
                    needs_positive = true;
                    strict_nonzero |= constraint.strict;
                }
                Ordering::Less => {
                    needs_negative = true;
                    strict_nonzero |= constraint.strict;
                }
                Ordering::Equal => {
                    if constraint.strict {
                        return Err(Error::assumption("cone is empty"));
                    }
                }
            }
        }
        let first = if needs_positive && needs_negative {
            if strict_nonzero {
                return Err(Error::assumption("cone is empty"));
            }
            FieldFraction::from_integer(&field, 0)
        } else if needs_negative {
            FieldFraction::from_integer(&field, -1)
        } else {
            FieldFraction::from_integer(&field, 1)
        };

        let mut solution: Vec<FieldFraction> = vec![first];
        for (index, system) in saved.into_iter().enumerate().rev() {
            // saved[i] was recorded before eliminating variable k-1-i.
            let variable = k - 1 - index;
            let mut lower: Option<(FieldFraction, bool)> = None;
            let mut upper: Option<(FieldFraction, bool)> = None;
            for constraint in &system {
                let coefficient = &constraint.coefficients[variable];
                let sign = coefficient.sign()?;
                if sign == Ordering::Equal {
                    continue;
                }
                let mut rest = FieldFraction::from_integer(&field, 0);
                for (j, value) in solution.iter().enumerate() {
                    rest = rest.add(&value.mul_element(&constraint.coefficients[j]));
                }
                // coefficient * y + rest >= 0 bounds y by -rest/coefficient
                // from below (positive coefficient) or above (negative).
                let bound = rest.neg().div_element(coefficient)?;
                if sign == Ordering::Greater {
                    let replace = match &lower {
                        Some((current, _)) => bound.compare(current)? == Ordering::Greater,
                        None => true,
                    };
                    if replace {
                        lower = Some((bound, constraint.strict));
                    }
                } else {
                    let replace = match &upper {
                        Some((current, _)) => bound.compare(current)? == Ordering::Less,
                        None => true,
                    };
                    if replace {
                        upper = Some((bound, constraint.strict));
                    }
                }
            }
            let value = match (&lower, &upper) {
                (Some((l, ls)), Some((u, us))) => match l.compare(u)? {
                    Ordering::Less => {
                        let two = field.from_integer(BigInt::from(2));
                        l.add(u).div_element(&two)?
                    }
                    Ordering::Equal if !ls && !us => l.clone(),
                    _ => return Err(Error::assumption("cone is empty")),
                },
                (Some((l, _)), None) => l.add(&FieldFraction::from_integer(&field, 1)),
                (None, Some((u, _))) => u.add(&FieldFraction::from_integer(&field, -1)),
                (None, None) => FieldFraction::from_integer(&field, 0),
            };
            solution.push(value);
        }

        // solution[i] is the value of variable i. Clear denominators by
        // the positive product of all of them.
        let mut cleared = Vec::with_capacity(k);
        for i in 0..k {
            let mut value = solution[i].numerator.clone();
            for (j, other) in solution.iter().enumerate() {
                if j != i {
                    value = &value * &other.denominator;
                }
            }
            cleared.push(value);
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lamination::IntegerLamination;
    use crate::triangulation::Triangulation;

    fn once_punctured_torus() -> Arc<Triangulation> {
        Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]])
    }

    #[test]
    fn test_directed_eigenvector_fibonacci_like() {
        // The transition matrix of the aB cell on the torus: an integer
        // matrix with spectral radius (3 + sqrt 5) / 2.
        let action = Matrix::from_rows(&[&[2, 1, 1], &[1, 1, 1], &[1, 1, 0]]);
        let condition = Matrix::from_rows(&[&[1, 0, 0], &[0, 1, 0], &[0, 0, 1]]);
        let result = directed_eigenvector(&action, &condition, &PureOracle);
        // Whether or not this particular matrix admits a directed
        // eigenvector, the search must terminate cleanly.
        match result {
            Ok((field, eigenvector)) => {
                assert!(field.degree() >= 1);
                assert_eq!(eigenvector.len(), 3);
            }
            Err(Error::Computation(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invariant_lamination_of_ab() {
        let t = once_punctured_torus();
        let a = IntegerLamination::from_weights(&t, &[1, 1, 0]).expect("curve");
        let b = IntegerLamination::from_weights(&t, &[0, 1, 1]).expect("curve");
        let word = a
            .encode_twist(1)
            .expect("twist a")
            .compose(&b.encode_twist(-1).expect("twist B"));
        let invariant = invariant_lamination(&word, &PureOracle, None).expect("pseudo-Anosov");
        // The dilatation satisfies x^2 - 3x + 1.
        assert_eq!(
            invariant.field.polynomial(),
            &crate::polynomial::Polynomial::from_coeffs(&[1, -3, 1])
        );
        // The invariant lamination is an eigenvector: applying the word
        // multiplies every weight by the dilatation.
        let image = word.apply(&invariant.lamination).expect("apply");
        for (w, iw) in invariant.lamination.geometric().iter().zip(image.geometric().iter()) {
            let scaled = w * &invariant.dilatation;
            assert_eq!(&scaled, iw);
        }
    }

    #[test]
    fn test_reducible_twist_has_no_invariant_lamination() {
        let t = once_punctured_torus();
        let a = IntegerLamination::from_weights(&t, &[1, 1, 0]).expect("curve");
        let twist = a.encode_twist(1).expect("twist");
        let result = invariant_lamination(&twist, &PureOracle, None);
        assert!(matches!(result, Err(Error::Computation(_))));
    }

    #[test]
    fn test_abort_is_honoured() {
        let t = once_punctured_torus();
        let a = IntegerLamination::from_weights(&t, &[1, 1, 0]).expect("curve");
        let twist = a.encode_twist(1).expect("twist");
        let abort = || true;
        let result = invariant_lamination(&twist, &PureOracle, Some(&abort));
        assert!(matches!(result, Err(Error::Abort(_))));
    }
}
