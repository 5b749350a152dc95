//! Small dense solvers for the local systems of operator-induced interpolation.
use crate::Real;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Matrix4, OMatrix, OVector, Vector2, Vector3, Vector4};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolveError {
    /// The determinant of a 2x2 system vanishes or its inverse is not finite.
    SingularDeterminant,
    /// A diagonal entry of the triangular factor vanishes or is not finite.
    SingularPivot(usize),
}

impl Display for LinearSolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            &LinearSolveError::SingularDeterminant => {
                write!(f, "System is singular: the inverse of its determinant is not finite.")
            }
            &LinearSolveError::SingularPivot(row) => {
                write!(f, "System is singular: zero or non-finite pivot in row {}.", row)
            }
        }
    }
}

impl Error for LinearSolveError {}

/// Solves the 2x2 system
///
/// ```text
/// [ a1  a2 ] [ x0 ]   [ -a0 ]
/// [ b0  b1 ] [ x1 ] = [ -b2 ]
/// ```
///
/// with the closed-form inverse. The two rows are the equations of two neighboring points on
/// a line, written as 1D stencils `a` and `b`, so the diagonal of the system consists of the
/// centre weights while `a0` and `b2` couple to the known values outside the pair.
pub fn solve_2x2<T: Real>(a: &Vector3<T>, b: &Vector3<T>) -> Result<Vector2<T>, LinearSolveError> {
    let inverse_determinant = T::one() / (a[1] * b[1] - a[2] * b[0]);
    if !inverse_determinant.is_finite() {
        return Err(LinearSolveError::SingularDeterminant);
    }

    let (rhs0, rhs1) = (-a[0], -b[2]);
    let x0 = inverse_determinant * (b[1] * rhs0 - a[2] * rhs1);
    let x1 = inverse_determinant * (-b[0] * rhs0 + a[1] * rhs1);
    Ok(Vector2::new(x0, x1))
}

/// Computes the QR decomposition of a square matrix with the modified Gram-Schmidt process.
///
/// Returns `(Q, R)` such that `A = Q R`, where `Q` has orthonormal columns and `R` is upper
/// triangular. If a column of `A` is linearly dependent on the preceding columns, the
/// corresponding column of `Q` and diagonal entry of `R` are zero.
pub fn modified_gram_schmidt<T, N>(a: &OMatrix<T, N, N>) -> (OMatrix<T, N, N>, OMatrix<T, N, N>)
where
    T: Real,
    N: DimName,
    DefaultAllocator: Allocator<T, N, N> + Allocator<T, N>,
{
    let n = N::dim();
    let mut q = a.clone();
    let mut r = OMatrix::<T, N, N>::zeros();

    for j in 0..n {
        let norm = q.column(j).norm();
        r[(j, j)] = norm;
        if norm > T::zero() {
            q.column_mut(j).unscale_mut(norm);
        } else {
            q.column_mut(j).fill(T::zero());
        }

        let q_j: OVector<T, N> = q.column(j).clone_owned();
        for k in (j + 1)..n {
            let r_jk = q_j.dot(&q.column(k));
            r[(j, k)] = r_jk;
            q.column_mut(k).axpy(-r_jk, &q_j, T::one());
        }
    }

    (q, r)
}

/// Solves `Q R x = rhs` for the factors of [`modified_gram_schmidt`].
///
/// Computes `y = Q^T rhs` and then solves `R x = y` by back substitution, starting from the
/// last row. No pivoting is performed.
pub fn solve_qr<T, N>(
    q: &OMatrix<T, N, N>,
    r: &OMatrix<T, N, N>,
    rhs: &OVector<T, N>,
) -> Result<OVector<T, N>, LinearSolveError>
where
    T: Real,
    N: DimName,
    DefaultAllocator: Allocator<T, N, N> + Allocator<T, N>,
{
    let mut x = q.tr_mul(rhs);
    for i in (0..N::dim()).rev() {
        let pivot = r[(i, i)];
        if pivot == T::zero() || !pivot.is_finite() {
            return Err(LinearSolveError::SingularPivot(i));
        }
        let mut sum = x[i];
        for k in (i + 1)..N::dim() {
            sum -= r[(i, k)] * x[k];
        }
        x[i] = sum / pivot;
    }
    Ok(x)
}

/// Solves the 4x4 system `A x = rhs` via a QR decomposition computed with modified
/// Gram-Schmidt.
pub fn solve_4x4<T: Real>(a: &Matrix4<T>, rhs: &Vector4<T>) -> Result<Vector4<T>, LinearSolveError> {
    let (q, r) = modified_gram_schmidt(a);
    solve_qr(&q, &r, rhs)
}
