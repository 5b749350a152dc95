//! Operator-induced interpolation in the spirit of black-box multigrid (BoxMG).
//!
//! The interpolation weights of the four coarse vertices of a 2D cell are derived from the
//! fine-grid stencils of the `4 x 4` fine points spanned by the cell. Fine point `p = x + 4 y`
//! has the coarse vertices at points 0, 3, 12 and 15. The weights are computed in three
//! stages:
//!
//! 1. Injection: a coarse vertex has weight one at its own fine point.
//! 2. Edges: on every edge of the cell, the stencils of the two edge-interior points are
//!    collapsed onto the edge and the resulting 1D problem is solved for each endpoint.
//! 3. Interior: the stencil equations of the four interior points are solved with the edge
//!    weights as boundary values.
//!
//! Only the two-dimensional construction is available.
use crate::allocators::GridAllocator;
use crate::element_matrix::VectorOfStencils;
use crate::linalg::{solve_2x2, solve_4x4, LinearSolveError};
use crate::{GridDim, Real};
use log::warn;
use nalgebra::{DefaultAllocator, Matrix4, OMatrix, Vector3, Vector4};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// The stencils of the `4^d` fine points spanned by a coarse cell, one per column.
pub type StencilPatch<T, D> = OMatrix<T, <D as GridDim>::ThreePow, <D as GridDim>::FourPow>;

/// Fine points that coincide with the coarse vertices 0, 1, 2 and 3.
pub const COARSE_POINTS_2D: [usize; 4] = [0, 3, 12, 15];

/// Fine points in the interior of the cell.
pub const INTERIOR_POINTS_2D: [usize; 4] = [5, 6, 9, 10];

/// Fine points covered by the `3 x 3` weight block of each coarse vertex: entry `[c][a + 3 b]`
/// is the fine point `(a + c_x, b + c_y)`.
pub const BLOCK_FINE_POINTS_2D: [[usize; 9]; 4] = [
    [0, 1, 2, 4, 5, 6, 8, 9, 10],
    [1, 2, 3, 5, 6, 7, 9, 10, 11],
    [4, 5, 6, 8, 9, 10, 12, 13, 14],
    [5, 6, 7, 9, 10, 11, 13, 14, 15],
];

const FINE_POINTS_2D: usize = 16;

struct Edge {
    /// Coarse vertices at the two ends of the edge.
    endpoints: [usize; 2],
    /// Edge-interior fine points, ordered from the first to the second endpoint.
    points: [usize; 2],
    /// Axis along which the edge runs.
    axis: usize,
}

const EDGES_2D: [Edge; 4] = [
    Edge { endpoints: [0, 1], points: [1, 2], axis: 0 },
    Edge { endpoints: [0, 2], points: [4, 8], axis: 1 },
    Edge { endpoints: [1, 3], points: [7, 11], axis: 1 },
    Edge { endpoints: [2, 3], points: [13, 14], axis: 0 },
];

#[derive(Debug, Clone, PartialEq)]
pub enum BoxMgError {
    /// The local system for the edge or interior weights could not be solved.
    SingularSystem(LinearSolveError),
    /// A computed weight is NaN or infinite.
    NonFiniteWeight { coarse_vertex: usize, fine_point: usize },
}

impl Display for BoxMgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            &BoxMgError::SingularSystem(ref err) => {
                write!(f, "Failed to solve local interpolation system. Error: {}", err)
            }
            &BoxMgError::NonFiniteWeight {
                coarse_vertex,
                fine_point,
            } => write!(
                f,
                "Non-finite interpolation weight of coarse vertex {} at fine point {}.",
                coarse_vertex, fine_point
            ),
        }
    }
}

impl Error for BoxMgError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BoxMgError::SingularSystem(err) => Some(err),
            BoxMgError::NonFiniteWeight { .. } => None,
        }
    }
}

impl From<LinearSolveError> for BoxMgError {
    fn from(err: LinearSolveError) -> Self {
        BoxMgError::SingularSystem(err)
    }
}

/// Computes the operator-induced interpolation weights of the coarse vertices of a cell.
///
/// Column `c` of the result is the `3^d` weight block of coarse vertex `c`, where block
/// entry `a + 3 b` is the weight at fine point `(a + c_x, b + c_y)` (see
/// [`BLOCK_FINE_POINTS_2D`]). The block can be written into a transfer stencil with
/// [`crate::transfer::fill_in_transfer_stencils`].
///
/// In three dimensions the construction is not available: a warning is logged and the
/// weights are all zero.
pub fn try_boxmg_transfer_operator<T, D>(patch: &StencilPatch<T, D>) -> Result<VectorOfStencils<T, D>, BoxMgError>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let mut result = VectorOfStencils::<T, D>::zeros();
    if D::dim() != 2 {
        warn!(
            "Operator-induced interpolation is not implemented in {} dimensions, returning zero weights.",
            D::dim()
        );
        return Ok(result);
    }

    let stencil = |point: usize, entry: usize| patch[(entry, point)];
    let mut weights = [[T::zero(); FINE_POINTS_2D]; 4];

    for (c, &point) in COARSE_POINTS_2D.iter().enumerate() {
        weights[c][point] = T::one();
    }

    for edge in &EDGES_2D {
        let collapse = |point: usize| {
            let mut collapsed = Vector3::<T>::zeros();
            for k in 0..3 {
                for m in 0..3 {
                    collapsed[k] += match edge.axis {
                        0 => stencil(point, k + 3 * m),
                        _ => stencil(point, 3 * k + m),
                    };
                }
            }
            collapsed
        };
        let (first, second) = (collapse(edge.points[0]), collapse(edge.points[1]));

        let [start, end] = edge.endpoints;
        let mut second_without_end = second;
        second_without_end[2] = T::zero();
        let from_start = solve_2x2(&first, &second_without_end)?;

        let mut first_without_start = first;
        first_without_start[0] = T::zero();
        let from_end = solve_2x2(&first_without_start, &second)?;

        for (i, &point) in edge.points.iter().enumerate() {
            weights[start][point] = from_start[i];
            weights[end][point] = from_end[i];
        }
    }

    // The interior system is the same for all coarse vertices, only the boundary values differ
    let mut system = Matrix4::<T>::zeros();
    for (row, &point) in INTERIOR_POINTS_2D.iter().enumerate() {
        for_each_neighbor(point, |entry, neighbor| {
            if let Some(col) = INTERIOR_POINTS_2D.iter().position(|&p| p == neighbor) {
                system[(row, col)] += stencil(point, entry);
            }
        });
    }

    for c in 0..4 {
        let mut rhs = Vector4::<T>::zeros();
        for (row, &point) in INTERIOR_POINTS_2D.iter().enumerate() {
            for_each_neighbor(point, |entry, neighbor| {
                if !INTERIOR_POINTS_2D.contains(&neighbor) {
                    rhs[row] -= stencil(point, entry) * weights[c][neighbor];
                }
            });
        }
        let interior = solve_4x4(&system, &rhs)?;
        for (i, &point) in INTERIOR_POINTS_2D.iter().enumerate() {
            weights[c][point] = interior[i];
        }
    }

    for (c, block) in BLOCK_FINE_POINTS_2D.iter().enumerate() {
        for (slot, &point) in block.iter().enumerate() {
            let weight = weights[c][point];
            if !weight.is_finite() {
                return Err(BoxMgError::NonFiniteWeight {
                    coarse_vertex: c,
                    fine_point: point,
                });
            }
            result[(slot, c)] = weight;
        }
    }

    Ok(result)
}

/// Computes the operator-induced interpolation weights of the coarse vertices of a cell.
///
/// See [`try_boxmg_transfer_operator`].
///
/// Panics if the local systems are singular or any weight is not finite, which indicates a
/// degenerate fine-grid operator.
pub fn boxmg_transfer_operator<T, D>(patch: &StencilPatch<T, D>) -> VectorOfStencils<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    match try_boxmg_transfer_operator::<T, D>(patch) {
        Ok(weights) => weights,
        Err(err) => panic!("Operator-induced interpolation failed: {}", err),
    }
}

/// Calls `f(entry, neighbor)` for every entry of the stencil of an interior fine point, where
/// `neighbor` is the fine point the entry couples to.
fn for_each_neighbor(point: usize, mut f: impl FnMut(usize, usize)) {
    let (x, y) = (point % 4, point / 4);
    debug_assert!((1..3).contains(&x) && (1..3).contains(&y));
    for oy in 0..3 {
        for ox in 0..3 {
            let neighbor = (x + ox - 1) + 4 * (y + oy - 1);
            f(ox + 3 * oy, neighbor);
        }
    }
}
