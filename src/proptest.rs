use crate::allocators::GridAllocator;
use crate::element_matrix::{ElementMatrix, ElementVector};
use crate::index::cell_vertices;
use crate::stencil::Stencil;
use crate::transfer::{CellTransferStencils, FineVertexPositions};
use crate::GridDim;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Matrix4, OMatrix, Vector3, U1, U4};
use std::ops::Range;

/// Matrices with entries drawn independently from `range`.
pub fn matrix<R, C>(range: Range<f64>) -> impl Strategy<Value = OMatrix<f64, R, C>>
where
    R: DimName,
    C: DimName,
    DefaultAllocator: Allocator<f64, R, C>,
{
    vec(range, R::dim() * C::dim()).prop_map(|entries| OMatrix::<f64, R, C>::from_column_slice(&entries))
}

pub fn stencil<D>() -> impl Strategy<Value = Stencil<f64, D>>
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    matrix::<D::ThreePow, U1>(-10.0..10.0)
}

pub fn element_vector<D>() -> impl Strategy<Value = ElementVector<f64, D>>
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    matrix::<D::TwoPow, U1>(-10.0..10.0)
}

pub fn element_matrix<D>() -> impl Strategy<Value = ElementMatrix<f64, D>>
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    matrix::<D::TwoPow, D::TwoPow>(-10.0..10.0)
}

pub fn cell_transfer_stencils<D>() -> impl Strategy<Value = CellTransferStencils<f64, D>>
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    matrix::<D::FivePow, D::TwoPow>(-1.0..1.0)
}

/// Positions of the vertices of a fine cell within the `4^d` patch spanned by a coarse cell.
///
/// The fine cell is any of the `3^d` fine cells of the patch, so column `l` is the position of
/// the lower corner of the fine cell plus the coordinates of local vertex `l`.
pub fn fine_vertex_positions<D>() -> impl Strategy<Value = FineVertexPositions<D>>
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    vec(0..3usize, D::dim()).prop_map(|corner| {
        let mut positions = FineVertexPositions::<D>::zeros();
        for (l, vertex) in cell_vertices::<D>().enumerate() {
            for i in 0..D::dim() {
                positions[(i, l)] = corner[i] + vertex[i];
            }
        }
        positions
    })
}

/// Strictly diagonally dominant 4x4 matrices, which are well-conditioned.
pub fn diagonally_dominant_matrix4() -> impl Strategy<Value = Matrix4<f64>> {
    let diagonal = [4.0..8.0, 4.0..8.0, 4.0..8.0, 4.0..8.0];
    let signs = [any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()];
    (matrix::<U4, U4>(-1.0..1.0), diagonal, signs).prop_map(|(mut a, diagonal, negate): (Matrix4<f64>, [f64; 4], [bool; 4])| {
        for i in 0..4 {
            a[(i, i)] = if negate[i] { -diagonal[i] } else { diagonal[i] };
        }
        a
    })
}

/// Pairs of 1D stencils `(a, b)` for which the system solved by
/// [`crate::linalg::solve_2x2`] is strictly diagonally dominant.
pub fn diagonally_dominant_stencil_pair() -> impl Strategy<Value = (Vector3<f64>, Vector3<f64>)> {
    let off_diagonal = -1.0..1.0;
    let diagonal = 2.0..8.0;
    (
        [off_diagonal.clone(), diagonal.clone(), off_diagonal.clone()],
        [off_diagonal.clone(), diagonal, off_diagonal],
    )
        .prop_map(|(a, b)| (Vector3::from(a), Vector3::from(b)))
}
