//! Cell-wise intergrid transfer operators.
//!
//! Every coarse vertex carries a `5^d` transfer stencil describing how its value spreads into
//! the fine grid. A coarse cell is refined into `3^d` fine cells, so the fine vertices within
//! the two coarse cells adjacent to a coarse vertex along each axis have positions in
//! `{0, ..., 3}^d` relative to a local patch. A coarse vertex at local position `0` sees the
//! fine vertex at position `f` at stencil offset `2 + f`, while a coarse vertex at local
//! position `1` sees it at offset `f - 1`.
use crate::allocators::GridAllocator;
use crate::element_matrix::{ElementMatrix, ElementVector, VectorOfStencils};
use crate::index::{cell_vertices, patch_iter, stencil_index, transfer_stencil_index, vertex_index, PatchCoords};
use crate::multigrid::StencilEvaluationCounter;
use crate::stencil::TransferStencil;
use crate::{GridDim, Real};
use itertools::iproduct;
use nalgebra::allocator::Allocator;
use nalgebra::{convert, DefaultAllocator, DimName, OMatrix};

/// A `2^d x 2^d` transfer matrix of a single cell, entry `(l, k)` being the weight of coarse
/// vertex `k` at fine vertex `l`.
pub type CellTransferMatrix<T, D> = OMatrix<T, <D as GridDim>::TwoPow, <D as GridDim>::TwoPow>;

/// The transfer stencils of the `2^d` coarse vertices of a cell, one per column.
pub type CellTransferStencils<T, D> = OMatrix<T, <D as GridDim>::FivePow, <D as GridDim>::TwoPow>;

/// Integer positions in `{0, ..., 3}^d` of the `2^d` fine vertices of a cell, one per column.
pub type FineVertexPositions<D> = OMatrix<usize, D, <D as GridDim>::TwoPow>;

/// Element update positions for `d = 2`: entry `[c][f]` is the stencil index at which the
/// coupling of coarse vertex `c` to vertex `f` is stored.
pub const ELEMENT_UPDATE_POSITIONS_2D: [[usize; 4]; 4] = [[4, 5, 7, 8], [3, 4, 6, 7], [1, 2, 4, 5], [0, 1, 3, 4]];

/// Transfer block positions for `d = 2`: entry `[c][i]` is the index within the `5^d`
/// transfer stencil of coarse vertex `c` that receives entry `i` of its `3^d` block.
pub const TRANSFER_BLOCK_POSITIONS_2D: [[usize; 9]; 4] = [
    [12, 13, 14, 17, 18, 19, 22, 23, 24],
    [10, 11, 12, 15, 16, 17, 20, 21, 22],
    [2, 3, 4, 7, 8, 9, 12, 13, 14],
    [0, 1, 2, 5, 6, 7, 10, 11, 12],
];

/// The entry of a coarse vertex' transfer stencil that governs a fine vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStencilEntry<D>
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    /// Offset coordinates in `{0, ..., 4}^d`.
    pub offset: PatchCoords<D>,
    /// Linear index of `offset` within the `5^d` stencil.
    pub index: usize,
}

/// Locates a fine vertex within the transfer stencil of a coarse vertex.
///
/// Returns `None` if the coarse vertex does not influence the fine vertex, i.e. if the fine
/// vertex lies outside the `5^d` neighborhood of the coarse vertex.
///
/// Panics if a coordinate of `coarse_vertex` is not in `{0, 1}` or a coordinate of
/// `fine_position` is not in `{0, ..., 3}`.
pub fn position_relative_to_coarse_vertex<D>(
    coarse_vertex: &PatchCoords<D>,
    fine_position: &PatchCoords<D>,
) -> Option<TransferStencilEntry<D>>
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    let mut offset = PatchCoords::<D>::zeros();
    let mut influences = true;
    for i in 0..D::dim() {
        let (coarse, fine) = (coarse_vertex[i], fine_position[i]);
        assert!(coarse < 2, "Coarse vertex coordinate {} along axis {} is not in {{0, 1}}.", coarse, i);
        assert!(fine < 4, "Fine vertex position {} along axis {} is not in {{0, ..., 3}}.", fine, i);

        // 2 - (3 - fine) < 0 for coarse == 1 and fine == 0
        let offset_i = if coarse == 1 { fine.checked_sub(1) } else { Some(2 + fine).filter(|&o| o < 5) };
        match offset_i {
            Some(o) => offset[i] = o,
            None => influences = false,
        }
    }

    if !influences {
        return None;
    }
    let index = transfer_stencil_index(&offset);
    Some(TransferStencilEntry { offset, index })
}

/// Assembles the unscaled transfer matrix of a cell.
///
/// Entry `(l, k)` is the weight that the transfer stencil of coarse vertex `k` assigns to
/// fine vertex `l`, or zero if `k` does not influence `l`.
pub fn cell_transfer_operator<T, D>(
    operators: &CellTransferStencils<T, D>,
    fine_positions: &FineVertexPositions<D>,
) -> CellTransferMatrix<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let mut result = CellTransferMatrix::<T, D>::zeros();
    for coarse_vertex in cell_vertices::<D>() {
        let k = vertex_index(&coarse_vertex);
        for (l, fine_position) in fine_positions.column_iter().enumerate() {
            if let Some(entry) = position_relative_to_coarse_vertex(&coarse_vertex, &fine_position.clone_owned()) {
                result[(l, k)] = operators[(entry.index, k)];
            }
        }
    }
    result
}

/// The weight with which a single coarse vertex contributes to a single fine vertex.
///
/// Every weight that is actually read from `operator` is recorded in `counter`.
pub fn contribution_weight<T, D>(
    coarse_vertex: &PatchCoords<D>,
    operator: &TransferStencil<T, D>,
    fine_position: &PatchCoords<D>,
    counter: &mut StencilEvaluationCounter,
) -> T
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    match position_relative_to_coarse_vertex(coarse_vertex, fine_position) {
        Some(entry) => {
            counter.increment();
            operator[entry.index]
        }
        None => T::zero(),
    }
}

/// Interpolates the values of the coarse vertices of a cell onto a single fine vertex with
/// the given interpolation stencil, e.g. [`crate::stencil::d_linear_interpolation`].
pub fn interpolated_value<T, D>(
    interpolation: &TransferStencil<T, D>,
    coarse_values: &ElementVector<T, D>,
    fine_position: &PatchCoords<D>,
    scaling: T,
    counter: &mut StencilEvaluationCounter,
) -> T
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let mut result = T::zero();
    for coarse_vertex in cell_vertices::<D>() {
        let weight = contribution_weight(&coarse_vertex, interpolation, fine_position, counter);
        result += coarse_values[vertex_index(&coarse_vertex)] * weight;
    }
    result * scaling
}

fn inverse_cells_per_vertex<T, D>() -> T
where
    T: Real,
    D: GridDim,
{
    convert(1.0 / D::TwoPow::dim() as f64)
}

/// Prolongs the coarse vertex values of a cell onto its fine vertices.
///
/// The cell transfer matrix is scaled by `1 / 2^d`, since each vertex receives contributions
/// from all `2^d` cells adjacent to it.
pub fn prolong_cell_values<T, D>(
    operators: &CellTransferStencils<T, D>,
    fine_positions: &FineVertexPositions<D>,
    coarse_values: &ElementVector<T, D>,
) -> ElementVector<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let transfer = cell_transfer_operator(operators, fine_positions) * inverse_cells_per_vertex::<T, D>();
    transfer * coarse_values
}

/// Restricts the fine vertex values of a cell onto its coarse vertices with the transpose of
/// the (scaled) cell transfer matrix.
pub fn restrict_cell_values<T, D>(
    operators: &CellTransferStencils<T, D>,
    fine_positions: &FineVertexPositions<D>,
    fine_values: &ElementVector<T, D>,
) -> ElementVector<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let transfer = cell_transfer_operator(operators, fine_positions) * inverse_cells_per_vertex::<T, D>();
    transfer.tr_mul(fine_values)
}

/// Computes the Petrov-Galerkin coarse-grid element matrix `R^T A P` of a cell.
///
/// The cell transfer matrices are not scaled, since the fine element matrix already
/// carries the share of the cell.
pub fn petrov_galerkin_coarse_operator<T, D>(
    prolongation: &CellTransferStencils<T, D>,
    restriction: &CellTransferStencils<T, D>,
    fine_positions: &FineVertexPositions<D>,
    fine_element_matrix: &ElementMatrix<T, D>,
) -> ElementMatrix<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let p = cell_transfer_operator(prolongation, fine_positions);
    let r = cell_transfer_operator(restriction, fine_positions);
    r.tr_mul(&(fine_element_matrix * p))
}

/// Computes `rhs - A u` on a single cell.
pub fn compute_cell_residual<T, D>(
    values: &ElementVector<T, D>,
    rhs: &ElementVector<T, D>,
    element_matrix: &ElementMatrix<T, D>,
) -> ElementVector<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    rhs - element_matrix * values
}

/// Stencil indices of the couplings within a cell.
///
/// Entry `(c, f)` is the index `1 + f - c` (componentwise) within the stencil of vertex `c`
/// at which its coupling to vertex `f` is stored.
pub fn element_update_positions<D>() -> OMatrix<usize, D::TwoPow, D::TwoPow>
where
    D: GridDim,
    DefaultAllocator: Allocator<usize, D> + Allocator<usize, D::TwoPow, D::TwoPow>,
{
    let mut positions = OMatrix::<usize, D::TwoPow, D::TwoPow>::zeros();
    for (c, f) in iproduct!(cell_vertices::<D>(), cell_vertices::<D>()) {
        let offset: PatchCoords<D> = f.zip_map(&c, |f_i, c_i| 1 + f_i - c_i);
        positions[(vertex_index(&c), vertex_index(&f))] = stencil_index(&offset);
    }
    positions
}

/// Adds the couplings of a cell-wise update to the stencils of the vertices of the cell.
///
/// Entry `(c, f)` of `cell_update` is added to the stencil of vertex `c` (column `c` of
/// `vertex_stencils`) at the position given by [`element_update_positions`].
pub fn add_update_to_stencils<T, D>(vertex_stencils: &mut VectorOfStencils<T, D>, cell_update: &ElementMatrix<T, D>)
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let positions = element_update_positions::<D>();
    for c in 0..D::TwoPow::dim() {
        for f in 0..D::TwoPow::dim() {
            vertex_stencils[(positions[(c, f)], c)] += cell_update[(c, f)];
        }
    }
}

/// Indices within the `5^d` transfer stencils that correspond to the `3^d` blocks of the
/// coarse vertices of a cell.
///
/// Entry `(i, c)` is the transfer stencil index `a + 2 (1 - c)` (componentwise), where `a`
/// are the coordinates of block entry `i`. The block of a coarse vertex thus covers the
/// fine vertices inside the cell.
pub fn transfer_block_positions<D>() -> OMatrix<usize, D::ThreePow, D::TwoPow>
where
    D: GridDim,
    DefaultAllocator: Allocator<usize, D> + Allocator<usize, D::ThreePow, D::TwoPow>,
{
    let mut positions = OMatrix::<usize, D::ThreePow, D::TwoPow>::zeros();
    for c in cell_vertices::<D>() {
        for (i, a) in patch_iter::<D>(3).enumerate() {
            let offset: PatchCoords<D> = a.zip_map(&c, |a_i, c_i| a_i + 2 * (1 - c_i));
            positions[(i, vertex_index(&c))] = transfer_stencil_index(&offset);
        }
    }
    positions
}

/// Writes the `3^d` blocks of the coarse vertices of a cell into their `5^d` transfer
/// stencils. Entries outside the blocks are left untouched.
pub fn fill_in_transfer_stencils<T, D>(blocks: &VectorOfStencils<T, D>, operators: &mut CellTransferStencils<T, D>)
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let positions = transfer_block_positions::<D>();
    for c in 0..D::TwoPow::dim() {
        for i in 0..D::ThreePow::dim() {
            operators[(positions[(i, c)], c)] = blocks[(i, c)];
        }
    }
}
