//! Conversion between vertex stencils and element-wise assembly matrices.
//!
//! A cell touching `2^d` vertices sees the coupling between its vertices `j` and `k` as the
//! entry of `j`'s stencil at offset `k - j + 1`. Every coupling is shared by all cells that
//! contain both vertices, so the stencil weight is divided by `2^c`, where `c` is the number
//! of dimensions in which `j` and `k` coincide.
use crate::allocators::GridAllocator;
use crate::index::{cell_vertices, stencil_centre_index, stencil_index, vertex_index, PatchCoords};
use crate::stencil::Stencil;
use crate::{GridDim, Real};
use itertools::iproduct;
use nalgebra::{convert, DefaultAllocator, DimName, OMatrix, OVector};

/// A `2^d x 2^d` element-wise assembly matrix, indexed by pairs of local cell vertices.
pub type ElementMatrix<T, D> = OMatrix<T, <D as GridDim>::TwoPow, <D as GridDim>::TwoPow>;

/// One value per local cell vertex.
pub type ElementVector<T, D> = OVector<T, <D as GridDim>::TwoPow>;

/// The stencils of the `2^d` vertices of a cell, column `j` being the stencil of vertex `j`.
pub type VectorOfStencils<T, D> = OMatrix<T, <D as GridDim>::ThreePow, <D as GridDim>::TwoPow>;

/// Precomputed mapping between element matrix entries and stencil entries.
///
/// For each pair of local vertices `(j, k)` the converter stores the linear stencil index of
/// the offset `k - j + 1` together with the share `1 / 2^c` that a single cell contributes.
#[derive(Debug, Clone)]
pub struct ElementMatrixConverter<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    stencil_indices: OMatrix<usize, D::TwoPow, D::TwoPow>,
    shares: ElementMatrix<T, D>,
}

impl<T, D> Default for ElementMatrixConverter<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D> ElementMatrixConverter<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    pub fn new() -> Self {
        let mut stencil_indices = OMatrix::<usize, D::TwoPow, D::TwoPow>::zeros();
        let mut shares = ElementMatrix::<T, D>::zeros();

        for (j, k) in iproduct!(cell_vertices::<D>(), cell_vertices::<D>()) {
            let offset: PatchCoords<D> = k.zip_map(&j, |k_i, j_i| k_i + 1 - j_i);
            let coincident = j.iter().zip(k.iter()).filter(|(j_i, k_i)| j_i == k_i).count();

            let (row, col) = (vertex_index(&j), vertex_index(&k));
            stencil_indices[(row, col)] = stencil_index(&offset);
            shares[(row, col)] = convert(0.5f64.powi(coincident as i32));
        }

        Self {
            stencil_indices,
            shares,
        }
    }

    /// Linear stencil index coupling local vertex `row` to local vertex `col`.
    pub fn stencil_index(&self, row: usize, col: usize) -> usize {
        self.stencil_indices[(row, col)]
    }

    /// The share of the coupling between `row` and `col` that belongs to a single cell.
    pub fn share(&self, row: usize, col: usize) -> T {
        self.shares[(row, col)]
    }

    /// Builds the element matrix of a cell whose vertices all carry the same stencil.
    pub fn stencil_to_element_matrix(&self, stencil: &Stencil<T, D>) -> ElementMatrix<T, D> {
        ElementMatrix::<T, D>::from_fn(|row, col| stencil[self.stencil_index(row, col)] * self.share(row, col))
    }

    /// Builds the element matrix of a cell in which vertex `j` carries the stencil in column
    /// `j` of `stencils`.
    pub fn vector_of_stencils_to_element_matrix(&self, stencils: &VectorOfStencils<T, D>) -> ElementMatrix<T, D> {
        ElementMatrix::<T, D>::from_fn(|row, col| stencils[(self.stencil_index(row, col), row)] * self.share(row, col))
    }

    /// Accumulates the entries of an element matrix back into a single stencil.
    ///
    /// Entries coupling vertices at the same relative offset are summed. This inverts
    /// [`Self::stencil_to_element_matrix`] exactly, but for element matrices assembled from
    /// differing vertex stencils the result is only the sum of the individual contributions,
    /// so the information on which vertex carried which weight is lost.
    pub fn element_matrix_to_stencil(&self, matrix: &ElementMatrix<T, D>) -> Stencil<T, D> {
        let mut stencil = Stencil::<T, D>::zeros();
        let n = D::TwoPow::dim();
        for col in 0..n {
            for row in 0..n {
                stencil[self.stencil_index(row, col)] += matrix[(row, col)];
            }
        }
        stencil
    }
}

/// Builds the element matrix of a cell whose vertices all carry the same stencil.
///
/// See [`ElementMatrixConverter::stencil_to_element_matrix`].
pub fn stencil_to_element_matrix<T, D>(stencil: &Stencil<T, D>) -> ElementMatrix<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    ElementMatrixConverter::<T, D>::new().stencil_to_element_matrix(stencil)
}

/// Builds the element matrix of a cell from per-vertex stencils.
///
/// See [`ElementMatrixConverter::vector_of_stencils_to_element_matrix`].
pub fn vector_of_stencils_to_element_matrix<T, D>(stencils: &VectorOfStencils<T, D>) -> ElementMatrix<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    ElementMatrixConverter::<T, D>::new().vector_of_stencils_to_element_matrix(stencils)
}

/// Reconstructs a stencil from an element matrix.
///
/// See [`ElementMatrixConverter::element_matrix_to_stencil`].
pub fn element_matrix_to_stencil<T, D>(matrix: &ElementMatrix<T, D>) -> Stencil<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    ElementMatrixConverter::<T, D>::new().element_matrix_to_stencil(matrix)
}

/// The diagonal entry of the assembled operator at a vertex, recovered from one of its
/// cells: `matrix(0, 0) * 2^d`.
pub fn element_matrix_diagonal<T, D>(matrix: &ElementMatrix<T, D>) -> T
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let cells_per_vertex: T = convert(D::TwoPow::dim() as f64);
    matrix[(0, 0)] * cells_per_vertex
}

/// The centre weight of a stencil.
pub fn stencil_diagonal<T, D>(stencil: &Stencil<T, D>) -> T
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    stencil[stencil_centre_index::<D>()]
}
