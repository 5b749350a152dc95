use intergrid::allocators::GridAllocator;
use intergrid::element_matrix::{stencil_to_element_matrix, ElementVector, VectorOfStencils};
use intergrid::index::{cell_vertices, delinearise, vertex_index, PatchCoords};
use intergrid::multigrid::StencilEvaluationCounter;
use intergrid::proptest::{cell_transfer_stencils, element_matrix, element_vector, fine_vertex_positions};
use intergrid::stencil::{d_linear_interpolation, laplacian, Stencil};
use intergrid::transfer::{
    add_update_to_stencils, cell_transfer_operator, compute_cell_residual, contribution_weight,
    element_update_positions, fill_in_transfer_stencils, petrov_galerkin_coarse_operator,
    position_relative_to_coarse_vertex, prolong_cell_values, restrict_cell_values, transfer_block_positions,
    CellTransferMatrix, CellTransferStencils, FineVertexPositions, ELEMENT_UPDATE_POSITIONS_2D,
    TRANSFER_BLOCK_POSITIONS_2D,
};
use intergrid::GridDim;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Vector2, Vector3, Vector4, U2, U3};
use proptest::prelude::*;

fn d_linear_operators<D>() -> CellTransferStencils<f64, D>
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    let stencil = d_linear_interpolation::<f64, D>();
    CellTransferStencils::<f64, D>::from_fn(|i, _| stencil[i])
}

/// The weight of coarse vertex `coarse` at the fine vertex `fine` for d-linear interpolation
/// onto a grid refined by a factor of three.
fn d_linear_weight<D>(coarse: &PatchCoords<D>, fine: &PatchCoords<D>) -> f64
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    coarse
        .iter()
        .zip(fine.iter())
        .map(|(&c, &f)| {
            let f = f as f64 / 3.0;
            if c == 0 {
                1.0 - f
            } else {
                f
            }
        })
        .product()
}

fn assert_is_d_linear_cell_transfer<D>(transfer: &CellTransferMatrix<f64, D>, positions: &FineVertexPositions<D>)
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    for coarse in cell_vertices::<D>() {
        let k = vertex_index(&coarse);
        for (l, fine) in positions.column_iter().enumerate() {
            let expected = d_linear_weight(&coarse, &fine.clone_owned());
            assert_scalar_eq!(transfer[(l, k)], expected, comp = abs, tol = 1e-13);
        }
    }
}

fn fine_cell_at<D>(corner: &[usize]) -> FineVertexPositions<D>
where
    D: GridDim,
    DefaultAllocator: Allocator<usize, D> + Allocator<usize, D, D::TwoPow>,
{
    FineVertexPositions::<D>::from_fn(|i, l| {
        let vertex: PatchCoords<D> = delinearise(l, 2);
        corner[i] + vertex[i]
    })
}

#[test]
fn position_relative_to_coarse_vertex_examples() {
    let entry = position_relative_to_coarse_vertex(&Vector2::new(0, 0), &Vector2::new(1, 1)).unwrap();
    assert_eq!(entry.offset, Vector2::new(3, 3));
    assert_eq!(entry.index, 18);

    let entry = position_relative_to_coarse_vertex(&Vector2::new(1, 1), &Vector2::new(3, 3)).unwrap();
    assert_eq!(entry.offset, Vector2::new(2, 2));
    assert_eq!(entry.index, 12);

    let entry = position_relative_to_coarse_vertex(&Vector3::new(1, 0, 1), &Vector3::new(1, 2, 2)).unwrap();
    assert_eq!(entry.offset, Vector3::new(0, 4, 1));

    assert!(position_relative_to_coarse_vertex(&Vector2::new(1, 0), &Vector2::new(0, 0)).is_none());
    assert!(position_relative_to_coarse_vertex(&Vector2::new(0, 0), &Vector2::new(3, 0)).is_none());
    assert!(position_relative_to_coarse_vertex(&Vector3::new(0, 0, 1), &Vector3::new(1, 1, 0)).is_none());
}

#[test]
#[should_panic]
fn position_relative_to_coarse_vertex_rejects_invalid_coarse_vertex() {
    position_relative_to_coarse_vertex(&Vector2::new(2, 0), &Vector2::new(1, 1));
}

#[test]
#[should_panic]
fn position_relative_to_coarse_vertex_rejects_invalid_fine_position_on_later_axis() {
    // The first axis alone already rules out any influence
    position_relative_to_coarse_vertex(&Vector2::new(1, 0), &Vector2::new(0, 9));
}

#[test]
fn d_linear_cell_transfer_at_inner_fine_cell() {
    let positions = fine_cell_at::<U2>(&[1, 1]);
    let transfer = cell_transfer_operator(&d_linear_operators::<U2>(), &positions);

    assert_scalar_eq!(transfer[(0, 0)], 4.0 / 9.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(transfer[(0, 1)], 2.0 / 9.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(transfer[(0, 3)], 1.0 / 9.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(transfer[(3, 3)], 4.0 / 9.0, comp = abs, tol = 1e-14);
    assert_is_d_linear_cell_transfer(&transfer, &positions);

    for row in transfer.row_iter() {
        assert_scalar_eq!(row.sum(), 1.0, comp = abs, tol = 1e-14);
    }

    let prolonged = prolong_cell_values(&d_linear_operators::<U2>(), &positions, &Vector4::repeat(1.0));
    assert_matrix_eq!(prolonged, Vector4::repeat(0.25), comp = abs, tol = 1e-14);
}

#[test]
fn contribution_weight_counts_influencing_evaluations() {
    let operator = d_linear_interpolation::<f64, U2>();
    let mut counter = StencilEvaluationCounter::new();

    let weight = contribution_weight(&Vector2::new(0, 1), &operator, &Vector2::new(2, 3), &mut counter);
    assert_scalar_eq!(weight, 1.0 / 3.0, comp = abs, tol = 1e-14);
    assert_eq!(counter.count(), 1);

    let weight = contribution_weight(&Vector2::new(0, 0), &operator, &Vector2::new(2, 3), &mut counter);
    assert_eq!(weight, 0.0);
    assert_eq!(counter.count(), 1);
}

#[test]
fn petrov_galerkin_operator_of_identity_transfer_is_fine_operator() {
    // Transfer stencils with only a centre weight inject coarse vertices into coincident fine
    // vertices, and the middle fine cell of a coarse cell contains no such vertex
    let mut operators = CellTransferStencils::<f64, U2>::zeros();
    operators.row_mut(12).fill(1.0);
    let fine_matrix = stencil_to_element_matrix::<f64, U2>(&laplacian(1.0, &Vector2::new(1.0, 1.0)));

    let positions = fine_cell_at::<U2>(&[1, 1]);
    let coarse_matrix = petrov_galerkin_coarse_operator(&operators, &operators, &positions, &fine_matrix);
    assert_matrix_eq!(coarse_matrix, CellTransferMatrix::<f64, U2>::zeros());

    // In the lower left fine cell only coarse vertex 0 sees fine vertex 0
    let positions = fine_cell_at::<U2>(&[0, 0]);
    let coarse_matrix = petrov_galerkin_coarse_operator(&operators, &operators, &positions, &fine_matrix);
    let mut expected = CellTransferMatrix::<f64, U2>::zeros();
    expected[(0, 0)] = fine_matrix[(0, 0)];
    assert_matrix_eq!(coarse_matrix, expected, comp = abs, tol = 1e-14);
}

#[test]
fn cell_residual_of_exact_solution_vanishes() {
    let matrix = stencil_to_element_matrix::<f64, U2>(&laplacian(1.0, &Vector2::new(1.0, 1.0)));
    let values = Vector4::new(1.0, -2.0, 0.5, 3.0);
    let rhs = matrix * values;
    assert_matrix_eq!(compute_cell_residual::<f64, U2>(&values, &rhs, &matrix), Vector4::<f64>::zeros(), comp = abs, tol = 1e-14);
    assert_matrix_eq!(compute_cell_residual::<f64, U2>(&Vector4::zeros(), &rhs, &matrix), rhs);
}

#[test]
fn element_update_positions_match_table() {
    let positions = element_update_positions::<U2>();
    for c in 0..4 {
        for f in 0..4 {
            assert_eq!(positions[(c, f)], ELEMENT_UPDATE_POSITIONS_2D[c][f]);
        }
    }
    assert_eq!(element_update_positions::<U3>()[(0, 7)], 26);
}

#[test]
fn transfer_block_positions_match_table() {
    let positions = transfer_block_positions::<U2>();
    for c in 0..4 {
        for i in 0..9 {
            assert_eq!(positions[(i, c)], TRANSFER_BLOCK_POSITIONS_2D[c][i]);
        }
    }
}

fn assert_cell_updates_reassemble_stencil<D>(stencil: &Stencil<f64, D>)
where
    D: GridDim,
    DefaultAllocator: GridAllocator<f64, D>,
{
    // A vertex has local index c in exactly one of its 2^d adjacent cells
    let update = stencil_to_element_matrix::<f64, D>(stencil);
    let mut assembled = Stencil::<f64, D>::zeros();
    for c in 0..D::TwoPow::dim() {
        let mut vertex_stencils = VectorOfStencils::<f64, D>::zeros();
        add_update_to_stencils::<f64, D>(&mut vertex_stencils, &update);
        assembled += vertex_stencils.column(c);
    }
    assert_matrix_eq!(assembled, stencil, comp = abs, tol = 1e-13);
}

#[test]
fn cell_updates_reassemble_vertex_stencil() {
    assert_cell_updates_reassemble_stencil::<U2>(&laplacian(1.0, &Vector2::new(1.0, 2.0)));
    assert_cell_updates_reassemble_stencil::<U3>(&laplacian(1.0, &Vector3::new(1.0, 2.0, 0.5)));
}

#[test]
fn fill_in_transfer_stencils_writes_blocks_only() {
    let blocks = VectorOfStencils::<f64, U2>::from_fn(|i, c| (10 * c + i) as f64);
    let mut operators = CellTransferStencils::<f64, U2>::repeat(-1.0);
    fill_in_transfer_stencils::<f64, U2>(&blocks, &mut operators);

    assert_eq!(operators[(12, 0)], 0.0);
    assert_eq!(operators[(24, 0)], 8.0);
    assert_eq!(operators[(10, 1)], 10.0);
    assert_eq!(operators[(2, 2)], 20.0);
    assert_eq!(operators[(12, 3)], 38.0);
    assert_eq!(operators[(0, 0)], -1.0);
    assert_eq!(operators[(24, 3)], -1.0);
}

proptest! {
    #[test]
    fn d_linear_cell_transfer_2d(positions in fine_vertex_positions::<U2>()) {
        let transfer = cell_transfer_operator(&d_linear_operators::<U2>(), &positions);
        assert_is_d_linear_cell_transfer(&transfer, &positions);
    }

    #[test]
    fn d_linear_cell_transfer_3d(positions in fine_vertex_positions::<U3>()) {
        let transfer = cell_transfer_operator(&d_linear_operators::<U3>(), &positions);
        assert_is_d_linear_cell_transfer(&transfer, &positions);

        let prolonged = prolong_cell_values(&d_linear_operators::<U3>(), &positions, &ElementVector::<f64, U3>::repeat(1.0));
        assert_matrix_eq!(prolonged, ElementVector::<f64, U3>::repeat(0.125), comp = abs, tol = 1e-14);
    }

    #[test]
    fn restriction_is_transpose_of_prolongation(
        operators in cell_transfer_stencils::<U2>(),
        positions in fine_vertex_positions::<U2>(),
        fine_values in element_vector::<U2>(),
    ) {
        let prolongation = cell_transfer_operator(&operators, &positions);
        let restricted = restrict_cell_values(&operators, &positions, &fine_values);
        assert_matrix_eq!(restricted, prolongation.transpose() * fine_values / 4.0, comp = abs, tol = 1e-12);

        let coarse_values = fine_values;
        let prolonged = prolong_cell_values(&operators, &positions, &coarse_values);
        assert_matrix_eq!(prolonged, prolongation * coarse_values / 4.0, comp = abs, tol = 1e-12);
    }

    #[test]
    fn galerkin_operator_preserves_symmetry(
        operators in cell_transfer_stencils::<U3>(),
        positions in fine_vertex_positions::<U3>(),
        a in element_matrix::<U3>(),
    ) {
        let symmetric = &a + a.transpose();
        let coarse = petrov_galerkin_coarse_operator(&operators, &operators, &positions, &symmetric);
        assert_matrix_eq!(coarse, coarse.transpose(), comp = abs, tol = 1e-10);

        let p = cell_transfer_operator(&operators, &positions);
        assert_matrix_eq!(coarse, p.transpose() * symmetric * p, comp = abs, tol = 1e-10);
    }
}
