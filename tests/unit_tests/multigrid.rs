use intergrid::index::{patch_iter, PatchCoords};
use intergrid::multigrid::{Multigrid, StencilEvaluationCounter};
use matrixcompare::assert_scalar_eq;
use nalgebra::{Vector2, Vector4, SVector, U2, U3};

#[test]
fn stencil_evaluation_counter() {
    let mut counter = StencilEvaluationCounter::new();
    assert_eq!(counter.count(), 0);
    counter.increment();
    counter.increment();

    let mut other = StencilEvaluationCounter::new();
    other.increment();
    counter.merge(&other);
    assert_eq!(counter.count(), 3);
    assert_eq!(other.count(), 1);

    counter.clear();
    assert_eq!(counter.count(), 0);
}

#[test]
fn d_linear_interpolated_value_at_inner_fine_vertex() {
    let mut multigrid = Multigrid::<f64, U2>::new();
    let coarse_values = Vector4::new(1.0, 2.0, 3.0, 4.0);

    let value = multigrid.d_linear_interpolated_value(&coarse_values, &Vector2::new(1, 1), 2.0);
    assert_scalar_eq!(value, 4.0, comp = abs, tol = 1e-14);
    assert_eq!(multigrid.number_of_stencil_updates(), 4);

    // Only the coincident coarse vertex influences a fine vertex at a corner of the patch
    let value = multigrid.d_linear_interpolated_value(&coarse_values, &Vector2::new(0, 0), 1.0);
    assert_scalar_eq!(value, 1.0, comp = abs, tol = 1e-14);
    assert_eq!(multigrid.number_of_stencil_updates(), 5);

    multigrid.clear_number_of_stencil_updates();
    assert_eq!(multigrid.number_of_stencil_updates(), 0);
}

#[test]
fn contribution_weight_is_counted() {
    let mut multigrid = Multigrid::<f64, U2>::new();
    let operator = multigrid.d_linear_interpolation().clone();

    let weight = multigrid.contribution_weight(&Vector2::new(1, 1), &operator, &Vector2::new(2, 2));
    assert_scalar_eq!(weight, 4.0 / 9.0, comp = abs, tol = 1e-14);
    let weight = multigrid.contribution_weight(&Vector2::new(1, 1), &operator, &Vector2::new(0, 2));
    assert_eq!(weight, 0.0);
    assert_eq!(multigrid.number_of_stencil_updates(), 1);
}

#[test]
fn worker_copies_start_with_cleared_counter_and_merge_back() {
    let mut master = Multigrid::<f64, U2>::new();
    let values = Vector4::repeat(1.0);
    master.d_linear_interpolated_value(&values, &Vector2::new(1, 1), 1.0);

    let mut worker = master.worker_copy();
    assert_eq!(worker.number_of_stencil_updates(), 0);
    assert_eq!(worker.d_linear_interpolation(), master.d_linear_interpolation());
    worker.d_linear_interpolated_value(&values, &Vector2::new(2, 2), 1.0);
    worker.d_linear_interpolated_value(&values, &Vector2::new(3, 3), 1.0);

    master.merge_with_worker(&worker);
    assert_eq!(master.number_of_stencil_updates(), 4 + 4 + 1);
}

#[test]
fn map_cells_par_matches_sequential_processing() {
    let coarse_values = SVector::<f64, 8>::from([1.0, -2.0, 0.5, 3.0, 4.0, -1.0, 2.0, 0.0]);
    let positions: Vec<PatchCoords<U3>> = patch_iter::<U3>(4).cycle().take(1000).collect();

    let mut sequential = Multigrid::<f64, U3>::new();
    let expected: Vec<f64> = positions
        .iter()
        .map(|position| sequential.d_linear_interpolated_value(&coarse_values, position, 0.5))
        .collect();

    let mut parallel = Multigrid::<f64, U3>::new();
    let values = parallel.map_cells_par(&positions, |multigrid, position| {
        multigrid.d_linear_interpolated_value(&coarse_values, position, 0.5)
    });

    assert_eq!(values, expected);
    assert!(sequential.number_of_stencil_updates() > 0);
    assert_eq!(parallel.number_of_stencil_updates(), sequential.number_of_stencil_updates());
}
