//! Stateful multigrid context used by a grid traversal.
//!
//! The only state carried across cells is the number of stencil evaluations, which serves as
//! a performance counter. Every parallel worker operates on its own copy of the context, and
//! the counters of all workers are merged back into the master once the parallel phase is
//! complete.
use crate::allocators::GridAllocator;
use crate::element_matrix::{ElementMatrix, ElementVector};
use crate::index::PatchCoords;
use crate::stencil::{d_linear_interpolation, TransferStencil};
use crate::transfer::{self, CellTransferMatrix, CellTransferStencils, FineVertexPositions};
use crate::{GridDim, Real};
use log::debug;
use nalgebra::DefaultAllocator;
use rayon::prelude::*;
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Counts the number of weights read from transfer stencils.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StencilEvaluationCounter {
    count: usize,
}

impl StencilEvaluationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Adds the evaluations recorded by `other`.
    pub fn merge(&mut self, other: &StencilEvaluationCounter) {
        self.count += other.count;
    }
}

#[derive(Debug, Clone)]
pub struct Multigrid<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    d_linear_interpolation: TransferStencil<T, D>,
    counter: StencilEvaluationCounter,
}

impl<T, D> Default for Multigrid<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D> Multigrid<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    pub fn new() -> Self {
        Self {
            d_linear_interpolation: d_linear_interpolation::<T, D>(),
            counter: StencilEvaluationCounter::new(),
        }
    }

    /// The transfer stencil of d-linear interpolation used by
    /// [`Self::d_linear_interpolated_value`].
    pub fn d_linear_interpolation(&self) -> &TransferStencil<T, D> {
        &self.d_linear_interpolation
    }

    /// A copy of the context for a parallel worker, with a cleared evaluation counter.
    pub fn worker_copy(&self) -> Self {
        Self {
            d_linear_interpolation: self.d_linear_interpolation.clone(),
            counter: StencilEvaluationCounter::new(),
        }
    }

    /// Accumulates the evaluations recorded by a worker copy.
    pub fn merge_with_worker(&mut self, worker: &Self) {
        debug!(
            "Merging {} stencil evaluations of worker into {}.",
            worker.counter.count(),
            self.counter.count()
        );
        self.counter.merge(&worker.counter);
    }

    pub fn number_of_stencil_updates(&self) -> usize {
        self.counter.count()
    }

    pub fn clear_number_of_stencil_updates(&mut self) {
        self.counter.clear();
    }

    /// See [`transfer::contribution_weight`].
    pub fn contribution_weight(
        &mut self,
        coarse_vertex: &PatchCoords<D>,
        operator: &TransferStencil<T, D>,
        fine_position: &PatchCoords<D>,
    ) -> T {
        transfer::contribution_weight(coarse_vertex, operator, fine_position, &mut self.counter)
    }

    /// Interpolates the coarse vertex values of a cell d-linearly onto a fine vertex and
    /// scales the result.
    pub fn d_linear_interpolated_value(
        &mut self,
        coarse_values: &ElementVector<T, D>,
        fine_position: &PatchCoords<D>,
        scaling: T,
    ) -> T {
        transfer::interpolated_value(
            &self.d_linear_interpolation,
            coarse_values,
            fine_position,
            scaling,
            &mut self.counter,
        )
    }

    /// See [`transfer::cell_transfer_operator`].
    pub fn cell_transfer_operator(
        &self,
        operators: &CellTransferStencils<T, D>,
        fine_positions: &FineVertexPositions<D>,
    ) -> CellTransferMatrix<T, D> {
        transfer::cell_transfer_operator(operators, fine_positions)
    }

    /// See [`transfer::prolong_cell_values`].
    pub fn prolong_cell_values(
        &self,
        operators: &CellTransferStencils<T, D>,
        fine_positions: &FineVertexPositions<D>,
        coarse_values: &ElementVector<T, D>,
    ) -> ElementVector<T, D> {
        transfer::prolong_cell_values(operators, fine_positions, coarse_values)
    }

    /// See [`transfer::restrict_cell_values`].
    pub fn restrict_cell_values(
        &self,
        operators: &CellTransferStencils<T, D>,
        fine_positions: &FineVertexPositions<D>,
        fine_values: &ElementVector<T, D>,
    ) -> ElementVector<T, D> {
        transfer::restrict_cell_values(operators, fine_positions, fine_values)
    }

    /// See [`transfer::petrov_galerkin_coarse_operator`].
    pub fn petrov_galerkin_coarse_operator(
        &self,
        prolongation: &CellTransferStencils<T, D>,
        restriction: &CellTransferStencils<T, D>,
        fine_positions: &FineVertexPositions<D>,
        fine_element_matrix: &ElementMatrix<T, D>,
    ) -> ElementMatrix<T, D> {
        transfer::petrov_galerkin_coarse_operator(prolongation, restriction, fine_positions, fine_element_matrix)
    }

    /// See [`transfer::compute_cell_residual`].
    pub fn compute_cell_residual(
        &self,
        values: &ElementVector<T, D>,
        rhs: &ElementVector<T, D>,
        element_matrix: &ElementMatrix<T, D>,
    ) -> ElementVector<T, D> {
        transfer::compute_cell_residual::<T, D>(values, rhs, element_matrix)
    }

    /// Processes independent cells in parallel.
    ///
    /// Each worker thread operates on its own [`worker copy`](Self::worker_copy) of the
    /// context. The evaluation counters of all workers are merged into `self` after every
    /// cell has been processed. The outputs are returned in the order of `cells`.
    ///
    /// The worker copy stays borrowed while `f` runs, so `f` must not use rayon itself:
    /// a nested parallel call may let the same thread pick up another cell and panic on the
    /// second borrow.
    pub fn map_cells_par<C, O, F>(&mut self, cells: &[C], f: F) -> Vec<O>
    where
        Self: Send + Sync,
        C: Sync,
        O: Send,
        F: Fn(&mut Self, &C) -> O + Sync,
    {
        let workers: ThreadLocal<RefCell<Self>> = ThreadLocal::new();
        let master = &*self;
        let outputs = cells
            .par_iter()
            .map(|cell| {
                let worker = &mut *workers
                    .get_or(|| RefCell::new(master.worker_copy()))
                    .borrow_mut();
                f(worker, cell)
            })
            .collect();

        for worker in workers {
            self.merge_with_worker(&worker.into_inner());
        }
        outputs
    }
}
