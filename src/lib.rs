//! Intergrid transfer and coarse-grid operators for geometric multigrid on regular grids.
//!
//! Operators are described per vertex by stencils: a `3^d` stencil couples a vertex to its
//! neighbors on the same level, and a `5^d` transfer stencil describes how the value of a
//! coarse vertex spreads to the fine vertices of a grid refined by a factor of three. All
//! routines work on a single cell at a time and are meant to be invoked by a grid traversal,
//! which accumulates the cell-wise results at the vertices.
pub mod allocators;
pub mod boxmg;
pub mod element_matrix;
pub mod index;
pub mod linalg;
pub mod multigrid;
pub mod stencil;
pub mod transfer;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;

pub use intergrid_traits::{GridDim, Real};
