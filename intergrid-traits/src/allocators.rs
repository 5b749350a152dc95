//! Helper traits for allocator trait bounds.
use crate::dim::GridDim;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Scalar, U1};

/// An allocator for a single dimension.
pub trait DimAllocator<T: Scalar, D: DimName>:
    Allocator<T, D>
    + Allocator<T, D, D>
    + Allocator<T, U1, D>
    // Integer coordinates and index tables
    + Allocator<usize, D>
    + Allocator<usize, D, D>
{
}

impl<T, D> DimAllocator<T, D> for DefaultAllocator
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>
        + Allocator<T, D, D>
        + Allocator<T, U1, D>
        + Allocator<usize, D>
        + Allocator<usize, D, D>,
{
}

/// An allocator for all the local buffers of a multigrid patch in dimension `D`.
///
/// Covers coordinates (`D`), element matrices (`2^d x 2^d`), stencils (`3^d`), transfer
/// stencils (`5^d`) and the per-cell collections of these (one column per cell vertex).
pub trait GridAllocator<T: Scalar, D: GridDim>:
    DimAllocator<T, D>
    + DimAllocator<T, D::TwoPow>
    + Allocator<T, D::ThreePow>
    + Allocator<T, D::FivePow>
    + Allocator<T, D::ThreePow, D::TwoPow>
    + Allocator<T, D::FivePow, D::TwoPow>
    + Allocator<T, D::ThreePow, D::FourPow>
    + Allocator<usize, D, D::TwoPow>
    + Allocator<usize, D::ThreePow, D::TwoPow>
{
}

impl<T, D> GridAllocator<T, D> for DefaultAllocator
where
    T: Scalar,
    D: GridDim,
    DefaultAllocator: DimAllocator<T, D>
        + DimAllocator<T, D::TwoPow>
        + Allocator<T, D::ThreePow>
        + Allocator<T, D::FivePow>
        + Allocator<T, D::ThreePow, D::TwoPow>
        + Allocator<T, D::FivePow, D::TwoPow>
        + Allocator<T, D::ThreePow, D::FourPow>
        + Allocator<usize, D, D::TwoPow>
        + Allocator<usize, D::ThreePow, D::TwoPow>,
{
}
