//! Type-level spatial dimensions and the patch sizes derived from them.
use nalgebra::{Const, DimName, U2, U3};

/// A spatial dimension `d` for which multigrid patches are defined.
///
/// All local buffers of the crate are sized by powers of the dimension: a cell has `2^d`
/// vertices, a stencil has `3^d` entries, a refined cell cluster has `4^d` fine vertices and
/// an intergrid transfer stencil has `5^d` entries. These sizes are exposed as associated
/// dimensions so that buffers can be stack-allocated nalgebra matrices.
///
/// Implemented for [`U2`] and [`U3`].
pub trait GridDim: DimName {
    /// `2^d`, the number of vertices of a cell.
    type TwoPow: DimName;
    /// `3^d`, the number of entries of a stencil.
    type ThreePow: DimName;
    /// `4^d`, the number of fine vertices in a patch spanned by one coarse cell.
    type FourPow: DimName;
    /// `5^d`, the number of entries of an intergrid transfer stencil.
    type FivePow: DimName;
}

impl GridDim for U2 {
    type TwoPow = Const<4>;
    type ThreePow = Const<9>;
    type FourPow = Const<16>;
    type FivePow = Const<25>;
}

impl GridDim for U3 {
    type TwoPow = Const<8>;
    type ThreePow = Const<27>;
    type FourPow = Const<64>;
    type FivePow = Const<125>;
}
