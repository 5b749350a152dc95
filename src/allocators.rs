//! Helper traits for allocator trait bounds.
pub use intergrid_traits::allocators::*;
