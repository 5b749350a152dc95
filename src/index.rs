//! Index arithmetic for small d-dimensional patches.
//!
//! A patch with side length `L` consists of `L^d` points with integer coordinates in
//! `[0, L)^d`. Points are linearised with a mixed-radix encoding in which dimension 0 is the
//! least significant digit, so traversing linear indices in increasing order moves fastest
//! along dimension 0. The side lengths in use are 2 (cell vertices), 3 (stencils),
//! 4 (fine vertices of a refined cell cluster) and 5 (intergrid transfer stencils).
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OVector};
use std::marker::PhantomData;

/// Integer coordinates of a point within a patch.
pub type PatchCoords<D> = OVector<usize, D>;

/// Returns `side^d`, the number of points in a patch with the given side length.
pub fn patch_size<D: DimName>(side: usize) -> usize {
    side.pow(D::dim() as u32)
}

/// Maps patch coordinates to the linear index of the point.
///
/// Panics if any coordinate is not smaller than `side`.
pub fn linearise<D>(coords: &PatchCoords<D>, side: usize) -> usize
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    let mut index = 0;
    let mut stride = 1;
    for (axis, &coord) in coords.iter().enumerate() {
        assert!(
            coord < side,
            "Coordinate {} along axis {} is out of range for a patch of side length {}.",
            coord,
            axis,
            side
        );
        index += stride * coord;
        stride *= side;
    }
    index
}

/// Maps a linear index back to patch coordinates.
///
/// Panics if `index` is not smaller than `side^d`.
pub fn delinearise<D>(index: usize, side: usize) -> PatchCoords<D>
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    assert!(
        index < patch_size::<D>(side),
        "Linear index {} is out of range for a patch of side length {} in {} dimensions.",
        index,
        side,
        D::dim()
    );
    let mut remainder = index;
    let mut coords = PatchCoords::<D>::zeros();
    for coord in coords.iter_mut() {
        *coord = remainder % side;
        remainder /= side;
    }
    coords
}

/// Linear index of the centre ("self") entry of a `3^d` stencil, i.e. `sum_k 3^k`.
pub fn stencil_centre_index<D: DimName>() -> usize {
    (0..D::dim()).map(|k| 3usize.pow(k as u32)).sum()
}

/// Linear index of a cell vertex with coordinates in `{0, 1}^d`.
pub fn vertex_index<D>(coords: &PatchCoords<D>) -> usize
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    linearise(coords, 2)
}

/// Linear index of a stencil entry with offset coordinates in `{0, 1, 2}^d`.
pub fn stencil_index<D>(coords: &PatchCoords<D>) -> usize
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    linearise(coords, 3)
}

/// Linear index of a transfer stencil entry with offset coordinates in `{0, ..., 4}^d`.
pub fn transfer_stencil_index<D>(coords: &PatchCoords<D>) -> usize
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    linearise(coords, 5)
}

/// Iterator over all coordinates of a patch, in linearisation order.
///
/// The iterator is finite and cheap to clone, so a cloned iterator restarts the traversal
/// from wherever the original was at the time of cloning.
#[derive(Debug, Clone)]
pub struct PatchIter<D> {
    side: usize,
    next: usize,
    len: usize,
    marker: PhantomData<D>,
}

impl<D: DimName> PatchIter<D> {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            next: 0,
            len: patch_size::<D>(side),
            marker: PhantomData,
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }
}

impl<D> Iterator for PatchIter<D>
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
    type Item = PatchCoords<D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.len {
            let coords = delinearise(self.next, self.side);
            self.next += 1;
            Some(coords)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<D> ExactSizeIterator for PatchIter<D>
where
    D: DimName,
    DefaultAllocator: Allocator<usize, D>,
{
}

/// Iterates over all points of the patch with the given side length.
pub fn patch_iter<D: DimName>(side: usize) -> PatchIter<D> {
    PatchIter::new(side)
}

/// Iterates over the `2^d` vertices of a cell.
pub fn cell_vertices<D: DimName>() -> PatchIter<D> {
    PatchIter::new(2)
}
