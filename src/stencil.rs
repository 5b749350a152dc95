//! Construction of stencils from one-dimensional building blocks.
//!
//! A d-dimensional stencil is stored as a vector of `3^d` weights, one per offset in
//! `{-1, 0, 1}^d`, linearised with dimension 0 fastest (see [`crate::index`]). Isotropic
//! operators such as the mass matrix are a single tensor product of 1D stencils, while
//! directional operators such as the Laplacian are a sum of tensor products with one term
//! per spatial direction.
use crate::allocators::GridAllocator;
use crate::index::{linearise, patch_iter, PatchCoords};
use crate::{GridDim, Real};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OVector, SVector, Vector3, Vector5};
use numeric_literals::replace_float_literals;

/// A `3^d` stencil.
pub type Stencil<T, D> = OVector<T, <D as GridDim>::ThreePow>;

/// A `5^d` intergrid transfer stencil, indexed by offset in `{0, ..., 4}^d` relative to the
/// coarse vertex.
pub type TransferStencil<T, D> = OVector<T, <D as GridDim>::FivePow>;

/// The largest spatial dimension supported by the dimension-generic stencil factories.
const MAX_DIM: usize = 3;

fn assert_positive_spacing<T: Real>(h: T) {
    assert!(h > T::zero(), "Mesh spacing must be strictly positive, got {}.", h);
}

/// `[-1, 2, -1]`
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn laplace_1d_unscaled<T: Real>() -> Vector3<T> {
    Vector3::new(-1.0, 2.0, -1.0)
}

/// `[-1, 2, -1] / h`
///
/// Panics if `h` is not strictly positive.
pub fn laplace_1d<T: Real>(h: T) -> Vector3<T> {
    assert_positive_spacing(h);
    laplace_1d_unscaled() / h
}

/// `[1/6, 4/6, 1/6]`
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn mass_1d_unscaled<T: Real>() -> Vector3<T> {
    Vector3::new(1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0)
}

/// `[1/6, 4/6, 1/6] * h`
///
/// Panics if `h` is not strictly positive.
pub fn mass_1d<T: Real>(h: T) -> Vector3<T> {
    assert_positive_spacing(h);
    mass_1d_unscaled() * h
}

/// `[0, 1, 0]`
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn identity_1d<T: Real>() -> Vector3<T> {
    Vector3::new(0.0, 1.0, 0.0)
}

/// `[1/2, 0, 1/2]`
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn mean_value_1d<T: Real>() -> Vector3<T> {
    Vector3::new(0.5, 0.0, 0.5)
}

/// Linear interpolation onto a grid refined by a factor of three: `[1/3, 2/3, 1, 2/3, 1/3]`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn linear_interpolation_1d<T: Real>() -> Vector5<T> {
    Vector5::new(1.0 / 3.0, 2.0 / 3.0, 1.0, 2.0 / 3.0, 1.0 / 3.0)
}

/// Writes the tensor product of the given factors into `output`, with the first factor
/// varying fastest.
///
/// Panics if the length of `output` is not the product of the factor lengths.
fn tensor_product_into<T: Real>(factors: &[&[T]], output: &mut [T]) {
    let expected_len: usize = factors.iter().map(|factor| factor.len()).product();
    assert_eq!(
        output.len(),
        expected_len,
        "Output length must equal the product of the lengths of the factors."
    );

    for (linear_index, entry) in output.iter_mut().enumerate() {
        let mut remainder = linear_index;
        let mut value = T::one();
        for factor in factors {
            value *= factor[remainder % factor.len()];
            remainder /= factor.len();
        }
        *entry = value;
    }
}

/// Stencil product (outer product) of two stencils.
///
/// ```text
/// a * b = [a_0 b_2, a_1 b_2, a_2 b_2]
///         [a_0 b_1, a_1 b_1, a_2 b_1]
///         [a_0 b_0, a_1 b_0, a_2 b_0]
/// ```
///
/// The result is stored with `a` varying fastest, i.e. `result[i + j * LA] = a[i] * b[j]`.
/// Typical operands are 1D stencils of length 3 or 5. The output length `LAB` is normally
/// inferred from the context and must equal `LA * LB`, otherwise the function panics.
pub fn stencil_product<T, const LA: usize, const LB: usize, const LAB: usize>(
    a: &SVector<T, LA>,
    b: &SVector<T, LB>,
) -> SVector<T, LAB>
where
    T: Real,
{
    let mut result = SVector::<T, LAB>::zeros();
    tensor_product_into(&[a.as_slice(), b.as_slice()], result.as_mut_slice());
    result
}

/// Stencil product of three stencils, equivalent to `a * (b * c)`.
///
/// `result[i + j * LA + k * LA * LB] = a[i] * b[j] * c[k]`.
pub fn stencil_product3<T, const LA: usize, const LB: usize, const LC: usize, const LABC: usize>(
    a: &SVector<T, LA>,
    b: &SVector<T, LB>,
    c: &SVector<T, LC>,
) -> SVector<T, LABC>
where
    T: Real,
{
    let mut result = SVector::<T, LABC>::zeros();
    tensor_product_into(&[a.as_slice(), b.as_slice(), c.as_slice()], result.as_mut_slice());
    result
}

/// Tensor product over all `d` spatial directions of the 1D stencils produced by
/// `one_dimensional(direction)`.
fn tensor_power<T, R, const L: usize>(dim: usize, one_dimensional: impl Fn(usize) -> SVector<T, L>) -> OVector<T, R>
where
    T: Real,
    R: DimName,
    DefaultAllocator: Allocator<T, R>,
{
    assert!(dim <= MAX_DIM, "Stencils are only supported up to dimension {}.", MAX_DIM);
    let stencils: [SVector<T, L>; MAX_DIM] =
        std::array::from_fn(|direction| if direction < dim { one_dimensional(direction) } else { SVector::<T, L>::from([T::zero(); L]) });
    let factors = [stencils[0].as_slice(), stencils[1].as_slice(), stencils[2].as_slice()];

    let mut result = OVector::<T, R>::zeros();
    tensor_product_into(&factors[..dim], result.as_mut_slice());
    result
}

/// Laplacian with a material scaling per direction and mesh spacing `h`.
///
/// The term for direction `i` is the tensor product of the 1D Laplacian along `i` with the 1D
/// mass stencils along all other directions, scaled by `scaling[i]`.
pub fn anisotropic_laplacian<T, D>(scaling: &OVector<T, D>, h: &OVector<T, D>) -> Stencil<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let mut result = Stencil::<T, D>::zeros();
    for direction in 0..D::dim() {
        let term: Stencil<T, D> = tensor_power(D::dim(), |i| {
            if i == direction {
                laplace_1d(h[i])
            } else {
                mass_1d(h[i])
            }
        });
        result += term * scaling[direction];
    }
    result
}

/// Laplacian scaled by a scalar material coefficient.
pub fn laplacian<T, D>(scaling: T, h: &OVector<T, D>) -> Stencil<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    anisotropic_laplacian(&OVector::<T, D>::repeat(scaling), h)
}

/// Mass matrix stencil, the tensor product of the 1D mass stencils.
pub fn mass_matrix<T, D>(h: &OVector<T, D>) -> Stencil<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    tensor_power(D::dim(), |i| mass_1d(h[i]))
}

/// Identity stencil scaled by the cell volume.
pub fn identity<T, D>(h: &OVector<T, D>) -> Stencil<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    let volume = h.iter().fold(T::one(), |volume, &h_i| volume * h_i);
    let stencil: Stencil<T, D> = tensor_power(D::dim(), |_| identity_1d());
    stencil * volume
}

/// Transfer stencil of d-linear interpolation onto a grid refined by a factor of three.
pub fn d_linear_interpolation<T, D>() -> TransferStencil<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    tensor_power(D::dim(), |_| linear_interpolation_1d())
}

/// Returns a stencil in which the roles of the dimensions `first` and `second` are exchanged.
///
/// This rotates or reflects a stencil, so several stencils can be derived from one
/// anisotropic base stencil.
pub fn exchange_coordinates<T, D>(stencil: &Stencil<T, D>, first: usize, second: usize) -> Stencil<T, D>
where
    T: Real,
    D: GridDim,
    DefaultAllocator: GridAllocator<T, D>,
{
    assert!(
        first < D::dim() && second < D::dim(),
        "Cannot exchange coordinates {} and {} of a stencil in {} dimensions.",
        first,
        second,
        D::dim()
    );

    let mut result = Stencil::<T, D>::zeros();
    for destination in patch_iter::<D>(3) {
        let mut source: PatchCoords<D> = destination.clone();
        source.swap_rows(first, second);
        result[linearise(&destination, 3)] = stencil[linearise(&source, 3)];
    }
    result
}
