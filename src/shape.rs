//! Shape and index arithmetic shared by buffers, iterators and datasets.
//!
//! Shapes are row-major: the last axis varies fastest and its default stride is 1.
//! A shape with any zero-length axis has zero elements; the empty shape `[]` is a rank-0
//! shape holding exactly one element.

use smallvec::SmallVec;

use crate::{
    consts::INLINE_RANK,
    error::{DatasetError, Result},
};

pub type Shape = SmallVec<[usize; INLINE_RANK]>;
pub type Strides = SmallVec<[isize; INLINE_RANK]>;

/// Number of elements held by `shape`.
pub fn num_elements(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| DatasetError::InvalidShape {
            shape: shape.iter().map(|&d| d as i64).collect(),
            reason: "element count overflows usize",
        })
}

/// Byte size of `shape` elements of `width` bytes each.
pub fn byte_len(shape: &[usize], width: usize) -> Result<usize> {
    num_elements(shape)?
        .checked_mul(width)
        .ok_or_else(|| DatasetError::InvalidShape {
            shape: shape.iter().map(|&d| d as i64).collect(),
            reason: "byte size overflows usize",
        })
}

/// Validate signed dimensions, as handed over by foreign callers, and convert them to a [`Shape`].
pub fn shape_from_dims(dims: &[i64]) -> Result<Shape> {
    let mut shape = Shape::with_capacity(dims.len());
    for &d in dims {
        if d < 0 {
            return Err(DatasetError::InvalidShape {
                shape: dims.to_vec(),
                reason: "negative component in shape is not allowed",
            });
        }
        shape.push(usize::try_from(d).map_err(|_| DatasetError::InvalidShape {
            shape: dims.to_vec(),
            reason: "dimension does not fit usize",
        })?);
    }
    num_elements(&shape)?;
    Ok(shape)
}

/// Element count of signed dimensions; fails on any negative dimension.
pub fn element_count(dims: &[i64]) -> Result<usize> {
    num_elements(&shape_from_dims(dims)?)
}

/// Default (contiguous, row-major) strides for `shape`, in elements.
pub fn row_major_strides(shape: &[usize]) -> Strides {
    let mut strides: Strides = smallvec::smallvec![1; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1].max(1) as isize;
    }
    strides
}

/// Dot product of `coords` with `strides` (row-major defaults when `None`).
///
/// # Errors
/// - [`DatasetError::ShapeMismatch`] when `coords` does not have one entry per axis.
/// - [`DatasetError::IndexOutOfRange`] when any coordinate lies outside `[0, dim)`.
pub fn linear_offset(
    shape: &[usize],
    strides: Option<&[isize]>,
    coords: &[usize],
) -> Result<isize> {
    if coords.len() != shape.len() {
        return Err(DatasetError::shape_mismatch(shape, coords));
    }
    check_position(shape, coords)?;
    let offset = match strides {
        Some(strides) => coords
            .iter()
            .zip(strides.iter())
            .map(|(&c, &s)| c as isize * s)
            .sum(),
        None => {
            let mut offset = 0isize;
            for (&c, &d) in coords.iter().zip(shape.iter()) {
                offset = offset * d as isize + c as isize;
            }
            offset
        }
    };
    Ok(offset)
}

pub(crate) fn check_position(shape: &[usize], coords: &[usize]) -> Result<()> {
    for (axis, (&c, &d)) in coords.iter().zip(shape.iter()).enumerate() {
        if c >= d {
            return Err(DatasetError::IndexOutOfRange {
                axis,
                index: c as i64,
                len: d,
            });
        }
    }
    Ok(())
}

/// Map a possibly negative index onto `[0, len)`, wrapping negatives once.
pub fn resolve_index(index: i64, len: usize, axis: usize) -> Result<usize> {
    let len_i = len as i64;
    let resolved = if index < 0 { index + len_i } else { index };
    if resolved < 0 || resolved >= len_i {
        return Err(DatasetError::IndexOutOfRange { axis, index, len });
    }
    Ok(resolved as usize)
}

/// Convert a row-major flat position into per-axis coordinates.
pub fn unravel(shape: &[usize], mut flat: usize) -> Shape {
    let mut pos: Shape = smallvec::smallvec![0; shape.len()];
    for d in (0..shape.len()).rev() {
        let dim = shape[d].max(1);
        pos[d] = flat % dim;
        flat /= dim;
    }
    pos
}

/// Drop every length-1 axis.
///
/// With `keep_singleton`, a shape made only of length-1 axes squeezes to `[1]`
/// instead of the rank-0 shape.
pub fn squeeze(shape: &[usize], keep_singleton: bool) -> Shape {
    let squeezed: Shape = shape.iter().copied().filter(|&d| d != 1).collect();
    if squeezed.is_empty() && keep_singleton && !shape.is_empty() {
        return smallvec::smallvec![1];
    }
    squeezed
}

/// Broadcast two shapes aligned at their trailing axes.
///
/// Corresponding sizes must be equal, or one of them must be 1 or absent.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Shape> {
    let rank = a.len().max(b.len());
    let mut out: Shape = smallvec::smallvec![0; rank];
    for i in 0..rank {
        let da = if i < rank - a.len() { 1 } else { a[i - (rank - a.len())] };
        let db = if i < rank - b.len() { 1 } else { b[i - (rank - b.len())] };
        out[i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(DatasetError::shape_mismatch(a, b));
        };
    }
    Ok(out)
}

/// Whether `source` can be assigned into a region of shape `target`.
///
/// Shapes match when they broadcast to `target`, or when they are equal after squeezing away
/// length-1 axes.
pub fn are_shapes_compatible(target: &[usize], source: &[usize]) -> bool {
    if let Ok(b) = broadcast_shape(target, source) {
        if b.as_slice() == target {
            return true;
        }
    }
    squeeze(target, false) == squeeze(source, false)
}
