//! The affine mapping from a dataset's index space into its buffer.

use crate::{
    error::{DatasetError, Result},
    shape::{self, Shape, Strides},
};

/// Shape plus optional strides and a starting offset.
///
/// `strides == None` means contiguous row-major storage. Every position inside `shape` maps to
/// `offset + Σ pos[d] * strides[d]`, which must stay inside the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub shape: Shape,
    pub strides: Option<Strides>,
    pub offset: usize,
}

impl Layout {
    pub fn contiguous(shape: &[usize]) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            strides: None,
            offset: 0,
        }
    }

    /// A strided layout; fails when any reachable index falls outside `buffer_len`.
    pub fn strided(
        shape: &[usize],
        strides: &[isize],
        offset: usize,
        buffer_len: usize,
    ) -> Result<Self> {
        if strides.len() != shape.len() {
            return Err(DatasetError::shape_mismatch(shape, &[strides.len()]));
        }
        let layout = Self {
            shape: Shape::from_slice(shape),
            strides: Some(Strides::from_slice(strides)),
            offset,
        };
        layout.check_bounds(buffer_len)?;
        Ok(layout)
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when elements occupy `offset..offset + size` in row-major order.
    pub fn is_contiguous(&self) -> bool {
        match &self.strides {
            None => true,
            Some(strides) => strides.as_slice() == shape::row_major_strides(&self.shape).as_slice(),
        }
    }

    pub fn effective_strides(&self) -> Strides {
        match &self.strides {
            Some(strides) => strides.clone(),
            None => shape::row_major_strides(&self.shape),
        }
    }

    /// Whether both layouts map every position to the same buffer index.
    pub fn same_mapping(&self, other: &Layout) -> bool {
        self.shape == other.shape
            && self.offset == other.offset
            && self.effective_strides() == other.effective_strides()
    }

    /// Buffer index of `pos`, validating the position against the shape.
    pub fn index_of(&self, pos: &[usize]) -> Result<usize> {
        let rel = shape::linear_offset(&self.shape, self.strides.as_deref(), pos)?;
        Ok((self.offset as isize + rel) as usize)
    }

    /// Buffer index of the row-major flat position `flat`.
    pub fn index_of_flat(&self, flat: usize) -> Result<usize> {
        let size = self.size();
        if flat >= size {
            return Err(DatasetError::IndexOutOfRange {
                axis: 0,
                index: flat as i64,
                len: size,
            });
        }
        if self.strides.is_none() {
            return Ok(self.offset + flat);
        }
        self.index_of(&shape::unravel(&self.shape, flat))
    }

    /// Buffer index of a position already known to be in range.
    pub(crate) fn index_unchecked(&self, strides: &[isize], pos: &[usize]) -> usize {
        let rel: isize = pos.iter().zip(strides.iter()).map(|(&p, &s)| p as isize * s).sum();
        (self.offset as isize + rel) as usize
    }

    /// Lowest and highest reachable buffer index must lie inside `[0, buffer_len)`.
    pub fn check_bounds(&self, buffer_len: usize) -> Result<()> {
        if self.size() == 0 {
            return Ok(());
        }
        let strides = self.effective_strides();
        let mut lo = self.offset as isize;
        let mut hi = self.offset as isize;
        for (&dim, &stride) in self.shape.iter().zip(strides.iter()) {
            let span = stride * (dim as isize - 1);
            if span >= 0 {
                hi += span;
            } else {
                lo += span;
            }
        }
        if lo < 0 {
            return Err(DatasetError::IndexOutOfRange {
                axis: 0,
                index: lo as i64,
                len: buffer_len,
            });
        }
        if hi as usize >= buffer_len {
            return Err(DatasetError::IndexOutOfRange {
                axis: 0,
                index: hi as i64,
                len: buffer_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_indexes_row_major() {
        let layout = Layout::contiguous(&[2, 3]);
        assert_eq!(layout.index_of(&[1, 2]).unwrap(), 5);
        assert_eq!(layout.index_of_flat(4).unwrap(), 4);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn strided_layout_applies_offset() {
        let layout = Layout::strided(&[2, 2], &[4, 2], 4, 16).unwrap();
        assert_eq!(layout.index_of(&[0, 0]).unwrap(), 4);
        assert_eq!(layout.index_of(&[1, 1]).unwrap(), 10);
        assert_eq!(layout.index_of_flat(3).unwrap(), 10);
        assert!(!layout.is_contiguous());
    }

    #[test]
    fn same_mapping_compares_strides_and_offset() {
        let plain = Layout::contiguous(&[4]);
        assert!(plain.same_mapping(&Layout::strided(&[4], &[1], 0, 4).unwrap()));
        assert!(!plain.same_mapping(&Layout::strided(&[4], &[2], 0, 8).unwrap()));
        assert!(!plain.same_mapping(&Layout::strided(&[4], &[1], 1, 8).unwrap()));
        assert!(!plain.same_mapping(&Layout::contiguous(&[2, 2])));
    }

    #[test]
    fn strided_layout_rejects_out_of_buffer_mapping() {
        let err = Layout::strided(&[3], &[4], 2, 10).unwrap_err();
        assert!(matches!(err, DatasetError::IndexOutOfRange { index: 10, .. }));
        let err = Layout::strided(&[3], &[-1], 1, 10).unwrap_err();
        assert!(matches!(err, DatasetError::IndexOutOfRange { index: -1, .. }));
    }
}
