use crate::{
    error::{DatasetError, Result},
    iterator::{IndexIterator, SliceIterator},
    layout::Layout,
    shape::{self, Shape},
};

/// Positions of a target layout where a boolean mask is true.
///
/// The mask is aligned with the target at the trailing axes and broadcast over the target; it
/// may not be larger than the target.
#[derive(Debug, Clone)]
pub struct BooleanIterator {
    inner: SliceIterator,
    mask: Vec<bool>,
    /// Row-major strides of the mask, zeroed on broadcast axes.
    mask_strides: Shape,
    shape: Shape,
}

impl BooleanIterator {
    /// `mask` holds the mask values in row-major order of `mask_shape`.
    ///
    /// # Errors
    /// Returns [`DatasetError::ShapeMismatch`] when the mask does not broadcast onto the target,
    /// or when `mask.len()` disagrees with `mask_shape`.
    pub fn new(target: &Layout, mask_shape: &[usize], mask: Vec<bool>) -> Result<Self> {
        let mask_len = shape::num_elements(mask_shape)?;
        if mask.len() != mask_len {
            return Err(DatasetError::count_mismatch(mask.len(), mask_len));
        }
        let b = shape::broadcast_shape(&target.shape, mask_shape)?;
        if b.as_slice() != target.shape.as_slice() {
            return Err(DatasetError::shape_mismatch(&target.shape, mask_shape));
        }

        let row_major = shape::row_major_strides(mask_shape);
        let lead = target.rank() - mask_shape.len();
        let mut mask_strides: Shape = smallvec::smallvec![0; target.rank()];
        for (i, (&dim, &stride)) in mask_shape.iter().zip(row_major.iter()).enumerate() {
            if dim != 1 {
                mask_strides[lead + i] = stride as usize;
            }
        }

        let mut it = Self {
            inner: SliceIterator::full(target),
            mask,
            mask_strides,
            shape: Shape::new(),
        };
        let count = it.clone().count_selected();
        it.shape = smallvec::smallvec![count];
        Ok(it)
    }

    /// Number of selected positions.
    pub fn selected(&self) -> usize {
        self.shape[0]
    }

    fn count_selected(mut self) -> usize {
        let mut n = 0;
        while self.advance() {
            n += 1;
        }
        n
    }

    fn mask_at_current(&self) -> bool {
        let pos = self.inner.position().unwrap_or(&[]);
        let flat: usize = pos
            .iter()
            .zip(self.mask_strides.iter())
            .map(|(&p, &s)| p * s)
            .sum();
        self.mask[flat]
    }
}

impl IndexIterator for BooleanIterator {
    fn advance(&mut self) -> bool {
        while self.inner.advance() {
            if self.mask_at_current() {
                return true;
            }
        }
        false
    }

    fn index(&self) -> usize {
        self.inner.index()
    }

    fn position(&self) -> Option<&[usize]> {
        self.inner.position()
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }
}
