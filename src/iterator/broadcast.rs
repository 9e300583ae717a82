use crate::{
    error::{DatasetError, Result},
    iterator::{IndexIterator, PositionIterator},
    layout::Layout,
    shape::{self, Shape, Strides},
};

/// Walks the broadcast shape of two layouts, yielding an index into each.
///
/// `index` is the index into the first layout, `other_index` the index into the second.
#[derive(Debug, Clone)]
pub struct BroadcastIterator {
    positions: PositionIterator,
    a: Layout,
    b: Layout,
    a_strides: Strides,
    b_strides: Strides,
    shape: Shape,
    a_index: usize,
    b_index: usize,
}

/// Strides of `layout` lifted to `rank` axes, zero wherever the layout is broadcast.
fn broadcast_strides(layout: &Layout, rank: usize) -> Strides {
    let strides = layout.effective_strides();
    let lead = rank - layout.rank();
    let mut out: Strides = smallvec::smallvec![0; rank];
    for (i, (&dim, &stride)) in layout.shape.iter().zip(strides.iter()).enumerate() {
        if dim != 1 {
            out[lead + i] = stride;
        }
    }
    out
}

impl BroadcastIterator {
    /// # Errors
    /// Returns [`DatasetError::ShapeMismatch`] when the shapes do not broadcast.
    pub fn new(a: &Layout, b: &Layout) -> Result<Self> {
        let shape = shape::broadcast_shape(&a.shape, &b.shape)?;
        Ok(Self {
            positions: PositionIterator::new(&shape),
            a_strides: broadcast_strides(a, shape.len()),
            b_strides: broadcast_strides(b, shape.len()),
            a: a.clone(),
            b: b.clone(),
            shape,
            a_index: 0,
            b_index: 0,
        })
    }

    /// Like [`BroadcastIterator::new`], but the broadcast shape must equal the first layout's
    /// shape, as for in-place updates of `a` from `b`.
    pub fn onto(a: &Layout, b: &Layout) -> Result<Self> {
        let it = Self::new(a, b)?;
        if it.shape.as_slice() != a.shape.as_slice() {
            return Err(DatasetError::shape_mismatch(&a.shape, &b.shape));
        }
        Ok(it)
    }

    pub fn other_index(&self) -> usize {
        self.b_index
    }
}

impl IndexIterator for BroadcastIterator {
    fn advance(&mut self) -> bool {
        if !self.positions.advance() {
            return false;
        }
        let pos = self.positions.position().unwrap_or(&[]);
        self.a_index = self.a.index_unchecked(&self.a_strides, pos);
        self.b_index = self.b.index_unchecked(&self.b_strides, pos);
        true
    }

    fn index(&self) -> usize {
        self.a_index
    }

    /// Position inside the broadcast shape.
    fn position(&self) -> Option<&[usize]> {
        self.positions.position()
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(mut it: BroadcastIterator) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        while it.advance() {
            out.push((it.index(), it.other_index()));
        }
        out
    }

    #[test]
    fn row_broadcasts_over_matrix() {
        let a = Layout::contiguous(&[2, 3]);
        let b = Layout::contiguous(&[3]);
        let it = BroadcastIterator::new(&a, &b).unwrap();
        assert_eq!(it.shape(), &[2, 3]);
        assert_eq!(pairs(it), vec![(0, 0), (1, 1), (2, 2), (3, 0), (4, 1), (5, 2)]);
    }

    #[test]
    fn both_sides_broadcast() {
        let a = Layout::contiguous(&[2, 1]);
        let b = Layout::contiguous(&[1, 2]);
        let it = BroadcastIterator::new(&a, &b).unwrap();
        assert_eq!(it.shape(), &[2, 2]);
        assert_eq!(pairs(it), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn onto_rejects_growing_the_target() {
        let a = Layout::contiguous(&[3]);
        let b = Layout::contiguous(&[2, 3]);
        let err = BroadcastIterator::onto(&a, &b).unwrap_err();
        assert!(matches!(err, DatasetError::ShapeMismatch { .. }));
    }

    #[test]
    fn incompatible_shapes_fail() {
        let a = Layout::contiguous(&[2, 3]);
        let b = Layout::contiguous(&[2]);
        assert!(BroadcastIterator::new(&a, &b).is_err());
    }
}
