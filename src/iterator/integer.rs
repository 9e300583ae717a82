use crate::{
    dataset::ReadableDataset,
    error::{DatasetError, Result},
    iterator::{IndexIterator, PositionIterator},
    layout::Layout,
    shape::{self, Shape, Strides},
};

/// Integer index values with their shape, read out of an index dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexArray {
    pub shape: Shape,
    pub values: Vec<i64>,
}

impl IndexArray {
    pub fn new(shape: &[usize], values: Vec<i64>) -> Result<Self> {
        let n = shape::num_elements(shape)?;
        if n != values.len() {
            return Err(DatasetError::count_mismatch(n, values.len()));
        }
        Ok(Self {
            shape: Shape::from_slice(shape),
            values,
        })
    }

    /// A 1-D index array.
    pub fn from_vec(values: Vec<i64>) -> Self {
        Self {
            shape: smallvec::smallvec![values.len()],
            values,
        }
    }

    /// Read an integer-valued dataset of any integer kind.
    ///
    /// # Errors
    /// Returns [`DatasetError::UnsupportedOperation`] for non-integer element kinds.
    pub fn from_readable(dataset: &dyn ReadableDataset) -> Result<Self> {
        let data_type = dataset.data_type();
        if !data_type.is_integer() {
            return Err(DatasetError::unsupported("integer indexing", data_type));
        }
        let mut values = Vec::with_capacity(dataset.size());
        let mut it = PositionIterator::new(dataset.shape());
        while it.advance() {
            let pos = it.position().unwrap_or(&[]);
            let v = dataset.get_scalar(pos)?.as_integer().unwrap_or_default();
            values.push(i64::try_from(v).unwrap_or(i64::MAX));
        }
        Ok(Self {
            shape: Shape::from_slice(dataset.shape()),
            values,
        })
    }
}

/// Flat (row-major) positions of the target listed by an index array.
///
/// Negative values count from the end. An out-of-range value stops the traversal and is
/// reported by [`IndexIterator::take_error`] or [`IntegerIterator::try_advance`].
#[derive(Debug, Clone)]
pub struct IntegerIterator {
    target: Layout,
    size: usize,
    indices: IndexArray,
    next: usize,
    index: usize,
    error: Option<DatasetError>,
}

impl IntegerIterator {
    pub fn new(target: &Layout, indices: IndexArray) -> Self {
        Self {
            size: target.size(),
            target: target.clone(),
            indices,
            next: 0,
            index: 0,
            error: None,
        }
    }

    pub fn try_advance(&mut self) -> Result<bool> {
        if self.error.is_some() || self.next >= self.indices.values.len() {
            return Ok(false);
        }
        let raw = self.indices.values[self.next];
        let flat = shape::resolve_index(raw, self.size, 0)?;
        self.index = self.target.index_of_flat(flat)?;
        self.next += 1;
        Ok(true)
    }
}

impl IndexIterator for IntegerIterator {
    fn advance(&mut self) -> bool {
        match self.try_advance() {
            Ok(more) => more,
            Err(err) => {
                self.error = Some(err);
                false
            }
        }
    }

    fn index(&self) -> usize {
        self.index
    }

    fn shape(&self) -> &[usize] {
        &self.indices.shape
    }

    fn take_error(&mut self) -> Option<DatasetError> {
        self.error.take()
    }
}

/// Selector for one axis of an [`IntegersIterator`].
#[derive(Debug, Clone)]
pub enum AxisIndex {
    /// Pick these coordinates along the axis.
    Indices(IndexArray),
    /// Take the whole axis.
    All,
}

/// Positions built from one selector per leading axis.
///
/// The index arrays are broadcast together and form the outer part of the selection; the
/// extents of `All` axes and of unlisted trailing axes form the inner part.
#[derive(Debug, Clone)]
pub struct IntegersIterator {
    target: Layout,
    strides: Strides,
    selectors: Vec<AxisIndex>,
    index_shape: Shape,
    /// Axes taken whole, in order.
    full_axes: Vec<usize>,
    full_shape: Shape,
    shape: Shape,
    total: usize,
    next: usize,
    pos: Shape,
    index: usize,
    error: Option<DatasetError>,
}

impl IntegersIterator {
    /// # Errors
    /// - [`DatasetError::ShapeMismatch`] when there are more selectors than axes or the index
    ///   arrays do not broadcast together.
    pub fn new(target: &Layout, selectors: &[AxisIndex]) -> Result<Self> {
        let rank = target.rank();
        if selectors.len() > rank {
            return Err(DatasetError::shape_mismatch(&target.shape, &[selectors.len()]));
        }
        let mut selectors = selectors.to_vec();
        selectors.resize(rank, AxisIndex::All);

        let mut index_shape = Shape::new();
        let mut full_axes = Vec::new();
        let mut full_shape = Shape::new();
        for (axis, selector) in selectors.iter().enumerate() {
            match selector {
                AxisIndex::Indices(ia) => {
                    index_shape = shape::broadcast_shape(&index_shape, &ia.shape)?
                }
                AxisIndex::All => {
                    full_axes.push(axis);
                    full_shape.push(target.shape[axis]);
                }
            }
        }
        let shape: Shape = index_shape.iter().chain(full_shape.iter()).copied().collect();
        let total = shape::num_elements(&shape)?;
        Ok(Self {
            strides: target.effective_strides(),
            target: target.clone(),
            selectors,
            index_shape,
            full_axes,
            full_shape,
            shape,
            total,
            next: 0,
            pos: smallvec::smallvec![0; rank],
            index: 0,
            error: None,
        })
    }

    pub fn try_advance(&mut self) -> Result<bool> {
        if self.error.is_some() || self.next >= self.total {
            return Ok(false);
        }
        let inner_len: usize = self.full_shape.iter().product();
        let outer = self.next / inner_len.max(1);
        let inner = self.next % inner_len.max(1);
        let outer_pos = shape::unravel(&self.index_shape, outer);
        let inner_pos = shape::unravel(&self.full_shape, inner);

        for (axis, selector) in self.selectors.iter().enumerate() {
            if let AxisIndex::Indices(ia) = selector {
                let raw = ia.values[broadcast_flat(&ia.shape, &outer_pos)];
                self.pos[axis] = shape::resolve_index(raw, self.target.shape[axis], axis)?;
            }
        }
        for (i, &axis) in self.full_axes.iter().enumerate() {
            self.pos[axis] = inner_pos[i];
        }
        self.index = self.target.index_unchecked(&self.strides, &self.pos);
        self.next += 1;
        Ok(true)
    }
}

/// Row-major flat index into an array of `shape` broadcast onto `pos` (trailing alignment).
fn broadcast_flat(shape: &[usize], pos: &[usize]) -> usize {
    let lead = pos.len() - shape.len();
    let mut flat = 0;
    for (i, &dim) in shape.iter().enumerate() {
        let p = if dim == 1 { 0 } else { pos[lead + i] };
        flat = flat * dim + p;
    }
    flat
}

impl IndexIterator for IntegersIterator {
    fn advance(&mut self) -> bool {
        match self.try_advance() {
            Ok(more) => more,
            Err(err) => {
                self.error = Some(err);
                false
            }
        }
    }

    fn index(&self) -> usize {
        self.index
    }

    /// Position inside the target layout.
    fn position(&self) -> Option<&[usize]> {
        Some(&self.pos)
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn take_error(&mut self) -> Option<DatasetError> {
        self.error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::collect_indices;

    #[test]
    fn integer_iterator_maps_flat_positions() {
        let layout = Layout::contiguous(&[2, 3]);
        let mut it = IntegerIterator::new(&layout, IndexArray::from_vec(vec![5, 0, -1]));
        assert_eq!(collect_indices(&mut it).unwrap(), vec![5, 0, 5]);
    }

    #[test]
    fn integer_iterator_reports_out_of_range_at_iteration() {
        let layout = Layout::contiguous(&[4]);
        let mut it = IntegerIterator::new(&layout, IndexArray::from_vec(vec![1, 4]));
        assert!(it.advance());
        assert!(!it.advance());
        let err = it.take_error().unwrap();
        assert!(matches!(err, DatasetError::IndexOutOfRange { index: 4, len: 4, .. }));
    }

    #[test]
    fn integers_iterator_pairs_axis_indices() {
        let layout = Layout::contiguous(&[3, 3]);
        let rows = AxisIndex::Indices(IndexArray::from_vec(vec![0, 2]));
        let cols = AxisIndex::Indices(IndexArray::from_vec(vec![1, 2]));
        let mut it = IntegersIterator::new(&layout, &[rows, cols]).unwrap();
        assert_eq!(it.shape(), &[2]);
        assert_eq!(collect_indices(&mut it).unwrap(), vec![1, 8]);
    }

    #[test]
    fn integers_iterator_appends_whole_axes() {
        let layout = Layout::contiguous(&[3, 2]);
        let rows = AxisIndex::Indices(IndexArray::from_vec(vec![2, 0]));
        let mut it = IntegersIterator::new(&layout, &[rows]).unwrap();
        assert_eq!(it.shape(), &[2, 2]);
        assert_eq!(collect_indices(&mut it).unwrap(), vec![4, 5, 0, 1]);
    }

    #[test]
    fn integers_iterator_broadcasts_index_arrays() {
        let layout = Layout::contiguous(&[2, 3]);
        let rows = AxisIndex::Indices(IndexArray::new(&[2, 1], vec![0, 1]).unwrap());
        let cols = AxisIndex::Indices(IndexArray::from_vec(vec![0, 2]));
        let mut it = IntegersIterator::new(&layout, &[rows, cols]).unwrap();
        assert_eq!(it.shape(), &[2, 2]);
        assert_eq!(collect_indices(&mut it).unwrap(), vec![0, 2, 3, 5]);
    }

    #[test]
    fn integers_iterator_rejects_out_of_range_axis_value() {
        let layout = Layout::contiguous(&[2, 2]);
        let rows = AxisIndex::Indices(IndexArray::from_vec(vec![2]));
        let mut it = IntegersIterator::new(&layout, &[rows]).unwrap();
        let err = collect_indices(&mut it).unwrap_err();
        assert!(matches!(err, DatasetError::IndexOutOfRange { axis: 0, index: 2, len: 2 }));
    }
}
