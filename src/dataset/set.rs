use crate::{
    dataset::{Dataset, ReadableDataset, generic},
    element::Element,
    error::{DatasetError, Result},
    iterator::{
        AxisIndex, BooleanIterator, BroadcastIterator, IndexArray, IndexIterator, IntegerIterator,
        IntegersIterator, SliceIterator, collect_indices,
    },
    layout::Layout,
    scalar::Scalar,
    shape,
    slice::Slice,
};

/// Right-hand side of an assignment.
#[derive(Clone, Copy)]
pub enum Source<'a, T> {
    /// A value of any kind, converted to the target kind.
    Scalar(Scalar),
    /// A value already of the target kind.
    Value(T),
    /// A dataset of any kind.
    Dataset(&'a dyn ReadableDataset),
}

impl<T: Element> Source<'_, T> {
    /// Exactly `count` values for a selection; datasets must hold exactly `count` elements.
    fn exact(&self, count: usize) -> Result<Vec<T>> {
        match *self {
            Source::Scalar(s) => Ok(vec![T::from_scalar(s); count]),
            Source::Value(v) => Ok(vec![v; count]),
            Source::Dataset(src) => {
                if src.size() != count {
                    return Err(DatasetError::count_mismatch(count, src.size()));
                }
                generic::read_values(src)
            }
        }
    }

    /// Values filling a region of `target` shape: datasets broadcast onto the region or match it
    /// after squeezing length-1 axes.
    fn shaped(&self, target: &[usize]) -> Result<Vec<T>> {
        let count = shape::num_elements(target)?;
        let src = match *self {
            Source::Scalar(s) => return Ok(vec![T::from_scalar(s); count]),
            Source::Value(v) => return Ok(vec![v; count]),
            Source::Dataset(src) => src,
        };
        if !shape::are_shapes_compatible(target, src.shape()) {
            return Err(DatasetError::shape_mismatch(target, src.shape()));
        }
        let values = generic::read_values::<T>(src)?;
        if values.len() == count {
            return Ok(values);
        }
        let mut it =
            BroadcastIterator::onto(&Layout::contiguous(target), &Layout::contiguous(src.shape()))?;
        let mut out = Vec::with_capacity(count);
        while it.advance() {
            out.push(values[it.other_index()]);
        }
        Ok(out)
    }
}

impl<T: Element> Dataset<T> {
    /// Assign to the positions where `mask` is true, in iteration order.
    ///
    /// The mask broadcasts onto this dataset. A dataset source must hold exactly as many elements
    /// as the mask selects.
    pub fn set_by_boolean(&mut self, source: Source<'_, T>, mask: &Dataset<bool>) -> Result<()> {
        let mut it = BooleanIterator::new(&self.layout, mask.shape(), mask.to_vec())?;
        let values = source.exact(it.selected())?;
        let indices = collect_indices(&mut it)?;
        self.scatter(&indices, &values)
    }

    /// Assign to the flat (row-major) positions listed by `index`.
    pub fn set_by_1d_index(
        &mut self,
        source: Source<'_, T>,
        index: &dyn ReadableDataset,
    ) -> Result<()> {
        let indices = IndexArray::from_readable(index)?;
        let mut it = IntegerIterator::new(&self.layout, indices);
        let targets = collect_indices(&mut it)?;
        let values = source.exact(targets.len())?;
        self.scatter(&targets, &values)
    }

    /// Assign to the positions picked by one selector per leading axis.
    pub fn set_by_indexes(&mut self, source: Source<'_, T>, selectors: &[AxisIndex]) -> Result<()> {
        let mut it = IntegersIterator::new(&self.layout, selectors)?;
        let targets = collect_indices(&mut it)?;
        let values = source.exact(targets.len())?;
        self.scatter(&targets, &values)
    }

    /// Assign into a `start:stop:step` region.
    pub fn set_slice(&mut self, source: Source<'_, T>, slices: &[Slice]) -> Result<()> {
        let it = self.slice_iterator(slices)?;
        self.set_slice_from(source, it)
    }

    /// Assign into the region walked by `it`, which must be built over this dataset's layout.
    pub fn set_slice_from(&mut self, source: Source<'_, T>, mut it: SliceIterator) -> Result<()> {
        self.check_iterator_source(&it)?;
        let values = source.shaped(it.shape())?;
        let targets = collect_indices(&mut it)?;
        self.scatter(&targets, &values)
    }

    /// Region spanning every axis flagged in `axes` and pinned at `pos` on the others.
    fn axes_iterator(&self, pos: &[usize], axes: &[bool]) -> Result<SliceIterator> {
        if pos.len() != self.rank() || axes.len() != self.rank() {
            return Err(DatasetError::shape_mismatch(self.shape(), &[pos.len(), axes.len()]));
        }
        let mut slices = Vec::with_capacity(self.rank());
        for (axis, (&p, &whole)) in pos.iter().zip(axes).enumerate() {
            if whole {
                slices.push(Slice::full());
            } else {
                shape::resolve_index(p as i64, self.shape()[axis], axis)?;
                slices.push(Slice::index(p as isize));
            }
        }
        self.slice_iterator(&slices)
    }

    /// Copy the region spanning `axes` at `pos` into the leading corner of `dest`.
    ///
    /// `dest` must have the rank of the squeezed region and be at least as large on every axis.
    pub fn copy_items_from_axes(
        &self,
        pos: &[usize],
        axes: &[bool],
        dest: &mut Dataset<T>,
    ) -> Result<()> {
        let mut it = self.axes_iterator(pos, axes)?;
        let squeezed = shape::squeeze(it.shape(), false);
        let too_small = dest.shape().iter().zip(&squeezed).any(|(&d, &s)| d < s);
        if dest.rank() != squeezed.len() || too_small {
            return Err(DatasetError::shape_mismatch(&squeezed, dest.shape()));
        }
        let values = self.gather(&collect_indices(&mut it)?)?;
        let region: Vec<Slice> = squeezed.iter().map(|&n| Slice::range(0, n as isize)).collect();
        let mut dest_it = dest.slice_iterator(&region)?;
        let targets = collect_indices(&mut dest_it)?;
        dest.scatter(&targets, &values)
    }

    /// Write `src` (row-major) into the region spanning `axes` at `pos`.
    pub fn set_items_on_axes(&mut self, pos: &[usize], axes: &[bool], src: &[T]) -> Result<()> {
        let mut it = self.axes_iterator(pos, axes)?;
        let targets = collect_indices(&mut it)?;
        if src.len() < targets.len() {
            return Err(DatasetError::count_mismatch(targets.len(), src.len()));
        }
        self.scatter(&targets, &src[..targets.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(shape: &[usize]) -> Dataset<i32> {
        let n: usize = shape.iter().product();
        Dataset::from_vec((0..n as i32).collect(), shape).unwrap()
    }

    #[test]
    fn boolean_set_with_scalar_and_dataset() {
        let mut ds = counting(&[5]);
        let mask = Dataset::from_vec_1d(vec![true, false, true, false, true]);
        ds.set_by_boolean(Source::Scalar(Scalar::F64(9.7)), &mask).unwrap();
        assert_eq!(ds.to_vec(), vec![9, 1, 9, 3, 9]);

        let src = Dataset::from_vec_1d(vec![-1i64, -2, -3]);
        ds.set_by_boolean(Source::Dataset(&src), &mask).unwrap();
        assert_eq!(ds.to_vec(), vec![-1, 1, -2, 3, -3]);
    }

    #[test]
    fn boolean_set_count_mismatch_leaves_target_untouched() {
        let mut ds = counting(&[10]);
        let mut mask = vec![false; 10];
        mask[1] = true;
        mask[4] = true;
        mask[8] = true;
        let mask = Dataset::from_vec_1d(mask);
        let src = Dataset::from_vec_1d(vec![1i32, 2]);
        let err = ds.set_by_boolean(Source::Dataset(&src), &mask).unwrap_err();
        assert_eq!(err, DatasetError::ShapeMismatch { left: vec![3], right: vec![2] });
        assert_eq!(ds.to_vec(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn flat_index_set_wraps_negatives() {
        let mut ds = counting(&[2, 3]);
        let index = Dataset::from_vec_1d(vec![0i64, -1]);
        ds.set_by_1d_index(Source::Value(50), &index).unwrap();
        assert_eq!(ds.to_vec(), vec![50, 1, 2, 3, 4, 50]);
    }

    #[test]
    fn flat_index_out_of_range_writes_nothing() {
        let mut ds = counting(&[4]);
        let index = Dataset::from_vec_1d(vec![0u8, 4]);
        let err = ds.set_by_1d_index(Source::Value(7), &index).unwrap_err();
        assert!(matches!(err, DatasetError::IndexOutOfRange { index: 4, .. }));
        assert_eq!(ds.get_flat(0).unwrap(), 0);
    }

    #[test]
    fn float_index_is_unsupported() {
        let mut ds = counting(&[4]);
        let index = Dataset::from_vec_1d(vec![0.0f32]);
        let err = ds.set_by_1d_index(Source::Value(7), &index).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedOperation { .. }));
    }

    #[test]
    fn per_axis_index_set() {
        let mut ds = counting(&[3, 3]);
        let rows = AxisIndex::Indices(IndexArray::from_vec(vec![0, 2]));
        let cols = AxisIndex::Indices(IndexArray::from_vec(vec![2, 0]));
        let src = Dataset::from_vec_1d(vec![100i32, 200]);
        ds.set_by_indexes(Source::Dataset(&src), &[rows, cols]).unwrap();
        assert_eq!(ds.get2(0, 2).unwrap(), 100);
        assert_eq!(ds.get2(2, 0).unwrap(), 200);
    }

    #[test]
    fn slice_set_broadcasts_row() {
        let mut ds = Dataset::<f64>::zeros(&[3, 4]).unwrap();
        let row = Dataset::from_vec_1d(vec![1.0f64, 2.0]);
        ds.set_slice(Source::Dataset(&row), &[Slice::range(0, 2), Slice::stepped(0, 4, 2)])
            .unwrap();
        assert_eq!(
            ds.to_vec(),
            vec![1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn slice_set_accepts_squeezed_shape() {
        let mut ds = counting(&[2, 3]);
        let col = Dataset::from_vec(vec![7i32, 8], &[2]).unwrap();
        ds.set_slice(Source::Dataset(&col), &[Slice::full(), Slice::index(1)]).unwrap();
        assert_eq!(ds.to_vec(), vec![0, 7, 2, 3, 8, 5]);
    }

    #[test]
    fn slice_set_rejects_incompatible_source() {
        let mut ds = counting(&[2, 3]);
        let src = Dataset::from_vec_1d(vec![1i32, 2, 3, 4]);
        let err = ds.set_slice(Source::Dataset(&src), &[]).unwrap_err();
        assert!(matches!(err, DatasetError::ShapeMismatch { .. }));
    }

    #[test]
    fn slice_set_from_other_kind_converts() {
        let mut ds = Dataset::<u8>::zeros(&[3]).unwrap();
        let src = Dataset::from_vec_1d(vec![true, false, true]);
        ds.set_slice(Source::Dataset(&src), &[]).unwrap();
        assert_eq!(ds.to_vec(), vec![1, 0, 1]);
    }

    #[test]
    fn slice_set_from_own_view() {
        let mut ds = counting(&[4]);
        let view = ds.get_slice_view(&[Slice::new(None, None, -1)]).unwrap();
        ds.set_slice(Source::Dataset(&view), &[]).unwrap();
        assert_eq!(ds.to_vec(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn slice_set_from_foreign_iterator_writes_nothing() {
        let base = counting(&[8]);
        let mut strided = base.get_slice_view(&[Slice::stepped(0, 8, 2)]).unwrap();
        let plain = counting(&[4]);
        let it = plain.slice_iterator(&[Slice::range(0, 2)]).unwrap();
        let err = strided.set_slice_from(Source::Value(-1), it).unwrap_err();
        assert!(matches!(err, DatasetError::ShapeMismatch { .. }));
        assert_eq!(base.to_vec(), (0..8).collect::<Vec<_>>());

        let it = strided.slice_iterator(&[Slice::range(0, 2)]).unwrap();
        strided.set_slice_from(Source::Value(-1), it).unwrap();
        assert_eq!(base.to_vec(), vec![-1, 1, -1, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn copy_and_set_items_on_axes() {
        let ds = counting(&[2, 3, 4]);
        let mut dest = Dataset::<i32>::zeros(&[3]).unwrap();
        ds.copy_items_from_axes(&[1, 0, 2], &[false, true, false], &mut dest).unwrap();
        assert_eq!(dest.to_vec(), vec![14, 18, 22]);

        let mut small = Dataset::<i32>::zeros(&[2]).unwrap();
        assert!(ds.copy_items_from_axes(&[1, 0, 2], &[false, true, false], &mut small).is_err());

        let mut target = counting(&[2, 3]);
        target.set_items_on_axes(&[1, 0], &[false, true], &[-1, -2, -3]).unwrap();
        assert_eq!(target.to_vec(), vec![0, 1, 2, -1, -2, -3]);
        assert!(target.set_items_on_axes(&[0, 0], &[false, true], &[1]).is_err());
    }
}
