//! Extrema with memoization, uniqueness and sorting.
//!
//! Max/min values and positions are cached per `ignore_invalids` flag. The cache remembers the
//! buffer version it was computed at; any write through any alias of the buffer bumps the
//! version and the next query recomputes. Unique items are never cached.

use std::cmp::Ordering;

use crate::{
    dataset::Dataset,
    element::Element,
    error::{DatasetError, Result},
    iterator::{IndexIterator, PositionIterator},
    shape::Shape,
};

#[derive(Debug)]
struct Extrema<T> {
    max: T,
    min: T,
    max_pos: Option<Vec<Shape>>,
    min_pos: Option<Vec<Shape>>,
}

#[derive(Debug)]
pub(crate) struct StatsCache<T> {
    version: Option<u64>,
    /// Indexed by `ignore_invalids as usize`.
    extrema: [Option<Extrema<T>>; 2],
}

impl<T> Default for StatsCache<T> {
    fn default() -> Self {
        Self {
            version: None,
            extrema: [None, None],
        }
    }
}

impl<T> StatsCache<T> {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    fn sync(&mut self, version: u64) {
        if self.version != Some(version) {
            self.clear();
            self.version = Some(version);
        }
    }
}

#[derive(Clone, Copy)]
enum Extremum {
    Max,
    Min,
}

fn is_invalid<T: Element>(v: &T) -> bool {
    v.is_nan() || v.is_infinite()
}

impl<T: Element> Dataset<T> {
    fn check_ordered(&self, operation: &'static str) -> Result<()> {
        if !T::ORDERED {
            return Err(DatasetError::unsupported(operation, T::TYPE));
        }
        if self.size() == 0 {
            return Err(DatasetError::IndexOutOfRange {
                axis: 0,
                index: 0,
                len: 0,
            });
        }
        Ok(())
    }

    /// Max and min of `values`.
    ///
    /// Without `ignore_invalids` the first NaN is both the maximum and the minimum. With it, NaNs
    /// and infinities are skipped unless nothing else is left.
    fn compute_extrema(values: &[T], ignore_invalids: bool) -> Extrema<T> {
        let candidates: Vec<T> = if ignore_invalids {
            values.iter().copied().filter(|v| !is_invalid(v)).collect()
        } else {
            Vec::new()
        };
        let pool = if candidates.is_empty() { values } else { &candidates[..] };

        if !ignore_invalids {
            if let Some(&nan) = pool.iter().find(|v| v.is_nan()) {
                return Extrema {
                    max: nan,
                    min: nan,
                    max_pos: None,
                    min_pos: None,
                };
            }
        }
        let mut max = pool[0];
        let mut min = pool[0];
        for v in &pool[1..] {
            if v.total_cmp(&max) == Ordering::Greater {
                max = *v;
            }
            if v.total_cmp(&min) == Ordering::Less {
                min = *v;
            }
        }
        Extrema {
            max,
            min,
            max_pos: None,
            min_pos: None,
        }
    }

    /// Run `f` on the cached extrema for `ignore_invalids`, computing them first when stale.
    fn with_extrema<R>(
        &self,
        ignore_invalids: bool,
        f: impl FnOnce(&mut Extrema<T>, &Self) -> Result<R>,
    ) -> Result<R> {
        let version = self.buffer.version();
        let mut cache = self.stats.lock();
        cache.sync(version);
        let extrema = cache.extrema[ignore_invalids as usize]
            .get_or_insert_with(|| Self::compute_extrema(&self.to_vec(), ignore_invalids));
        f(extrema, self)
    }

    pub fn max(&self, ignore_invalids: bool) -> Result<T> {
        self.check_ordered("max")?;
        self.with_extrema(ignore_invalids, |e, _| Ok(e.max))
    }

    pub fn min(&self, ignore_invalids: bool) -> Result<T> {
        self.check_ordered("min")?;
        self.with_extrema(ignore_invalids, |e, _| Ok(e.min))
    }

    /// Positions of every element equal to `value`, in iteration order.
    fn find_positions(&self, value: T) -> Vec<Shape> {
        let values = self.to_vec();
        let mut it = PositionIterator::new(self.shape());
        let mut out = Vec::new();
        while it.advance() {
            if values[it.index()].total_cmp(&value) == Ordering::Equal {
                out.push(Shape::from_slice(it.position().unwrap_or(&[])));
            }
        }
        out
    }

    fn extremum_positions(&self, which: Extremum, ignore_invalids: bool) -> Result<Vec<Shape>> {
        self.with_extrema(ignore_invalids, |e, ds| {
            let (value, slot) = match which {
                Extremum::Max => (e.max, &mut e.max_pos),
                Extremum::Min => (e.min, &mut e.min_pos),
            };
            let positions = slot.get_or_insert_with(|| ds.find_positions(value));
            if positions.is_empty() {
                tracing::warn!(name = %ds.name(), "cached extremum has no positions");
                return Err(DatasetError::InternalConsistency(
                    "extremum positions are empty for a non-empty dataset",
                ));
            }
            Ok(positions.clone())
        })
    }

    /// Position of the first maximum in iteration order.
    pub fn max_pos(&self, ignore_invalids: bool) -> Result<Shape> {
        self.check_ordered("max_pos")?;
        let mut positions = self.extremum_positions(Extremum::Max, ignore_invalids)?;
        Ok(positions.swap_remove(0))
    }

    /// Position of the first minimum in iteration order.
    pub fn min_pos(&self, ignore_invalids: bool) -> Result<Shape> {
        self.check_ordered("min_pos")?;
        let mut positions = self.extremum_positions(Extremum::Min, ignore_invalids)?;
        Ok(positions.swap_remove(0))
    }

    /// All positions holding the maximum, in iteration order.
    pub fn max_positions(&self, ignore_invalids: bool) -> Result<Vec<Shape>> {
        self.check_ordered("max_positions")?;
        self.extremum_positions(Extremum::Max, ignore_invalids)
    }

    pub fn min_positions(&self, ignore_invalids: bool) -> Result<Vec<Shape>> {
        self.check_ordered("min_positions")?;
        self.extremum_positions(Extremum::Min, ignore_invalids)
    }

    /// Distinct values in ascending order as a new 1-D dataset. NaNs collapse into one value at
    /// the end.
    pub fn unique_items(&self) -> Dataset<T> {
        let mut values = self.to_vec();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
        Dataset::from_vec_1d(values)
    }

    /// Sort in place: the flattened data with `None`, or every 1-D lane along `axis`.
    pub fn sort(&mut self, axis: Option<usize>) -> Result<&mut Self> {
        if !T::SORTABLE {
            return Err(DatasetError::unsupported("sort", T::TYPE));
        }
        let Some(axis) = axis else {
            let indices = self.indices();
            let mut values = self.gather(&indices)?;
            values.sort_by(|a, b| a.total_cmp(b));
            self.scatter(&indices, &values)?;
            return Ok(self);
        };
        if axis >= self.rank() {
            return Err(DatasetError::IndexOutOfRange {
                axis: 0,
                index: axis as i64,
                len: self.rank(),
            });
        }

        let len = self.shape()[axis];
        let mut lanes = Shape::from_slice(self.shape());
        lanes[axis] = 1;
        let strides = self.layout.effective_strides();
        let mut indices = Vec::with_capacity(self.size());
        let mut it = PositionIterator::new(&lanes);
        while it.advance() {
            let mut pos = Shape::from_slice(it.position().unwrap_or(&[]));
            for k in 0..len {
                pos[axis] = k;
                indices.push(self.layout.index_unchecked(&strides, &pos));
            }
        }
        let mut values = self.gather(&indices)?;
        if len > 0 {
            for lane in values.chunks_mut(len) {
                lane.sort_by(|a, b| a.total_cmp(b));
            }
        }
        self.scatter(&indices, &values)?;
        Ok(self)
    }

    pub fn contains_nans(&self) -> bool {
        self.to_vec().iter().any(|v| v.is_nan())
    }

    pub fn contains_infs(&self) -> bool {
        self.to_vec().iter().any(|v| v.is_infinite())
    }

    pub fn contains_invalid_numbers(&self) -> bool {
        self.to_vec().iter().any(is_invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn unique_items_are_sorted_and_distinct() {
        let ds = Dataset::from_vec_1d(vec![5i32, 3, 5, 1, 3]);
        let unique = ds.unique_items();
        assert_eq!(unique.shape(), &[3]);
        assert_eq!(unique.to_vec(), vec![1, 3, 5]);
        assert_eq!(ds.unique_items(), unique);
    }

    #[test]
    fn unique_items_group_nans_at_the_end() {
        let ds = Dataset::from_vec_1d(vec![f64::NAN, 2.0, -0.0, f64::NAN, 0.0, -1.0]);
        let unique = ds.unique_items().to_vec();
        assert_eq!(unique.len(), 4);
        assert_eq!(&unique[..3], &[-1.0, 0.0, 2.0]);
        assert!(unique[3].is_nan());
    }

    #[test]
    fn unique_items_is_recomputed_after_mutation() {
        let mut ds = Dataset::from_vec_1d(vec![2u8, 2, 1]);
        assert_eq!(ds.unique_items().to_vec(), vec![1, 2]);
        ds.set_flat(0, 7).unwrap();
        assert_eq!(ds.unique_items().to_vec(), vec![1, 2, 7]);
    }

    #[test]
    fn max_and_min_positions_pick_first_occurrence() {
        let ds = Dataset::from_vec(vec![3i32, 9, 1, 9, 1, 4], &[2, 3]).unwrap();
        assert_eq!(ds.max(false).unwrap(), 9);
        assert_eq!(ds.min(false).unwrap(), 1);
        assert_eq!(ds.max_pos(false).unwrap().as_slice(), &[0, 1]);
        assert_eq!(ds.min_pos(false).unwrap().as_slice(), &[0, 2]);
        assert_eq!(ds.max_positions(false).unwrap().len(), 2);
    }

    #[test]
    fn cached_extrema_are_invalidated_through_views() {
        let ds = Dataset::from_vec_1d(vec![1.0f32, 5.0, 2.0]);
        assert_eq!(ds.max(false).unwrap(), 5.0);
        assert_eq!(ds.max_pos(false).unwrap().as_slice(), &[1]);
        let mut view = ds.get_view();
        view.set_flat(2, 8.0).unwrap();
        assert_eq!(ds.max(false).unwrap(), 8.0);
        assert_eq!(ds.max_pos(false).unwrap().as_slice(), &[2]);
    }

    #[test]
    fn nan_handling_depends_on_ignore_flag() {
        let ds = Dataset::from_vec_1d(vec![1.0f64, f64::NAN, f64::INFINITY, -2.0]);
        assert!(ds.max(false).unwrap().is_nan());
        assert!(ds.min(false).unwrap().is_nan());
        assert_eq!(ds.max_pos(false).unwrap().as_slice(), &[1]);
        assert_eq!(ds.max(true).unwrap(), 1.0);
        assert_eq!(ds.min(true).unwrap(), -2.0);
        assert_eq!(ds.min_pos(true).unwrap().as_slice(), &[3]);
        assert!(ds.contains_nans());
        assert!(ds.contains_infs());
        assert!(ds.contains_invalid_numbers());
    }

    #[test]
    fn integer_kinds_have_no_invalid_numbers() {
        let ds = Dataset::from_vec_1d(vec![i64::MIN, 0, i64::MAX]);
        assert!(!ds.contains_nans());
        assert!(!ds.contains_invalid_numbers());
    }

    #[test]
    fn empty_dataset_has_no_extrema() {
        let ds = Dataset::<u32>::zeros(&[0]).unwrap();
        assert!(matches!(ds.max(false).unwrap_err(), DatasetError::IndexOutOfRange { .. }));
    }

    #[test]
    fn complex_extrema_and_sort_are_unsupported() {
        let mut ds = Dataset::from_vec_1d(vec![Complex64::new(1.0, 2.0)]);
        assert!(matches!(ds.max(false).unwrap_err(), DatasetError::UnsupportedOperation { .. }));
        assert!(matches!(ds.sort(None).unwrap_err(), DatasetError::UnsupportedOperation { .. }));
    }

    #[test]
    fn boolean_sort_is_unsupported_but_extrema_work() {
        let mut ds = Dataset::from_vec_1d(vec![false, true, false]);
        let err = ds.sort(None).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::UnsupportedOperation { operation: "sort", .. }
        ));
        assert!(ds.max(false).unwrap());
        assert_eq!(ds.min_pos(false).unwrap().as_slice(), &[0]);
    }

    #[test]
    fn sort_flat_and_along_axis() {
        let mut ds = Dataset::from_vec(vec![3i32, 1, 2, 9, 7, 8], &[2, 3]).unwrap();
        ds.sort(Some(1)).unwrap();
        assert_eq!(ds.to_vec(), vec![1, 2, 3, 7, 8, 9]);
        ds.sort(Some(0)).unwrap();
        assert_eq!(ds.to_vec(), vec![1, 2, 3, 7, 8, 9]);

        let mut cols = Dataset::from_vec(vec![5i32, 0, 1, 4], &[2, 2]).unwrap();
        cols.sort(Some(0)).unwrap();
        assert_eq!(cols.to_vec(), vec![1, 0, 5, 4]);

        let mut flat = Dataset::from_vec(vec![4.0f32, f32::NAN, -1.0, 2.0], &[2, 2]).unwrap();
        flat.sort(None).unwrap();
        let v = flat.to_vec();
        assert_eq!(&v[..3], &[-1.0, 2.0, 4.0]);
        assert!(v[3].is_nan());
        assert!(flat.sort(Some(2)).is_err());
    }

    #[test]
    fn sort_through_strided_view() {
        let ds = Dataset::from_vec_1d(vec![9i16, 0, 3, 0, 1, 0]);
        let mut view = ds.get_slice_view(&[crate::slice::Slice::stepped(0, 6, 2)]).unwrap();
        view.sort(None).unwrap();
        assert_eq!(ds.to_vec(), vec![1, 0, 3, 0, 9, 0]);
    }

    /// Prime the cache with `max`/`max_pos`, mutate, and expect fresh answers.
    fn assert_fresh_after(
        values: Vec<f64>,
        mutate: impl FnOnce(&mut Dataset<f64>),
        max: f64,
        max_pos: &[usize],
    ) {
        let mut ds = Dataset::from_vec_1d(values);
        ds.max(false).unwrap();
        ds.max_pos(false).unwrap();
        ds.min_positions(true).unwrap();
        mutate(&mut ds);
        assert_eq!(ds.max(false).unwrap(), max);
        assert_eq!(ds.max_pos(false).unwrap().as_slice(), max_pos);
    }

    #[test]
    fn extrema_are_fresh_after_every_mutation() {
        use crate::{dataset::Source, slice::Slice};

        assert_fresh_after(vec![1.0, 5.0, 2.0], |ds| ds.fill(9.0), 9.0, &[0]);
        assert_fresh_after(vec![1.0, 2.0, 5.0], |ds| ds.resize(&[2]).unwrap(), 2.0, &[1]);
        assert_fresh_after(
            vec![1.0, 5.0, 2.0],
            |ds| ds.replace_buffer(vec![-3.0, -1.0], &[2]).unwrap(),
            -1.0,
            &[1],
        );
        assert_fresh_after(
            vec![1.0, 2.0, 5.0],
            |ds| {
                let mask = Dataset::from_vec_1d(vec![false, false, true]);
                ds.set_by_boolean(Source::Value(-1.0), &mask).unwrap();
            },
            2.0,
            &[1],
        );
        assert_fresh_after(
            vec![1.0, 2.0, 5.0],
            |ds| ds.set_slice(Source::Value(10.0), &[Slice::range(0, 1)]).unwrap(),
            10.0,
            &[0],
        );
        assert_fresh_after(
            vec![1.0, 5.0, 2.0],
            |ds| {
                let shift = Dataset::from_vec_1d(vec![0.0, 0.0, 4.0]);
                ds.iadd(Source::Dataset(&shift)).unwrap();
            },
            6.0,
            &[2],
        );
        assert_fresh_after(
            vec![5.0, 1.0, 2.0],
            |ds| {
                ds.sort(None).unwrap();
            },
            5.0,
            &[2],
        );
    }

    #[test]
    fn min_positions_are_fresh_after_resize_padding() {
        let mut ds = Dataset::from_vec_1d(vec![3i32, 1, 2]);
        assert_eq!(ds.min_positions(false).unwrap().len(), 1);
        ds.resize(&[5]).unwrap();
        assert_eq!(ds.min(false).unwrap(), 0);
        let zeros = ds.min_positions(false).unwrap();
        assert_eq!(zeros.len(), 2);
        assert_eq!(zeros[0].as_slice(), &[3]);
    }
}
