//! Typed N-dimensional datasets.
//!
//! A [`Dataset<T>`] pairs a shared [`Buffer<T>`] with a [`Layout`] (shape, optional strides and
//! an offset). Datasets either own their buffer or are *views* that alias the buffer of another
//! dataset:
//! - [`Dataset::get_view`] and [`Dataset::get_slice_view`] alias, no element is copied.
//! - [`Dataset::get_slice`], `clone` and the cast constructors copy the visible elements into a new
//!   contiguous buffer.
//!
//! Writes through any alias are visible through every other alias of the same buffer. Aliases
//! share no lock beyond the buffer's own `RwLock`; interleaving writers from several threads is
//! the caller's business.
//!
//! ## Element kinds
//! All algorithms are written once against [`Element`]. Kind-specific behaviour (no-op arithmetic
//! for `bool`, unsupported sort for `bool` and complex kinds, NaN ordering for floats) comes from
//! the trait's constants and kernels.
//!
//! ## Bulk operations
//! Every bulk write first snapshots its source, then resolves and bounds-checks all target
//! indices, and only then takes the write lock. A failing call leaves the destination untouched.

mod arith;
mod generic;
mod set;
mod stats;

pub use arith::Operand;
pub use generic::{AnyDataset, ReadableDataset, WritableDataset};
pub use set::Source;

use compact_str::{CompactString, format_compact};
use parking_lot::Mutex;

use crate::{
    buffer::Buffer,
    consts::{BLOCK_CLOSE, BLOCK_OPEN},
    dtype::DataType,
    element::Element,
    error::{DatasetError, Result},
    iterator::{ContiguousIterator, IndexIterator, SliceIterator, collect_indices},
    layout::Layout,
    scalar::Scalar,
    shape::{self, Shape},
    slice::Slice,
};

use stats::StatsCache;

#[derive(Debug)]
pub struct Dataset<T: Element> {
    name: CompactString,
    layout: Layout,
    buffer: Buffer<T>,
    view: bool,
    stats: Mutex<StatsCache<T>>,
}

impl<T: Element> Dataset<T> {
    fn from_parts(name: CompactString, layout: Layout, buffer: Buffer<T>, view: bool) -> Self {
        Self {
            name,
            layout,
            buffer,
            view,
            stats: Mutex::new(StatsCache::default()),
        }
    }

    /// A zero-filled dataset.
    ///
    /// # Errors
    /// - [`DatasetError::InvalidShape`] when the element count overflows.
    /// - [`DatasetError::Allocation`] when the buffer cannot be allocated.
    pub fn zeros(shape: &[usize]) -> Result<Self> {
        let len = shape::num_elements(shape)?;
        let buffer = Buffer::allocate(len).inspect_err(|_| {
            tracing::error!(?shape, data_type = %T::TYPE, "failed to allocate dataset");
        })?;
        tracing::debug!(?shape, data_type = %T::TYPE, "allocated dataset");
        Ok(Self::from_parts(CompactString::default(), Layout::contiguous(shape), buffer, false))
    }

    /// A zero-filled dataset from signed dimensions; negative dimensions are rejected.
    pub fn zeros_from_dims(dims: &[i64]) -> Result<Self> {
        Self::zeros(&shape::shape_from_dims(dims)?)
    }

    pub fn ones(shape: &[usize]) -> Result<Self> {
        let ds = Self::zeros(shape)?;
        ds.buffer.write().fill(T::one());
        Ok(ds)
    }

    /// Wrap `data` (row-major) with `shape`.
    ///
    /// # Errors
    /// Returns [`DatasetError::ShapeMismatch`] when `data.len()` differs from the shape's element
    /// count.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let len = shape::num_elements(shape)?;
        if len != data.len() {
            return Err(DatasetError::count_mismatch(len, data.len()));
        }
        Ok(Self::from_parts(
            CompactString::default(),
            Layout::contiguous(shape),
            Buffer::from_vec(data),
            false,
        ))
    }

    pub fn from_vec_1d(data: Vec<T>) -> Self {
        let layout = Layout::contiguous(&[data.len()]);
        Self::from_parts(CompactString::default(), layout, Buffer::from_vec(data), false)
    }

    pub fn from_ndarray<S, D>(array: &ndarray::ArrayBase<S, D>) -> Result<Self>
    where
        S: ndarray::Data<Elem = T>,
        D: ndarray::Dimension,
    {
        Self::from_vec(array.iter().copied().collect(), array.shape())
    }

    pub fn to_ndarray(&self) -> Result<ndarray::ArrayD<T>> {
        let data = self.to_vec();
        let len = data.len();
        ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&self.layout.shape), data)
            .map_err(|_| DatasetError::count_mismatch(self.size(), len))
    }

    /// Element-wise converted copy of a dataset of another kind.
    pub fn cast_from<U: Element>(other: &Dataset<U>) -> Self {
        let data = other.to_vec().into_iter().map(|v| T::from_scalar(v.to_scalar())).collect();
        Self::from_parts(
            other.name.clone(),
            Layout::contiguous(other.shape()),
            Buffer::from_vec(data),
            false,
        )
    }

    /// Element-wise converted copy of any readable dataset.
    pub fn cast_from_readable(other: &dyn ReadableDataset) -> Result<Self> {
        let data = generic::read_values::<T>(other)?;
        let mut ds = Self::from_vec(data, other.shape())?;
        ds.name = CompactString::from(other.name());
        Ok(ds)
    }

    pub fn cast<U: Element>(&self) -> Dataset<U> {
        Dataset::<U>::cast_from(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = CompactString::from(name);
    }

    pub fn data_type(&self) -> DataType {
        T::TYPE
    }

    pub fn shape(&self) -> &[usize] {
        &self.layout.shape
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn strides(&self) -> Option<&[isize]> {
        self.layout.strides.as_deref()
    }

    pub fn offset(&self) -> usize {
        self.layout.offset
    }

    /// The backing storage, shared with every alias.
    pub fn buffer(&self) -> &Buffer<T> {
        &self.buffer
    }

    /// Whether this dataset aliases the buffer of another dataset.
    pub fn is_view(&self) -> bool {
        self.view
    }

    /// Iterator over every element in row-major logical order.
    pub fn iterator(&self) -> Box<dyn IndexIterator + Send> {
        if self.layout.is_contiguous() {
            Box::new(ContiguousIterator::new(&self.layout.shape, self.layout.offset))
        } else {
            Box::new(SliceIterator::full(&self.layout))
        }
    }

    /// Iterator over a `start:stop:step` region of this dataset.
    pub fn slice_iterator(&self, slices: &[Slice]) -> Result<SliceIterator> {
        SliceIterator::new(&self.layout, slices)
    }

    /// Buffer indices of every element in row-major logical order.
    pub(crate) fn indices(&self) -> Vec<usize> {
        let offset = self.layout.offset;
        if self.layout.is_contiguous() {
            return (offset..offset + self.size()).collect();
        }
        let mut it = SliceIterator::full(&self.layout);
        let mut out = Vec::with_capacity(self.size());
        while it.advance() {
            out.push(it.index());
        }
        out
    }

    /// Copy out the visible elements in row-major logical order.
    pub fn to_vec(&self) -> Vec<T> {
        if self.layout.is_contiguous() {
            let offset = self.layout.offset;
            return self.buffer.read()[offset..offset + self.size()].to_vec();
        }
        let indices = self.indices();
        let data = self.buffer.read();
        indices.into_iter().map(|i| data[i]).collect()
    }

    /// Run `f` over the whole backing buffer, including elements outside this dataset's layout.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.buffer.read())
    }

    /// Swap in new storage and shape, e.g. after a reader or a remote producer grew the data.
    ///
    /// The dataset becomes buffer-owning and contiguous. Former aliases keep the old storage.
    pub fn replace_buffer(&mut self, data: Vec<T>, shape: &[usize]) -> Result<()> {
        let len = shape::num_elements(shape)?;
        if len != data.len() {
            return Err(DatasetError::count_mismatch(len, data.len()));
        }
        self.buffer = Buffer::from_vec(data);
        self.layout = Layout::contiguous(shape);
        self.view = false;
        self.stats.get_mut().clear();
        Ok(())
    }

    pub(crate) fn gather(&self, indices: &[usize]) -> Result<Vec<T>> {
        let data = self.buffer.read();
        indices
            .iter()
            .map(|&i| {
                data.get(i).copied().ok_or(DatasetError::IndexOutOfRange {
                    axis: 0,
                    index: i as i64,
                    len: data.len(),
                })
            })
            .collect()
    }

    /// Write `values` to `indices` pairwise. Every index is checked before the first write.
    pub(crate) fn scatter(&mut self, indices: &[usize], values: &[T]) -> Result<()> {
        if indices.len() != values.len() {
            return Err(DatasetError::count_mismatch(indices.len(), values.len()));
        }
        let mut data = self.buffer.write();
        let len = data.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(DatasetError::IndexOutOfRange {
                axis: 0,
                index: bad as i64,
                len,
            });
        }
        for (&i, &v) in indices.iter().zip(values) {
            data[i] = v;
        }
        Ok(())
    }

    pub fn get_flat(&self, flat: usize) -> Result<T> {
        let index = self.layout.index_of_flat(flat)?;
        Ok(self.buffer.read()[index])
    }

    pub fn set_flat(&mut self, flat: usize, value: T) -> Result<()> {
        let index = self.layout.index_of_flat(flat)?;
        self.buffer.write()[index] = value;
        Ok(())
    }

    fn check_rank2(&self) -> Result<()> {
        if self.rank() != 2 {
            return Err(DatasetError::shape_mismatch(self.shape(), &[0, 0]));
        }
        Ok(())
    }

    /// Element at `(i, j)` of a rank-2 dataset.
    pub fn get2(&self, i: usize, j: usize) -> Result<T> {
        self.check_rank2()?;
        self.get_at(&[i, j])
    }

    pub fn set2(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        self.check_rank2()?;
        self.set_at(&[i, j], value)
    }

    pub fn get_at(&self, pos: &[usize]) -> Result<T> {
        let index = self.layout.index_of(pos)?;
        Ok(self.buffer.read()[index])
    }

    pub fn set_at(&mut self, pos: &[usize], value: T) -> Result<()> {
        let index = self.layout.index_of(pos)?;
        self.buffer.write()[index] = value;
        Ok(())
    }

    /// Element at a raw buffer index, bypassing the layout.
    ///
    /// # Panics
    /// When `index` lies outside the buffer.
    pub fn get_abs(&self, index: usize) -> T {
        self.buffer.read()[index]
    }

    /// # Panics
    /// When `index` lies outside the buffer.
    pub fn set_abs(&mut self, index: usize, value: T) {
        self.buffer.write()[index] = value;
    }

    pub fn get_scalar(&self, pos: &[usize]) -> Result<Scalar> {
        Ok(self.get_at(pos)?.to_scalar())
    }

    /// Store `value` converted to this dataset's kind.
    pub fn set_scalar(&mut self, pos: &[usize], value: Scalar) -> Result<()> {
        self.set_at(pos, T::from_scalar(value))
    }

    pub fn get_string(&self, pos: &[usize]) -> Result<String> {
        Ok(self.get_scalar(pos)?.to_string())
    }

    /// Overwrite every visible element with `value` converted to this kind.
    pub fn fill(&mut self, value: impl Into<Scalar>) {
        let value = T::from_scalar(value.into());
        let indices = self.indices();
        let mut data = self.buffer.write();
        for i in indices {
            data[i] = value;
        }
    }

    /// A dataset aliasing the same buffer with the same layout.
    pub fn get_view(&self) -> Self {
        tracing::debug!(name = %self.name, shape = ?self.shape(), "created view");
        Self::from_parts(self.name.clone(), self.layout.clone(), self.buffer.clone(), true)
    }

    /// A strided view of a `start:stop:step` region; no element is copied.
    pub fn get_slice_view(&self, slices: &[Slice]) -> Result<Self> {
        let it = self.slice_iterator(slices)?;
        let strides = self.layout.effective_strides();
        let shape: Shape = it.shape().into();
        let view_strides: Vec<isize> = it
            .slices()
            .iter()
            .zip(strides.iter())
            .map(|(s, &stride)| s.step * stride)
            .collect();
        let offset = if shape.contains(&0) {
            self.layout.offset
        } else {
            let start: isize = it
                .slices()
                .iter()
                .zip(strides.iter())
                .map(|(s, &stride)| s.start * stride)
                .sum();
            (self.layout.offset as isize + start) as usize
        };
        let layout = Layout::strided(&shape, &view_strides, offset, self.buffer.len())?;
        tracing::debug!(name = %self.name, region = %it.describe(), "created slice view");
        Ok(Self::from_parts(self.slice_name(&it), layout, self.buffer.clone(), true))
    }

    fn slice_name(&self, it: &SliceIterator) -> CompactString {
        format_compact!("{}{}{}{}", self.name, BLOCK_OPEN, it.describe(), BLOCK_CLOSE)
    }

    /// Independent copy of a `start:stop:step` region, named `name[region]`.
    pub fn get_slice(&self, slices: &[Slice]) -> Result<Self> {
        let it = self.slice_iterator(slices)?;
        self.get_slice_from(it)
    }

    /// Independent copy of the region walked by `it`, which must be built over this dataset's
    /// layout.
    pub fn get_slice_from(&self, mut it: SliceIterator) -> Result<Self> {
        self.check_iterator_source(&it)?;
        let shape: Shape = it.shape().into();
        let name = self.slice_name(&it);
        let indices = collect_indices(&mut it)?;
        let mut ds = Self::from_vec(self.gather(&indices)?, &shape)?;
        ds.name = name;
        Ok(ds)
    }

    /// Reject iterators built over a layout other than this dataset's: their indices would land
    /// on unrelated buffer cells.
    pub(crate) fn check_iterator_source(&self, it: &SliceIterator) -> Result<()> {
        if !it.source().same_mapping(&self.layout) {
            tracing::debug!(
                name = %self.name,
                layout = ?self.layout,
                iterator = ?it.source(),
                "slice iterator built over another layout"
            );
            return Err(DatasetError::shape_mismatch(self.shape(), it.source_shape()));
        }
        Ok(())
    }

    /// Reallocate to `shape`, keeping as many elements (in prior iteration order) as fit.
    ///
    /// The dataset always ends up buffer-owning and contiguous.
    pub fn resize(&mut self, shape: &[usize]) -> Result<()> {
        let len = shape::num_elements(shape)?;
        let old = self.to_vec();
        let buffer = Buffer::<T>::allocate(len).inspect_err(|_| {
            tracing::error!(?shape, data_type = %T::TYPE, "failed to allocate resized dataset");
        })?;
        {
            let mut data = buffer.write();
            let n = old.len().min(len);
            data[..n].copy_from_slice(&old[..n]);
        }
        tracing::debug!(name = %self.name, from = ?self.shape(), to = ?shape, "resized dataset");
        self.buffer = buffer;
        self.layout = Layout::contiguous(shape);
        self.view = false;
        self.stats.get_mut().clear();
        Ok(())
    }

    /// Copy the elements picked by `it` into `result`, in `result`'s iteration order.
    ///
    /// Copying stops when either side runs out.
    pub fn fill_dataset(&self, result: &mut Dataset<T>, it: &mut dyn IndexIterator) -> Result<()> {
        let source = collect_indices(it)?;
        let values = self.gather(&source)?;
        let mut targets = result.indices();
        let n = targets.len().min(values.len());
        targets.truncate(n);
        result.scatter(&targets, &values[..n])
    }

    /// Little-endian encoding of the visible elements in iteration order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let values = self.to_vec();
        let mut out = Vec::with_capacity(values.len() * T::BYTE_WIDTH);
        for v in values {
            v.write_le(&mut out);
        }
        out
    }

    /// Decode a row-major little-endian payload.
    pub fn from_le_bytes(bytes: &[u8], shape: &[usize]) -> Result<Self> {
        let expected = shape::byte_len(shape, T::BYTE_WIDTH)?;
        if bytes.len() != expected {
            return Err(DatasetError::count_mismatch(expected, bytes.len()));
        }
        let data = bytes.chunks_exact(T::BYTE_WIDTH).map(T::read_le).collect();
        Self::from_vec(data, shape)
    }
}

impl<T: Element> Clone for Dataset<T> {
    /// Deep copy of the visible elements into a new contiguous buffer.
    fn clone(&self) -> Self {
        Self::from_parts(
            self.name.clone(),
            Layout::contiguous(self.shape()),
            Buffer::from_vec(self.to_vec()),
            false,
        )
    }
}

impl<T: Element> PartialEq for Dataset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.to_vec() == other.to_vec()
    }
}
