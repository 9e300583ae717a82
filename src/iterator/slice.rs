use smallvec::SmallVec;

use crate::{
    consts::INLINE_RANK,
    error::{DatasetError, Result},
    iterator::IndexIterator,
    layout::Layout,
    shape::{Shape, Strides},
    slice::{self, ResolvedSlice, Slice},
};

/// Odometer walk over a hyper-rectangular region of a layout.
///
/// The last axis advances first; on overflow it resets and carries into the next slower axis.
/// The buffer index is updated incrementally from the layout's strides.
#[derive(Debug, Clone)]
pub struct SliceIterator {
    source: Layout,
    slices: SmallVec<[ResolvedSlice; INLINE_RANK]>,
    shape: Shape,
    /// Buffer step per selection step, per axis.
    deltas: Strides,
    start_index: isize,
    pos: Shape,
    index: isize,
    remaining: usize,
    started: bool,
}

impl SliceIterator {
    /// Walk `slices` over `layout`; missing trailing slices select whole axes.
    ///
    /// # Errors
    /// - [`DatasetError::ShapeMismatch`] when more slices than axes are given.
    /// - [`DatasetError::InvalidShape`] for a zero step.
    pub fn new(layout: &Layout, slices: &[Slice]) -> Result<Self> {
        if slices.len() > layout.rank() {
            return Err(DatasetError::shape_mismatch(&layout.shape, &[slices.len()]));
        }
        let mut resolved = SmallVec::with_capacity(layout.rank());
        for (axis, &len) in layout.shape.iter().enumerate() {
            let s = slices.get(axis).copied().unwrap_or_default();
            resolved.push(s.resolve(len)?);
        }
        Ok(Self::from_resolved(layout, resolved))
    }

    /// Walk every element of `layout` in row-major order.
    pub fn full(layout: &Layout) -> Self {
        let resolved = layout.shape.iter().map(|&len| ResolvedSlice::full(len)).collect();
        Self::from_resolved(layout, resolved)
    }

    pub(crate) fn from_resolved(
        layout: &Layout,
        slices: SmallVec<[ResolvedSlice; INLINE_RANK]>,
    ) -> Self {
        let strides = layout.effective_strides();
        let shape: Shape = slices.iter().map(|s| s.count).collect();
        let remaining = shape.iter().product();
        let deltas: Strides = slices
            .iter()
            .zip(strides.iter())
            .map(|(s, &stride)| s.step * stride)
            .collect();
        let start_index = layout.offset as isize
            + slices
                .iter()
                .zip(strides.iter())
                .map(|(s, &stride)| s.start * stride)
                .sum::<isize>();
        let rank = shape.len();
        Self {
            source: layout.clone(),
            slices,
            shape,
            deltas,
            start_index,
            pos: smallvec::smallvec![0; rank],
            index: start_index,
            remaining,
            started: false,
        }
    }

    /// The layout this iterator walks over.
    pub fn source(&self) -> &Layout {
        &self.source
    }

    /// Shape of the layout this iterator walks over.
    pub fn source_shape(&self) -> &[usize] {
        &self.source.shape
    }

    pub fn slices(&self) -> &[ResolvedSlice] {
        &self.slices
    }

    /// `start:stop:step` description of the region, e.g. `1:3,::2`.
    pub fn describe(&self) -> String {
        slice::create_string(&self.source.shape, &self.slices)
    }

    fn step(&mut self) {
        for d in (0..self.shape.len()).rev() {
            self.pos[d] += 1;
            self.index += self.deltas[d];
            if self.pos[d] < self.shape[d] {
                return;
            }
            self.index -= self.deltas[d] * self.shape[d] as isize;
            self.pos[d] = 0;
        }
    }
}

impl IndexIterator for SliceIterator {
    fn advance(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        if self.started {
            self.step();
        } else {
            self.started = true;
            self.index = self.start_index;
        }
        self.remaining -= 1;
        true
    }

    fn index(&self) -> usize {
        self.index as usize
    }

    /// Position inside the selection (not inside the source layout).
    fn position(&self) -> Option<&[usize]> {
        Some(&self.pos)
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }
}

/// Row-major positions of a shape; `index` is the flat position.
#[derive(Debug, Clone)]
pub struct PositionIterator(SliceIterator);

impl PositionIterator {
    pub fn new(shape: &[usize]) -> Self {
        Self(SliceIterator::full(&Layout::contiguous(shape)))
    }
}

impl IndexIterator for PositionIterator {
    fn advance(&mut self) -> bool {
        self.0.advance()
    }

    fn index(&self) -> usize {
        self.0.index()
    }

    fn position(&self) -> Option<&[usize]> {
        self.0.position()
    }

    fn shape(&self) -> &[usize] {
        self.0.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::collect_indices;

    #[test]
    fn slice_selects_rows_and_stepped_columns() {
        let layout = Layout::contiguous(&[4, 4]);
        let slices = [Slice::range(1, 3), Slice::stepped(0, 4, 2)];
        let mut it = SliceIterator::new(&layout, &slices).unwrap();
        assert_eq!(it.shape(), &[2, 2]);
        assert_eq!(collect_indices(&mut it).unwrap(), vec![4, 6, 8, 10]);
    }

    #[test]
    fn full_walk_of_strided_layout() {
        // Every other element of the second row block of a 4x4 buffer.
        let layout = Layout::strided(&[2, 2], &[4, 2], 4, 16).unwrap();
        let mut it = SliceIterator::full(&layout);
        assert_eq!(collect_indices(&mut it).unwrap(), vec![4, 6, 8, 10]);
    }

    #[test]
    fn negative_step_walks_backwards() {
        let layout = Layout::contiguous(&[5]);
        let mut it = SliceIterator::new(&layout, &[Slice::new(None, None, -2)]).unwrap();
        assert_eq!(collect_indices(&mut it).unwrap(), vec![4, 2, 0]);
    }

    #[test]
    fn zero_length_axis_is_exhausted_immediately() {
        let layout = Layout::contiguous(&[3, 4]);
        let mut it = SliceIterator::new(&layout, &[Slice::range(2, 2)]).unwrap();
        assert_eq!(it.shape(), &[0, 4]);
        assert!(!it.advance());
    }

    #[test]
    fn positions_follow_odometer_order() {
        let mut it = PositionIterator::new(&[2, 3]);
        let mut seen = Vec::new();
        while it.advance() {
            seen.push(it.position().unwrap().to_vec());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[2], vec![0, 2]);
        assert_eq!(seen[3], vec![1, 0]);
    }

    #[test]
    fn describe_reports_region() {
        let layout = Layout::contiguous(&[4, 4]);
        let slices = [Slice::range(1, 3), Slice::stepped(0, 4, 2)];
        let it = SliceIterator::new(&layout, &slices).unwrap();
        assert_eq!(it.describe(), "1:3,::2");
    }

    #[test]
    fn too_many_slices_is_a_shape_mismatch() {
        let layout = Layout::contiguous(&[4]);
        let err = SliceIterator::new(&layout, &[Slice::full(), Slice::full()]).unwrap_err();
        assert!(matches!(err, DatasetError::ShapeMismatch { .. }));
    }
}
