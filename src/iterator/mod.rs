//! Index iterators.
//!
//! Every traversal of a dataset goes through an [`IndexIterator`]: a single-pass, forward-only
//! cursor producing buffer indices. Construct a fresh iterator to traverse again.
//!
//! | Iterator | Walks |
//! |---|---|
//! | [`ContiguousIterator`] | `offset..offset + len` |
//! | [`SliceIterator`] | a `start:stop:step` hyper-rectangle over any layout (odometer order) |
//! | [`PositionIterator`] | row-major positions of a shape |
//! | [`BooleanIterator`] | positions where a broadcast boolean mask is true |
//! | [`IntegerIterator`] | flat positions listed by an integer index array |
//! | [`IntegersIterator`] | positions built from one integer index array per axis |
//! | [`BroadcastIterator`] | index pairs into two broadcast-compatible layouts |
//!
//! Iterators are neither `Sync`-shared nor restartable: confine one traversal to one thread.

mod boolean;
mod broadcast;
mod contiguous;
mod integer;
mod slice;

pub use boolean::BooleanIterator;
pub use broadcast::BroadcastIterator;
pub use contiguous::ContiguousIterator;
pub use integer::{AxisIndex, IndexArray, IntegerIterator, IntegersIterator};
pub use slice::{PositionIterator, SliceIterator};

use crate::error::{DatasetError, Result};

pub trait IndexIterator {
    /// Move to the next element. Returns `false` once exhausted.
    fn advance(&mut self) -> bool;

    /// Buffer index of the current element. Only meaningful after `advance` returned `true`.
    fn index(&self) -> usize;

    /// Multi-dimensional position of the current element, for position-aware iterators.
    fn position(&self) -> Option<&[usize]> {
        None
    }

    /// Shape of the selection this iterator walks.
    fn shape(&self) -> &[usize];

    /// Error that stopped the traversal early, if any. Taking it clears it.
    fn take_error(&mut self) -> Option<DatasetError> {
        None
    }
}

/// Drain `iter` into a list of buffer indices, surfacing any error met on the way.
pub fn collect_indices<I: IndexIterator + ?Sized>(iter: &mut I) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    while iter.advance() {
        indices.push(iter.index());
    }
    match iter.take_error() {
        Some(err) => Err(err),
        None => Ok(indices),
    }
}
