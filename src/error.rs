use thiserror::Error;

use crate::dtype::DataType;

/// Reasons a backing buffer could not be allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The byte size of the request does not fit the addressable index space.
    #[error("{elements} elements of {width} bytes exceed the addressable index space")]
    TooLarge { elements: usize, width: usize },
    /// The allocator could not provide the memory.
    #[error("not enough memory available to hold {elements} elements")]
    OutOfMemory { elements: usize },
}

/// Errors returned by dataset construction, access and bulk operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    /// A dimension is negative, or the element count overflows `usize`.
    #[error("invalid shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<i64>, reason: &'static str },

    /// Two shapes (or element counts) that must agree do not.
    #[error("shape mismatch: {left:?} is not compatible with {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    /// A coordinate, absolute index or fancy-index value lies outside `[0, len)`.
    #[error("index {index} is out of range for axis {axis} of length {len}")]
    IndexOutOfRange { axis: usize, index: i64, len: usize },

    /// The operation has no meaning for this element kind.
    #[error("{operation} is not supported for {data_type} datasets")]
    UnsupportedOperation {
        operation: &'static str,
        data_type: DataType,
    },

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// The memoized statistics disagree with the data they were computed from.
    #[error("inconsistent internal state of stored statistics: {0}")]
    InternalConsistency(&'static str),
}

impl DatasetError {
    pub(crate) fn shape_mismatch(left: &[usize], right: &[usize]) -> Self {
        DatasetError::ShapeMismatch {
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }

    pub(crate) fn count_mismatch(expected: usize, actual: usize) -> Self {
        DatasetError::ShapeMismatch {
            left: vec![expected],
            right: vec![actual],
        }
    }

    pub(crate) fn unsupported(operation: &'static str, data_type: DataType) -> Self {
        DatasetError::UnsupportedOperation {
            operation,
            data_type,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
