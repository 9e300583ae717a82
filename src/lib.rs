//! Typed N-dimensional datasets.
//!
//! A [`Dataset<T>`] holds homogeneous elements of one primitive kind under an arbitrary shape.
//! Datasets can be viewed (sharing storage through strides and an offset) or copied, sliced,
//! assigned through boolean masks or integer index arrays, updated with broadcasting arithmetic,
//! and queried for memoized extrema. Every traversal runs through the [`iterator`] family.
//!
//! ```
//! use ndset::{Dataset, Slice};
//!
//! let grid = Dataset::from_vec((0..16).collect::<Vec<i32>>(), &[4, 4]).unwrap();
//! let corner = grid.get_slice(&[Slice::range(1, 3), Slice::stepped(0, 4, 2)]).unwrap();
//! assert_eq!(corner.shape(), &[2, 2]);
//! assert_eq!(corner.to_vec(), vec![4, 6, 8, 10]);
//! ```

pub mod buffer;
pub mod consts;
pub mod dataset;
pub mod dtype;
pub mod element;
pub mod error;
pub mod iterator;
pub mod layout;
pub mod scalar;
pub mod shape;
pub mod slice;
pub mod store;

pub use dataset::{AnyDataset, Dataset, Operand, ReadableDataset, Source, WritableDataset};
pub use dtype::DataType;
pub use element::Element;
pub use error::{AllocationError, DatasetError, Result};
pub use scalar::Scalar;
pub use slice::Slice;
