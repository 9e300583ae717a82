//! Access to datasets whose element kind is only known at run time.

use std::any::Any;

use num_complex::{Complex32, Complex64};

use crate::{
    dataset::Dataset,
    dtype::DataType,
    element::Element,
    error::Result,
    iterator::{IndexIterator, PositionIterator},
    scalar::Scalar,
};

/// Read side of the kind-erased dataset contract.
pub trait ReadableDataset: Send + Sync {
    fn name(&self) -> &str;

    fn shape(&self) -> &[usize];

    fn rank(&self) -> usize {
        self.shape().len()
    }

    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    fn data_type(&self) -> DataType;

    fn get_scalar(&self, pos: &[usize]) -> Result<Scalar>;

    fn as_any(&self) -> &dyn Any;
}

pub trait WritableDataset: ReadableDataset {
    /// Store `value`, converted to the dataset's kind, at `pos`.
    fn set_scalar(&mut self, pos: &[usize], value: Scalar) -> Result<()>;
}

impl<T: Element> ReadableDataset for Dataset<T> {
    fn name(&self) -> &str {
        Dataset::name(self)
    }

    fn shape(&self) -> &[usize] {
        Dataset::shape(self)
    }

    fn data_type(&self) -> DataType {
        T::TYPE
    }

    fn get_scalar(&self, pos: &[usize]) -> Result<Scalar> {
        Dataset::get_scalar(self, pos)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Element> WritableDataset for Dataset<T> {
    fn set_scalar(&mut self, pos: &[usize], value: Scalar) -> Result<()> {
        Dataset::set_scalar(self, pos, value)
    }
}

/// Values of `source` converted to `T`, in row-major order.
///
/// A `Dataset<T>` is copied out directly; anything else goes element by element through
/// [`ReadableDataset::get_scalar`].
pub(crate) fn read_values<T: Element>(source: &dyn ReadableDataset) -> Result<Vec<T>> {
    if let Some(typed) = source.as_any().downcast_ref::<Dataset<T>>() {
        return Ok(typed.to_vec());
    }
    let mut values = Vec::with_capacity(source.size());
    let mut it = PositionIterator::new(source.shape());
    while it.advance() {
        let pos = it.position().unwrap_or(&[]);
        values.push(T::from_scalar(source.get_scalar(pos)?));
    }
    Ok(values)
}

/// A dataset of any element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDataset {
    Bool(Dataset<bool>),
    I8(Dataset<i8>),
    I16(Dataset<i16>),
    I32(Dataset<i32>),
    I64(Dataset<i64>),
    U8(Dataset<u8>),
    U16(Dataset<u16>),
    U32(Dataset<u32>),
    U64(Dataset<u64>),
    F32(Dataset<f32>),
    F64(Dataset<f64>),
    Complex64(Dataset<Complex32>),
    Complex128(Dataset<Complex64>),
}

macro_rules! dispatch {
    ($value:expr, $ds:ident => $body:expr) => {
        match $value {
            AnyDataset::Bool($ds) => $body,
            AnyDataset::I8($ds) => $body,
            AnyDataset::I16($ds) => $body,
            AnyDataset::I32($ds) => $body,
            AnyDataset::I64($ds) => $body,
            AnyDataset::U8($ds) => $body,
            AnyDataset::U16($ds) => $body,
            AnyDataset::U32($ds) => $body,
            AnyDataset::U64($ds) => $body,
            AnyDataset::F32($ds) => $body,
            AnyDataset::F64($ds) => $body,
            AnyDataset::Complex64($ds) => $body,
            AnyDataset::Complex128($ds) => $body,
        }
    };
}

/// Evaluate `$body` with `$e` bound to the element type of `data_type` and wrap the dataset it
/// produces in the matching variant.
macro_rules! with_element {
    ($data_type:expr, $e:ident => $body:expr) => {
        match $data_type {
            DataType::Bool => {
                type $e = bool;
                AnyDataset::Bool($body)
            }
            DataType::I8 => {
                type $e = i8;
                AnyDataset::I8($body)
            }
            DataType::I16 => {
                type $e = i16;
                AnyDataset::I16($body)
            }
            DataType::I32 => {
                type $e = i32;
                AnyDataset::I32($body)
            }
            DataType::I64 => {
                type $e = i64;
                AnyDataset::I64($body)
            }
            DataType::U8 => {
                type $e = u8;
                AnyDataset::U8($body)
            }
            DataType::U16 => {
                type $e = u16;
                AnyDataset::U16($body)
            }
            DataType::U32 => {
                type $e = u32;
                AnyDataset::U32($body)
            }
            DataType::U64 => {
                type $e = u64;
                AnyDataset::U64($body)
            }
            DataType::F32 => {
                type $e = f32;
                AnyDataset::F32($body)
            }
            DataType::F64 => {
                type $e = f64;
                AnyDataset::F64($body)
            }
            DataType::Complex64 => {
                type $e = Complex32;
                AnyDataset::Complex64($body)
            }
            DataType::Complex128 => {
                type $e = Complex64;
                AnyDataset::Complex128($body)
            }
        }
    };
}

macro_rules! any_from {
    ($ty:ty, $variant:ident) => {
        impl From<Dataset<$ty>> for AnyDataset {
            fn from(value: Dataset<$ty>) -> Self {
                AnyDataset::$variant(value)
            }
        }
    };
}

any_from!(bool, Bool);
any_from!(i8, I8);
any_from!(i16, I16);
any_from!(i32, I32);
any_from!(i64, I64);
any_from!(u8, U8);
any_from!(u16, U16);
any_from!(u32, U32);
any_from!(u64, U64);
any_from!(f32, F32);
any_from!(f64, F64);
any_from!(Complex32, Complex64);
any_from!(Complex64, Complex128);

impl AnyDataset {
    pub fn zeros(data_type: DataType, shape: &[usize]) -> Result<Self> {
        Ok(with_element!(data_type, E => Dataset::<E>::zeros(shape)?))
    }

    /// Decode a row-major little-endian payload of `data_type` elements.
    pub fn from_le_bytes(data_type: DataType, bytes: &[u8], shape: &[usize]) -> Result<Self> {
        Ok(with_element!(data_type, E => Dataset::<E>::from_le_bytes(bytes, shape)?))
    }

    pub fn data_type(&self) -> DataType {
        dispatch!(self, ds => ds.data_type())
    }

    pub fn name(&self) -> &str {
        dispatch!(self, ds => ds.name())
    }

    pub fn shape(&self) -> &[usize] {
        dispatch!(self, ds => ds.shape())
    }

    pub fn set_name(&mut self, name: &str) {
        dispatch!(self, ds => ds.set_name(name))
    }

    /// Element-wise converted copy.
    pub fn cast(&self, data_type: DataType) -> Self {
        with_element!(data_type, E => dispatch!(self, ds => ds.cast::<E>()))
    }

    pub fn as_readable(&self) -> &dyn ReadableDataset {
        dispatch!(self, ds => ds as &dyn ReadableDataset)
    }

    pub fn as_writable(&mut self) -> &mut dyn WritableDataset {
        dispatch!(self, ds => ds as &mut dyn WritableDataset)
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        dispatch!(self, ds => ds.to_le_bytes())
    }

    /// The typed dataset, when `T` is this dataset's element kind.
    pub fn into_dataset<T: Element>(self) -> Option<Dataset<T>> {
        dispatch!(self, ds => {
            let boxed: Box<dyn Any> = Box::new(ds);
            boxed.downcast::<Dataset<T>>().ok().map(|b| *b)
        })
    }

    pub fn downcast_ref<T: Element>(&self) -> Option<&Dataset<T>> {
        self.as_readable().as_any().downcast_ref::<Dataset<T>>()
    }
}
