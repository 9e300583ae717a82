use chrono::{DateTime, Utc};
use compact_str::CompactString;

use crate::{
    dtype::DataType,
    shape::{self, Shape},
    store::StoreError,
};

/// Description of a stored dataset, kept as `dataset.json`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetMetadata {
    pub name: CompactString,
    pub data_type: DataType,
    pub shape: Shape,
    pub written_at: DateTime<Utc>,
}

impl DatasetMetadata {
    pub fn new(name: &str, data_type: DataType, shape: &[usize]) -> Self {
        Self {
            name: CompactString::from(name),
            data_type,
            shape: Shape::from_slice(shape),
            written_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, simd_json::Error> {
        simd_json::serde::to_vec(self)
    }

    /// Parse JSON in place; simd-json rewrites the input while parsing.
    pub fn from_json(bytes: &mut [u8]) -> Result<Self, simd_json::Error> {
        simd_json::serde::from_slice(bytes)
    }

    /// Expected payload size in bytes.
    ///
    /// # Errors
    /// [`StoreError::Dataset`] when the shape's byte size overflows `usize`, e.g. for corrupt
    /// metadata.
    pub fn payload_len(&self) -> Result<usize, StoreError> {
        Ok(shape::byte_len(&self.shape, self.data_type.byte_width())?)
    }
}
