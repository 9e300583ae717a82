//! Persisting datasets to an [`object_store::ObjectStore`].
//!
//! ## Layout
//! Every dataset lives under its own directory:
//! - `dataset.json` holds the JSON [`DatasetMetadata`] (name, element kind, shape, write time).
//! - `data.bin` holds the elements in row-major order, little-endian, complex values as
//!   `(re, im)` pairs.
//!
//! The payload is written before the metadata, so a directory with metadata always has a
//! complete payload.

mod metadata;
mod reader;
mod writer;

pub use metadata::DatasetMetadata;
pub use reader::DatasetObjectReader;
pub use writer::DatasetObjectWriter;

use compact_str::CompactString;
use futures::future::BoxFuture;
use object_store::{ObjectStore, path::Path};

use crate::{dataset::AnyDataset, dtype::DataType, error::DatasetError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),

    #[error(transparent)]
    Json(#[from] simd_json::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("data type mismatch when reading dataset: stored {expected}, requested {actual}")]
    DataTypeMismatch {
        expected: DataType,
        actual: DataType,
    },
}

/// Load/store interface the dataset core persists through.
pub trait DatasetStore: Send + Sync {
    fn save<'a>(
        &'a self,
        key: &'a str,
        dataset: &'a AnyDataset,
    ) -> BoxFuture<'a, Result<DatasetMetadata, StoreError>>;

    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<AnyDataset, StoreError>>;

    /// Keys of every stored dataset.
    fn keys(&self) -> BoxFuture<'_, Result<Vec<CompactString>, StoreError>>;
}

/// A [`DatasetStore`] keeping each dataset in `root/<key>/`.
pub struct ObjectDatasetStore<S: ObjectStore> {
    store: S,
    root: Path,
}

impl<S: ObjectStore + Clone> ObjectDatasetStore<S> {
    pub fn new(store: S, root: Path) -> Self {
        Self { store, root }
    }

    fn dataset_dir(&self, key: &str) -> Path {
        self.root.child(key)
    }
}

impl<S: ObjectStore + Clone> DatasetStore for ObjectDatasetStore<S> {
    fn save<'a>(
        &'a self,
        key: &'a str,
        dataset: &'a AnyDataset,
    ) -> BoxFuture<'a, Result<DatasetMetadata, StoreError>> {
        Box::pin(async move {
            let writer = DatasetObjectWriter::new(self.store.clone(), self.dataset_dir(key));
            writer.write(dataset).await
        })
    }

    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<AnyDataset, StoreError>> {
        Box::pin(async move {
            let reader = DatasetObjectReader::new(self.store.clone(), self.dataset_dir(key));
            reader.read_any().await
        })
    }

    fn keys(&self) -> BoxFuture<'_, Result<Vec<CompactString>, StoreError>> {
        Box::pin(async move {
            let listing = self.store.list_with_delimiter(Some(&self.root)).await?;
            let mut keys: Vec<CompactString> = listing
                .common_prefixes
                .iter()
                .filter_map(|prefix| prefix.filename())
                .map(CompactString::from)
                .collect();
            keys.sort();
            Ok(keys)
        })
    }
}
