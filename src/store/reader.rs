use object_store::{ObjectStore, path::Path};

use crate::{
    consts,
    dataset::{AnyDataset, Dataset},
    element::Element,
    error::DatasetError,
    store::{DatasetMetadata, StoreError},
};

/// Reads one dataset back from a directory written by
/// [`DatasetObjectWriter`](crate::store::DatasetObjectWriter).
pub struct DatasetObjectReader<S: ObjectStore> {
    store: S,
    dataset_dir: Path,
}

impl<S: ObjectStore> DatasetObjectReader<S> {
    pub fn new(store: S, dataset_dir: Path) -> Self {
        Self { store, dataset_dir }
    }

    pub async fn read_metadata(&self) -> Result<DatasetMetadata, StoreError> {
        let path = self.dataset_dir.child(consts::DATASET_METADATA_OBJECT);
        let mut json = self.store.get(&path).await?.bytes().await?.to_vec();
        Ok(DatasetMetadata::from_json(&mut json)?)
    }

    /// The payload, checked against the size `metadata` promises.
    async fn read_payload(&self, metadata: &DatasetMetadata) -> Result<bytes::Bytes, StoreError> {
        let expected = metadata.payload_len()?;
        let path = self.dataset_dir.child(consts::DATASET_DATA_OBJECT);
        let payload = self.store.get(&path).await?.bytes().await?;
        if payload.len() != expected {
            tracing::warn!(
                dir = %self.dataset_dir,
                expected,
                actual = payload.len(),
                "payload size mismatch"
            );
            return Err(DatasetError::count_mismatch(expected, payload.len()).into());
        }
        Ok(payload)
    }

    /// Read a dataset whose element kind is taken from its metadata.
    pub async fn read_any(&self) -> Result<AnyDataset, StoreError> {
        let metadata = self.read_metadata().await?;
        let payload = self.read_payload(&metadata).await?;
        let mut dataset = AnyDataset::from_le_bytes(metadata.data_type, &payload, &metadata.shape)?;
        dataset.set_name(&metadata.name);
        tracing::debug!(dir = %self.dataset_dir, data_type = %metadata.data_type, "read dataset");
        Ok(dataset)
    }

    /// Read a dataset stored with element kind `T`.
    pub async fn read<T: Element>(&self) -> Result<Dataset<T>, StoreError> {
        let metadata = self.read_metadata().await?;
        if metadata.data_type != T::TYPE {
            return Err(StoreError::DataTypeMismatch {
                expected: metadata.data_type,
                actual: T::TYPE,
            });
        }
        let payload = self.read_payload(&metadata).await?;
        let mut dataset = Dataset::<T>::from_le_bytes(&payload, &metadata.shape)?;
        dataset.set_name(&metadata.name);
        Ok(dataset)
    }
}
