use object_store::{ObjectStore, PutPayload, path::Path};

use crate::{
    consts,
    dataset::{AnyDataset, Dataset},
    dtype::DataType,
    element::Element,
    store::{DatasetMetadata, StoreError},
};

/// Writes one dataset into a directory of an object store.
pub struct DatasetObjectWriter<S: ObjectStore> {
    store: S,
    dataset_dir: Path,
}

impl<S: ObjectStore> DatasetObjectWriter<S> {
    pub fn new(store: S, dataset_dir: Path) -> Self {
        Self { store, dataset_dir }
    }

    pub async fn write(&self, dataset: &AnyDataset) -> Result<DatasetMetadata, StoreError> {
        self.put(dataset.name(), dataset.data_type(), dataset.shape(), dataset.to_le_bytes())
            .await
    }

    pub async fn write_dataset<T: Element>(
        &self,
        dataset: &Dataset<T>,
    ) -> Result<DatasetMetadata, StoreError> {
        self.put(dataset.name(), T::TYPE, dataset.shape(), dataset.to_le_bytes())
            .await
    }

    async fn put(
        &self,
        name: &str,
        data_type: DataType,
        shape: &[usize],
        payload: Vec<u8>,
    ) -> Result<DatasetMetadata, StoreError> {
        let metadata = DatasetMetadata::new(name, data_type, shape);
        let json = metadata.to_json()?;

        let data_path = self.dataset_dir.child(consts::DATASET_DATA_OBJECT);
        let payload_len = payload.len();
        self.store
            .put(&data_path, PutPayload::from_bytes(bytes::Bytes::from(payload)))
            .await?;

        let metadata_path = self.dataset_dir.child(consts::DATASET_METADATA_OBJECT);
        self.store
            .put(&metadata_path, PutPayload::from_bytes(bytes::Bytes::from(json)))
            .await?;

        tracing::debug!(
            dir = %self.dataset_dir,
            %data_type,
            ?shape,
            bytes = payload_len,
            "wrote dataset"
        );
        Ok(metadata)
    }
}
