/// Brackets wrapped around the slice description appended to a sliced dataset's name,
/// e.g. `counts[1:3,::2]`.
pub const BLOCK_OPEN: char = '[';
pub const BLOCK_CLOSE: char = ']';

/// Inline capacity for shapes, strides and positions before spilling to the heap.
pub const INLINE_RANK: usize = 4;

/// Object names for a persisted dataset:
///     dataset_dir/
///         dataset.json
///         data.bin
///
pub const DATASET_METADATA_OBJECT: &str = "dataset.json";
pub const DATASET_DATA_OBJECT: &str = "data.bin";
