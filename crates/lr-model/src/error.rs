use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model blob magic: expected 'LRTM', got {0:?}")]
    InvalidMagic([u8; 4]),
    #[error("unsupported model blob version: {0}")]
    UnsupportedVersion(u32),
    #[error("missing metadata key: {0}")]
    MissingKey(String),
    #[error("type mismatch for key '{key}': expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: String,
        got: String,
    },
    #[error("unsupported metadata value type id: {0}")]
    UnsupportedValueType(u32),
    #[error("unsupported element type id {id} for '{name}'")]
    UnsupportedElementType { name: String, id: u32 },
    #[error("invalid dimension {dim} in shape of '{name}'")]
    InvalidDimension { name: String, dim: i64 },
    #[error("duplicate {direction} slot name '{name}'")]
    DuplicateSlot { direction: String, name: String },
    #[error("model declares no {0} tensors")]
    NoTensorMetadata(String),
    #[error("invalid quantization for '{name}': {reason}")]
    InvalidQuantization { name: String, reason: String },
    #[error("weight tensor not found: {0}")]
    WeightNotFound(String),
    #[error("weight data for '{name}' runs past the end of the blob")]
    Truncated { name: String },
    #[error("tensor error: {0}")]
    TensorError(#[from] lr_tensor::TensorError),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
