use thiserror::Error;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape {shape:?} needs {expected} elements, got {got}")]
    LengthMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: String, got: String },
    #[error("byte length {len} is not a whole number of {dtype} elements")]
    ByteLength { dtype: String, len: usize },
    #[error("invalid quantization scale {0}: must be finite and positive")]
    InvalidScale(f64),
}

pub type Result<T> = std::result::Result<T, TensorError>;
