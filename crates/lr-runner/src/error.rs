use thiserror::Error;

/// Boxed error returned by an execution primitive.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("model load error: {0}")]
    ModelLoad(#[from] lr_model::ModelError),
    #[error("shape mismatch for slot '{slot}': declared {declared}, got {got}")]
    ShapeMismatch {
        slot: String,
        declared: String,
        got: String,
    },
    #[error("expected {expected} input(s), got {got}")]
    Arity { expected: usize, got: usize },
    #[error("slot index {index} out of range for {count} input slot(s)")]
    SlotIndex { index: usize, count: usize },
    #[error("no input matches slot '{slot}'")]
    UnknownInput { slot: String },
    #[error("execution failed: {0}")]
    Execution(#[source] BoxError),
    #[error("tensor error: {0}")]
    Tensor(#[from] lr_tensor::TensorError),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
