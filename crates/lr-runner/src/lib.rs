//! `lr-runner` - Quantization-aware inference runner.
//!
//! Per invocation the runner binds caller inputs to the model's declared
//! input slots, negotiates buffer shapes, quantizes into the buffers, calls
//! the execution primitive and dequantizes the outputs.

pub mod binder;
pub mod buffer;
pub mod collector;
pub mod config;
pub mod error;
pub mod inputs;
pub mod primitive;
pub mod runner;

pub use binder::NameMatching;
pub use buffer::{NegotiationStats, ShapeNegotiator, TensorBuffer};
pub use collector::Outputs;
pub use config::RunnerConfig;
pub use error::{BoxError, Result, RunnerError};
pub use inputs::Inputs;
pub use primitive::{ExecutionPrimitive, IdentityExecutor};
pub use runner::Runner;
