//! `lr-tensor` - Typed tensors and affine quantization for lite-runner.
//!
//! This crate provides:
//! - Data type definitions for every slot element type
//! - A `Tensor` type backed by typed CPU storage
//! - Concrete shapes and declared (possibly dynamic) dimensions
//! - The affine quantization codec

pub mod dtype;
pub mod error;
pub mod quant;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use quant::QuantParams;
pub use shape::{Dim, Shape};
pub use storage::{CpuStorage, TensorElement};
pub use tensor::Tensor;
