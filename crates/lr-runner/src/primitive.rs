use lr_tensor::Tensor;

use crate::buffer::TensorBuffer;
use crate::error::BoxError;

/// The opaque forward step of a model.
///
/// Receives one bound buffer per input slot, in declared order, and returns
/// one raw tensor per output slot, in declared order. Outputs are expected
/// in each output slot's stored element type; the runner dequantizes them.
pub trait ExecutionPrimitive {
    fn forward(&mut self, inputs: &[&TensorBuffer]) -> Result<Vec<Tensor>, BoxError>;
}

impl<F> ExecutionPrimitive for F
where
    F: FnMut(&[&TensorBuffer]) -> Result<Vec<Tensor>, BoxError>,
{
    fn forward(&mut self, inputs: &[&TensorBuffer]) -> Result<Vec<Tensor>, BoxError> {
        self(inputs)
    }
}

/// Echoes every input buffer back as an output, unchanged.
///
/// Useful for exercising binding, quantization and collection without a
/// real model.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityExecutor;

impl ExecutionPrimitive for IdentityExecutor {
    fn forward(&mut self, inputs: &[&TensorBuffer]) -> Result<Vec<Tensor>, BoxError> {
        Ok(inputs
            .iter()
            .map(|b| b.to_tensor())
            .collect::<Result<Vec<_>, _>>()?)
    }
}
