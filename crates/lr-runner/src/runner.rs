use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use lr_model::{ModelBlob, ModelMetadata};
use lr_tensor::quant::quantize_into;

use crate::binder::bind;
use crate::buffer::{check_shape, NegotiationStats, ShapeNegotiator};
use crate::collector::{collect, Outputs};
use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};
use crate::inputs::Inputs;
use crate::primitive::ExecutionPrimitive;

/// Runs a model's execution primitive with binding, shape negotiation and
/// quantization handled around it.
///
/// A runner owns its input buffers and is driven through `&mut self`, so one
/// instance serves one invocation at a time. Several runners may share the
/// same `Arc<ModelMetadata>`.
pub struct Runner<P> {
    metadata: Arc<ModelMetadata>,
    primitive: P,
    config: RunnerConfig,
    negotiator: ShapeNegotiator,
}

impl<P: ExecutionPrimitive> Runner<P> {
    pub fn new(metadata: Arc<ModelMetadata>, primitive: P, config: RunnerConfig) -> Self {
        let negotiator = ShapeNegotiator::new(metadata.inputs().len(), config.reuse_buffers);
        Runner {
            metadata,
            primitive,
            config,
            negotiator,
        }
    }

    /// Load slot metadata from an in-memory blob and build a runner.
    pub fn from_bytes(bytes: &[u8], primitive: P, config: RunnerConfig) -> Result<Self> {
        let metadata = lr_model::load(bytes)?;
        Ok(Runner::new(metadata, primitive, config))
    }

    /// Load slot metadata from a blob file and build a runner.
    pub fn from_file(path: &Path, primitive: P, config: RunnerConfig) -> Result<Self> {
        let blob = ModelBlob::open(path)?;
        let metadata = Arc::new(ModelMetadata::from_blob(&blob)?);
        Ok(Runner::new(metadata, primitive, config))
    }

    pub fn metadata(&self) -> &Arc<ModelMetadata> {
        &self.metadata
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn stats(&self) -> NegotiationStats {
        self.negotiator.stats()
    }

    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    /// Run one invocation.
    ///
    /// Inputs are bound and every shape is checked before any buffer is
    /// touched; a failed validation leaves the runner as it was.
    pub fn run(&mut self, inputs: impl Into<Inputs>) -> Result<Outputs> {
        let start = Instant::now();
        let inputs = inputs.into();
        let slots = self.metadata.inputs();

        let bound = bind(&inputs, slots, self.config.name_matching)?;
        for (slot, tensor) in slots.iter().zip(&bound) {
            check_shape(slot, tensor.shape())?;
        }

        for (i, (slot, tensor)) in slots.iter().zip(&bound).enumerate() {
            if slot.quantization.is_none() && tensor.dtype() != slot.dtype {
                tracing::warn!(
                    "converting input for slot '{}' from {} to {}",
                    slot.name,
                    tensor.dtype(),
                    slot.dtype
                );
            }
            let buffer = self.negotiator.negotiate(i, slot, tensor.shape())?;
            quantize_into(tensor, slot.quantization.as_ref(), buffer.storage_mut())?;
        }

        let raw = self
            .primitive
            .forward(&self.negotiator.buffers())
            .map_err(RunnerError::Execution)?;
        let outputs = collect(self.metadata.outputs(), raw)?;

        tracing::debug!("invocation finished in {:.3} ms", start.elapsed().as_secs_f64() * 1e3);
        Ok(outputs)
    }
}

impl<P> std::fmt::Debug for Runner<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("metadata", &self.metadata)
            .field("config", &self.config)
            .field("negotiator", &self.negotiator)
            .finish()
    }
}
