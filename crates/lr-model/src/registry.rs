//! Tensor slot registry.
//!
//! A model's slots are declared in the blob's metadata table under `io.*`
//! keys. For direction `d` (`input` or `output`) and slot index `i`:
//!
//! - `io.{d}_count` (U32): number of slots
//! - `io.{d}.{i}.name` (String)
//! - `io.{d}.{i}.shape` (Array of I64, `-1` = dynamic)
//! - `io.{d}.{i}.dtype` (U32 element type id)
//! - `io.{d}.{i}.quant.scale` (F64, optional)
//! - `io.{d}.{i}.quant.zero_point` (I64, optional)

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use lr_tensor::shape::format_dims;
use lr_tensor::{DType, Dim, QuantParams};

use crate::blob::{MetaTable, ModelBlob};
use crate::error::{ModelError, Result};

/// Whether a slot feeds the model or is produced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }

    /// Metadata key holding the number of slots in this direction.
    pub fn count_key(&self) -> String {
        format!("io.{}_count", self.as_str())
    }

    /// Metadata key for `field` of slot `index`.
    pub fn slot_key(&self, index: usize, field: &str) -> String {
        format!("io.{}.{}.{}", self.as_str(), index, field)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Declaration of one input or output slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    pub name: String,
    pub shape: Vec<Dim>,
    pub dtype: DType,
    /// `None` means the slot carries values at full precision.
    pub quantization: Option<QuantParams>,
    pub direction: Direction,
}

impl TensorSpec {
    pub fn input(name: impl Into<String>, shape: Vec<Dim>, dtype: DType) -> Self {
        TensorSpec {
            name: name.into(),
            shape,
            dtype,
            quantization: None,
            direction: Direction::Input,
        }
    }

    pub fn output(name: impl Into<String>, shape: Vec<Dim>, dtype: DType) -> Self {
        TensorSpec {
            direction: Direction::Output,
            ..TensorSpec::input(name, shape, dtype)
        }
    }

    pub fn with_quantization(mut self, params: QuantParams) -> Self {
        self.quantization = Some(params);
        self
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn is_dynamic(&self) -> bool {
        self.shape.iter().any(|d| *d == Dim::Dynamic)
    }

    /// Read slot `index` of `direction` from a metadata table.
    fn from_metadata(meta: &MetaTable, direction: Direction, index: usize) -> Result<TensorSpec> {
        let name = meta.get_string(&direction.slot_key(index, "name"))?.to_string();

        let shape = meta
            .get_i64_array(&direction.slot_key(index, "shape"))?
            .into_iter()
            .map(|d| {
                Dim::from_signed(d).ok_or_else(|| ModelError::InvalidDimension {
                    name: name.clone(),
                    dim: d,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let type_id = meta.get_u32(&direction.slot_key(index, "dtype"))?;
        let dtype = DType::from_type_id(type_id).ok_or_else(|| ModelError::UnsupportedElementType {
            name: name.clone(),
            id: type_id,
        })?;

        let quantization = read_quantization(meta, direction, index, &name)?;

        Ok(TensorSpec {
            name,
            shape,
            dtype,
            quantization,
            direction,
        })
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, format_dims(&self.shape), self.dtype)?;
        if let Some(q) = &self.quantization {
            write!(f, " ({})", q)?;
        }
        Ok(())
    }
}

fn read_quantization(
    meta: &MetaTable,
    direction: Direction,
    index: usize,
    name: &str,
) -> Result<Option<QuantParams>> {
    let scale_key = direction.slot_key(index, "quant.scale");
    let zp_key = direction.slot_key(index, "quant.zero_point");

    if !meta.contains(&scale_key) {
        if meta.contains(&zp_key) {
            return Err(ModelError::InvalidQuantization {
                name: name.to_string(),
                reason: "zero point given without a scale".to_string(),
            });
        }
        return Ok(None);
    }

    let scale = meta.get_f64(&scale_key)?;
    let zero_point = if meta.contains(&zp_key) {
        meta.get_i64(&zp_key)?
    } else {
        0
    };

    let params = QuantParams::from_pair(scale, zero_point).map_err(|e| ModelError::InvalidQuantization {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    if params.is_none() {
        tracing::debug!("slot '{}' declares (0, 0) quantization, treating as unquantized", name);
    }
    Ok(params)
}

/// Immutable description of a model's input and output slots.
///
/// Slot order is the canonical order used for positional binding and for
/// returned outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
}

impl ModelMetadata {
    /// Build metadata from slot lists, validating them.
    ///
    /// # Errors
    /// Fails if either list is empty, if a slot sits in the wrong list, or if
    /// two slots of the same direction share a name.
    pub fn new(inputs: Vec<TensorSpec>, outputs: Vec<TensorSpec>) -> Result<Self> {
        validate(&inputs, Direction::Input)?;
        validate(&outputs, Direction::Output)?;
        Ok(ModelMetadata { inputs, outputs })
    }

    /// Extract slot metadata from a parsed blob.
    pub fn from_blob(blob: &ModelBlob) -> Result<Self> {
        let inputs = read_slots(&blob.metadata, Direction::Input)?;
        let outputs = read_slots(&blob.metadata, Direction::Output)?;
        let metadata = ModelMetadata::new(inputs, outputs)?;
        tracing::info!(
            "loaded model metadata: {} inputs, {} outputs, {} weights",
            metadata.inputs.len(),
            metadata.outputs.len(),
            blob.weights.len()
        );
        Ok(metadata)
    }

    pub fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }

    /// Position of the input slot with exactly this name.
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|s| s.name == name)
    }

    /// Position of the output slot with exactly this name.
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|s| s.name == name)
    }

    /// Multi-line, human readable slot table.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for spec in self.inputs.iter().chain(&self.outputs) {
            out.push_str(&format!("{:<6} {}\n", spec.direction, spec));
        }
        out
    }
}

fn read_slots(meta: &MetaTable, direction: Direction) -> Result<Vec<TensorSpec>> {
    let count = meta.get_u32(&direction.count_key())? as usize;
    (0..count)
        .map(|i| TensorSpec::from_metadata(meta, direction, i))
        .collect()
}

fn validate(slots: &[TensorSpec], direction: Direction) -> Result<()> {
    if slots.is_empty() {
        return Err(ModelError::NoTensorMetadata(direction.to_string()));
    }
    let mut seen = HashSet::new();
    for slot in slots {
        if slot.direction != direction {
            return Err(ModelError::Other(format!(
                "slot '{}' is declared as {} but listed among {}s",
                slot.name, slot.direction, direction
            )));
        }
        if !seen.insert(slot.name.as_str()) {
            return Err(ModelError::DuplicateSlot {
                direction: direction.to_string(),
                name: slot.name.clone(),
            });
        }
    }
    Ok(())
}

/// Parse a model blob and return its slot metadata, shared for reuse by
/// any number of runners.
pub fn load(bytes: &[u8]) -> Result<Arc<ModelMetadata>> {
    let blob = ModelBlob::from_bytes(bytes.to_vec())?;
    Ok(Arc::new(ModelMetadata::from_blob(&blob)?))
}
