//! Runner-owned input buffers and shape negotiation.

use lr_model::TensorSpec;
use lr_tensor::shape::format_dims;
use lr_tensor::{CpuStorage, DType, Shape, Tensor};

use crate::error::{Result, RunnerError};

/// Backing storage for one input slot, in the slot's element type.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBuffer {
    shape: Shape,
    storage: CpuStorage,
}

impl TensorBuffer {
    /// Zero-filled buffer of `dtype` with the given shape.
    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        TensorBuffer {
            storage: CpuStorage::zeros(dtype, shape.numel()),
            shape,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut CpuStorage {
        &mut self.storage
    }

    /// Copy the buffer contents out as a tensor.
    pub fn to_tensor(&self) -> Result<Tensor> {
        Ok(Tensor::from_storage(self.storage.clone(), self.shape.clone())?)
    }

    /// Address of the underlying allocation.
    pub fn data_ptr(&self) -> *const u8 {
        self.storage.data_ptr()
    }
}

/// Check a concrete shape against a slot's declared shape.
///
/// Ranks must agree and every fixed dimension must match exactly.
pub fn check_shape(slot: &TensorSpec, requested: &Shape) -> Result<()> {
    let ok = slot.rank() == requested.ndim()
        && slot
            .shape
            .iter()
            .zip(requested.dims())
            .all(|(declared, &size)| declared.accepts(size));
    if ok {
        Ok(())
    } else {
        Err(RunnerError::ShapeMismatch {
            slot: slot.name.clone(),
            declared: format_dims(&slot.shape),
            got: requested.to_string(),
        })
    }
}

/// Allocation counters kept by a [`ShapeNegotiator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegotiationStats {
    /// Buffers created or replaced.
    pub allocations: u64,
    /// Negotiations satisfied by the existing buffer.
    pub reuses: u64,
}

/// Owns one lazily allocated buffer per input slot and reallocates it only
/// when the requested shape or element type changes.
#[derive(Debug)]
pub struct ShapeNegotiator {
    buffers: Vec<Option<TensorBuffer>>,
    reuse_buffers: bool,
    stats: NegotiationStats,
}

impl ShapeNegotiator {
    pub fn new(n_slots: usize, reuse_buffers: bool) -> Self {
        ShapeNegotiator {
            buffers: vec![None; n_slots],
            reuse_buffers,
            stats: NegotiationStats::default(),
        }
    }

    /// Ensure slot `index` has a buffer of `requested` shape in the slot's
    /// element type and return it.
    ///
    /// # Errors
    /// `ShapeMismatch` if the shape violates the declaration, in which case
    /// the existing buffer is left untouched. `SlotIndex` if `index` is not
    /// one of the negotiator's slots.
    pub fn negotiate(&mut self, index: usize, slot: &TensorSpec, requested: &Shape) -> Result<&mut TensorBuffer> {
        check_shape(slot, requested)?;
        let count = self.buffers.len();
        let entry = self
            .buffers
            .get_mut(index)
            .ok_or(RunnerError::SlotIndex { index, count })?;

        let reusable = self.reuse_buffers
            && matches!(entry, Some(b) if b.shape() == requested && b.dtype() == slot.dtype);
        if reusable {
            self.stats.reuses += 1;
        } else {
            tracing::debug!(
                "allocating buffer for slot '{}': {} {}",
                slot.name,
                requested,
                slot.dtype
            );
            *entry = None;
            self.stats.allocations += 1;
        }
        Ok(entry.get_or_insert_with(|| TensorBuffer::zeros(slot.dtype, requested.clone())))
    }

    /// Buffer of slot `index`, if one has been negotiated.
    pub fn buffer(&self, index: usize) -> Option<&TensorBuffer> {
        self.buffers.get(index).and_then(|b| b.as_ref())
    }

    /// All negotiated buffers in slot order.
    pub fn buffers(&self) -> Vec<&TensorBuffer> {
        self.buffers.iter().flatten().collect()
    }

    pub fn stats(&self) -> NegotiationStats {
        self.stats
    }
}
