use std::path::Path;

use lr_tensor::Tensor;

use crate::error::Result;
use crate::registry::{Direction, TensorSpec};

use super::header::{align_up, write_string, BlobHeader, BLOB_VERSION};
use super::metadata::MetaValue;
use super::weights::WeightInfo;

/// Builds a model blob from slot declarations, extra metadata and weights.
///
/// Slot keys are generated first and extra metadata after them; an extra
/// entry with the same key as a generated one replaces it.
#[derive(Debug, Default)]
pub struct BlobWriter {
    slots: Vec<TensorSpec>,
    metadata: Vec<(String, MetaValue)>,
    weights: Vec<(String, Tensor)>,
}

impl BlobWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a slot. Its direction decides which list it joins; order of
    /// calls is the declared order.
    pub fn with_slot(mut self, spec: TensorSpec) -> Self {
        self.slots.push(spec);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: MetaValue) -> Self {
        self.metadata.push((key.into(), value));
        self
    }

    pub fn with_weight(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.weights.push((name.into(), tensor));
        self
    }

    fn metadata_entries(&self) -> Vec<(String, MetaValue)> {
        let mut entries: Vec<(String, MetaValue)> = Vec::new();
        for direction in [Direction::Input, Direction::Output] {
            let slots: Vec<&TensorSpec> = self.slots.iter().filter(|s| s.direction == direction).collect();
            entries.push((direction.count_key(), MetaValue::U32(slots.len() as u32)));
            for (i, spec) in slots.into_iter().enumerate() {
                entries.extend(slot_entries(direction, i, spec));
            }
        }
        for (key, value) in &self.metadata {
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.clone(),
                None => entries.push((key.clone(), value.clone())),
            }
        }
        entries
    }

    /// Serialize the blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let entries = self.metadata_entries();

        let mut infos = Vec::with_capacity(self.weights.len());
        let mut data = Vec::new();
        for (name, tensor) in &self.weights {
            let offset = align_up(data.len());
            data.resize(offset, 0);
            data.extend_from_slice(&tensor.storage().to_le_bytes());
            infos.push(WeightInfo {
                name: name.clone(),
                dims: tensor.shape().dims().iter().map(|&d| d as u64).collect(),
                dtype: tensor.dtype(),
                offset: offset as u64,
            });
        }

        let mut bytes = Vec::new();
        BlobHeader {
            version: BLOB_VERSION,
            n_weights: infos.len() as u64,
            n_kv: entries.len() as u64,
        }
        .write(&mut bytes)?;
        for (key, value) in &entries {
            write_string(&mut bytes, key)?;
            bytes.extend_from_slice(&value.type_id().to_le_bytes());
            value.write_payload(&mut bytes)?;
        }
        for info in &infos {
            info.write(&mut bytes)?;
        }
        let data_offset = align_up(bytes.len());
        bytes.resize(data_offset, 0);
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Serialize the blob to a file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn slot_entries(direction: Direction, index: usize, spec: &TensorSpec) -> Vec<(String, MetaValue)> {
    let mut entries = vec![
        (direction.slot_key(index, "name"), MetaValue::String(spec.name.clone())),
        (
            direction.slot_key(index, "shape"),
            MetaValue::Array(spec.shape.iter().map(|d| MetaValue::I64(d.to_signed())).collect()),
        ),
        (direction.slot_key(index, "dtype"), MetaValue::U32(spec.dtype.type_id())),
    ];
    if let Some(q) = &spec.quantization {
        entries.push((direction.slot_key(index, "quant.scale"), MetaValue::F64(q.scale)));
        entries.push((direction.slot_key(index, "quant.zero_point"), MetaValue::I64(q.zero_point)));
    }
    entries
}
