use std::io::{Read, Write};

use lr_tensor::{DType, Shape};

use crate::error::{ModelError, Result};

use super::header::{read_string, read_u32, read_u64, write_string};

/// Describes one weight tensor stored in the blob's data section.
///
/// Weights are opaque to the runner; they are only located here so an
/// execution primitive can read them.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightInfo {
    /// Tensor name (e.g. "conv1.kernel").
    pub name: String,
    /// Size of each dimension.
    pub dims: Vec<u64>,
    /// Element type of the stored data.
    pub dtype: DType,
    /// Byte offset of this tensor's data from the start of the data section.
    pub offset: u64,
}

impl WeightInfo {
    /// Dimension sizes as `usize`.
    ///
    /// # Errors
    /// A dimension that does not fit in `usize`.
    pub fn shape(&self) -> Result<Shape> {
        self.dims
            .iter()
            .map(|&d| usize::try_from(d).map_err(|_| self.too_large()))
            .collect::<Result<Vec<_>>>()
            .map(Shape::new)
    }

    /// Total number of elements in this tensor.
    pub fn numel(&self) -> Result<usize> {
        self.shape()?
            .dims()
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| self.too_large())
    }

    /// Total byte size of this tensor's raw data.
    pub fn data_size(&self) -> Result<usize> {
        self.numel()?
            .checked_mul(self.dtype.size_in_bytes())
            .ok_or_else(|| self.too_large())
    }

    fn too_large(&self) -> ModelError {
        ModelError::Other(format!(
            "weight '{}' with dims {:?} is too large to address",
            self.name, self.dims
        ))
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        write_string(writer, &self.name)?;
        writer.write_all(&(self.dims.len() as u32).to_le_bytes())?;
        for d in &self.dims {
            writer.write_all(&d.to_le_bytes())?;
        }
        writer.write_all(&self.dtype.type_id().to_le_bytes())?;
        writer.write_all(&self.offset.to_le_bytes())?;
        Ok(())
    }
}

/// Parse `n_weights` weight table entries from a reader.
///
/// Each entry:
/// 1. length-prefixed name
/// 2. u32 rank
/// 3. rank x u64 dimension sizes
/// 4. u32 element type id (mapped via `DType::from_type_id`)
/// 5. u64 byte offset within the data section
pub fn parse_weight_infos(reader: &mut impl Read, n_weights: u64) -> Result<Vec<WeightInfo>> {
    let mut infos = Vec::new();
    for _ in 0..n_weights {
        let name = read_string(reader)?;

        let rank = read_u32(reader)?;
        let dims = (0..rank).map(|_| read_u64(reader)).collect::<Result<Vec<_>>>()?;

        let type_id = read_u32(reader)?;
        let dtype = DType::from_type_id(type_id).ok_or_else(|| ModelError::UnsupportedElementType {
            name: name.clone(),
            id: type_id,
        })?;

        let offset = read_u64(reader)?;

        infos.push(WeightInfo {
            name,
            dims,
            dtype,
            offset,
        });
    }
    Ok(infos)
}
