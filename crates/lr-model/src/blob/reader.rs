use std::io::Cursor;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use lr_tensor::{CpuStorage, Tensor};

use crate::error::{ModelError, Result};

use super::header::{align_up, BlobHeader};
use super::metadata::MetaTable;
use super::weights::{self, WeightInfo};

/// Backing bytes of a parsed blob.
enum BlobBytes {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for BlobBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            BlobBytes::Owned(v) => v,
            BlobBytes::Mapped(m) => m,
        }
    }
}

/// A parsed model blob.
///
/// The header, metadata table and weight table are decoded eagerly; weight
/// data stays in the backing bytes (owned or memory-mapped) and is sliced on
/// demand.
pub struct ModelBlob {
    /// Parsed header (version, weight/KV counts).
    pub header: BlobHeader,
    /// Parsed metadata key-value entries.
    pub metadata: MetaTable,
    /// Parsed weight table entries (name, shape, dtype, offset).
    pub weights: Vec<WeightInfo>,
    bytes: BlobBytes,
    /// Byte offset where the data section begins (aligned).
    data_offset: usize,
}

impl ModelBlob {
    /// Parse a blob held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<ModelBlob> {
        ModelBlob::parse(BlobBytes::Owned(bytes))
    }

    /// Open a blob on disk and memory-map it read-only.
    pub fn open(path: &Path) -> Result<ModelBlob> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and lives as long as the blob; the
        // file must not be truncated by another process while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        ModelBlob::parse(BlobBytes::Mapped(mmap))
    }

    fn parse(bytes: BlobBytes) -> Result<ModelBlob> {
        let mut reader = Cursor::new(&bytes[..]);

        let header = BlobHeader::parse(&mut reader)?;
        let metadata = MetaTable::parse_kv(&mut reader, header.n_kv)?;
        let weights = weights::parse_weight_infos(&mut reader, header.n_weights)?;

        let data_offset = align_up(reader.position() as usize);

        let blob = ModelBlob {
            header,
            metadata,
            weights,
            bytes,
            data_offset,
        };
        for info in &blob.weights {
            blob.weight_data(info)?;
        }
        Ok(blob)
    }

    /// Total size of the blob in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Look up a weight table entry by name.
    pub fn weight_info(&self, name: &str) -> Result<&WeightInfo> {
        self.weights
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| ModelError::WeightNotFound(name.to_string()))
    }

    /// Raw little-endian bytes of a weight tensor.
    pub fn weight_data(&self, info: &WeightInfo) -> Result<&[u8]> {
        let size = info.data_size()?;
        let start = usize::try_from(info.offset)
            .ok()
            .and_then(|o| self.data_offset.checked_add(o));
        let end = start.and_then(|s| s.checked_add(size));
        match (start, end) {
            (Some(start), Some(end)) if end <= self.bytes.len() => Ok(&self.bytes[start..end]),
            _ => Err(ModelError::Truncated {
                name: info.name.clone(),
            }),
        }
    }

    /// Decode a weight tensor by name into its stored element type.
    pub fn weight_tensor(&self, name: &str) -> Result<Tensor> {
        let info = self.weight_info(name)?;
        let storage = CpuStorage::from_le_bytes(info.dtype, self.weight_data(info)?)?;
        Ok(Tensor::from_storage(storage, info.shape()?)?)
    }
}

impl std::fmt::Debug for ModelBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBlob")
            .field("header", &self.header)
            .field("n_metadata", &self.metadata.entries.len())
            .field("weights", &self.weights)
            .field("len", &self.bytes.len())
            .finish()
    }
}
