use std::io::{Read, Write};

use crate::error::{ModelError, Result};

/// The four-byte magic number identifying a model blob: ASCII "LRTM".
pub const BLOB_MAGIC: [u8; 4] = *b"LRTM";

/// The only container version this crate reads and writes.
pub const BLOB_VERSION: u32 = 1;

/// Alignment (in bytes) of the weight data section.
pub const BLOB_ALIGNMENT: usize = 32;

/// Parsed model blob header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHeader {
    pub version: u32,
    /// Number of weight tensors in the weight table.
    pub n_weights: u64,
    /// Number of key-value metadata entries.
    pub n_kv: u64,
}

impl BlobHeader {
    /// Parse a header from the beginning of a reader.
    ///
    /// Layout: 4-byte magic, version (u32 LE), weight count (u64 LE),
    /// KV count (u64 LE).
    pub fn parse(reader: &mut impl Read) -> Result<BlobHeader> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != BLOB_MAGIC {
            return Err(ModelError::InvalidMagic(magic));
        }

        let version = read_u32(reader)?;
        if version != BLOB_VERSION {
            return Err(ModelError::UnsupportedVersion(version));
        }

        let n_weights = read_u64(reader)?;
        let n_kv = read_u64(reader)?;

        Ok(BlobHeader {
            version,
            n_weights,
            n_kv,
        })
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&BLOB_MAGIC)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.n_weights.to_le_bytes())?;
        writer.write_all(&self.n_kv.to_le_bytes())?;
        Ok(())
    }
}

pub(crate) fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64(reader: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a length-prefixed string: u64 length followed by that many UTF-8 bytes.
///
/// The length is not trusted for preallocation; a short read is an error.
pub(crate) fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = read_u64(reader)?;
    let mut buf = Vec::new();
    reader.take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(ModelError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }
    String::from_utf8(buf).map_err(|e| ModelError::Other(format!("invalid UTF-8 in string: {}", e)))
}

pub(crate) fn write_string(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(&(s.len() as u64).to_le_bytes())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

/// Round `pos` up to the next multiple of [`BLOB_ALIGNMENT`].
pub fn align_up(pos: usize) -> usize {
    (pos + BLOB_ALIGNMENT - 1) & !(BLOB_ALIGNMENT - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let header = BlobHeader {
            version: BLOB_VERSION,
            n_weights: 3,
            n_kv: 9,
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 24);
        let parsed = BlobHeader::parse(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = b"GGUF".to_vec();
        bytes.extend_from_slice(&[0u8; 20]);
        let err = BlobHeader::parse(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidMagic(m) if &m == b"GGUF"));
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = BLOB_MAGIC.to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        let err = BlobHeader::parse(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = BLOB_MAGIC.to_vec();
        assert!(matches!(
            BlobHeader::parse(&mut Cursor::new(bytes)),
            Err(ModelError::Io(_))
        ));
    }

    #[test]
    fn test_string_length_past_end() {
        let mut bytes = (1u64 << 40).to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert!(read_string(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), 32);
        assert_eq!(align_up(32), 32);
        assert_eq!(align_up(33), 64);
    }
}
