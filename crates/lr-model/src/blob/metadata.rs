use std::collections::HashMap;
use std::io::{Read, Write};

use crate::error::{ModelError, Result};

use super::header::{read_string, read_u32, read_u64, write_string};

/// Preallocation cap for arrays whose length comes from untrusted input.
const MAX_PREALLOC: usize = 1024;

/// Deepest array-of-array nesting accepted when parsing.
const MAX_ARRAY_DEPTH: usize = 4;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Array(Vec<MetaValue>),
}

impl MetaValue {
    /// Returns a human-readable name for the variant (used in error messages).
    fn type_name(&self) -> &'static str {
        match self {
            MetaValue::U8(_) => "U8",
            MetaValue::I8(_) => "I8",
            MetaValue::U16(_) => "U16",
            MetaValue::I16(_) => "I16",
            MetaValue::U32(_) => "U32",
            MetaValue::I32(_) => "I32",
            MetaValue::U64(_) => "U64",
            MetaValue::I64(_) => "I64",
            MetaValue::F32(_) => "F32",
            MetaValue::F64(_) => "F64",
            MetaValue::Bool(_) => "Bool",
            MetaValue::String(_) => "String",
            MetaValue::Array(_) => "Array",
        }
    }

    /// Wire type id of this value.
    ///
    ///   0=U8, 1=I8, 2=U16, 3=I16, 4=U32, 5=I32, 6=F32, 7=Bool,
    ///   8=String, 9=Array, 10=U64, 11=I64, 12=F64
    pub fn type_id(&self) -> u32 {
        match self {
            MetaValue::U8(_) => 0,
            MetaValue::I8(_) => 1,
            MetaValue::U16(_) => 2,
            MetaValue::I16(_) => 3,
            MetaValue::U32(_) => 4,
            MetaValue::I32(_) => 5,
            MetaValue::F32(_) => 6,
            MetaValue::Bool(_) => 7,
            MetaValue::String(_) => 8,
            MetaValue::Array(_) => 9,
            MetaValue::U64(_) => 10,
            MetaValue::I64(_) => 11,
            MetaValue::F64(_) => 12,
        }
    }

    /// Write the payload (without key or type id).
    ///
    /// Arrays take their element type from the first element; an empty
    /// array is written with element type U8.
    pub fn write_payload(&self, writer: &mut impl Write) -> Result<()> {
        match self {
            MetaValue::U8(v) => writer.write_all(&[*v])?,
            MetaValue::I8(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::U16(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::I16(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::U32(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::I32(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::U64(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::I64(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::F32(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::F64(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::Bool(v) => writer.write_all(&[*v as u8])?,
            MetaValue::String(s) => write_string(writer, s)?,
            MetaValue::Array(items) => {
                let elem_type = items.first().map(|v| v.type_id()).unwrap_or(0);
                if let Some(bad) = items.iter().find(|v| v.type_id() != elem_type) {
                    return Err(ModelError::Other(format!(
                        "heterogeneous array element {}",
                        bad.type_name()
                    )));
                }
                writer.write_all(&elem_type.to_le_bytes())?;
                writer.write_all(&(items.len() as u64).to_le_bytes())?;
                for item in items {
                    item.write_payload(writer)?;
                }
            }
        }
        Ok(())
    }
}

/// Collection of metadata key-value pairs.
#[derive(Debug, Clone, Default)]
pub struct MetaTable {
    pub entries: HashMap<String, MetaValue>,
}

impl MetaTable {
    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Result<&MetaValue> {
        self.entries
            .get(key)
            .ok_or_else(|| ModelError::MissingKey(key.to_string()))
    }

    /// Retrieve a string value by key.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            MetaValue::String(s) => Ok(s.as_str()),
            other => Err(mismatch(key, "String", other)),
        }
    }

    /// Retrieve a u32 value by key.
    pub fn get_u32(&self, key: &str) -> Result<u32> {
        match self.get(key)? {
            MetaValue::U32(v) => Ok(*v),
            other => Err(mismatch(key, "U32", other)),
        }
    }

    /// Retrieve an i64 value by key.
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            MetaValue::I64(v) => Ok(*v),
            other => Err(mismatch(key, "I64", other)),
        }
    }

    /// Retrieve an f64 value by key.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        match self.get(key)? {
            MetaValue::F64(v) => Ok(*v),
            other => Err(mismatch(key, "F64", other)),
        }
    }

    /// Retrieve an i64 array value by key.
    pub fn get_i64_array(&self, key: &str) -> Result<Vec<i64>> {
        match self.get(key)? {
            MetaValue::Array(arr) => arr
                .iter()
                .enumerate()
                .map(|(i, v)| match v {
                    MetaValue::I64(d) => Ok(*d),
                    other => Err(mismatch(&format!("{}[{}]", key, i), "I64", other)),
                })
                .collect(),
            other => Err(mismatch(key, "Array", other)),
        }
    }

    /// Parse `n_kv` key-value metadata entries from a reader.
    ///
    /// Each entry consists of:
    /// 1. A length-prefixed string key.
    /// 2. A u32 value type ID.
    /// 3. The value payload, whose format depends on the type ID.
    pub fn parse_kv(reader: &mut impl Read, n_kv: u64) -> Result<MetaTable> {
        let mut entries = HashMap::new();
        for _ in 0..n_kv {
            let key = read_string(reader)?;
            let type_id = read_u32(reader)?;
            let value = read_value(reader, type_id, 0)?;
            entries.insert(key, value);
        }
        Ok(MetaTable { entries })
    }
}

fn mismatch(key: &str, expected: &str, got: &MetaValue) -> ModelError {
    ModelError::TypeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

fn read_array<const N: usize>(reader: &mut impl Read) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a single metadata value given its type ID. `depth` counts the
/// enclosing arrays.
fn read_value(reader: &mut impl Read, type_id: u32, depth: usize) -> Result<MetaValue> {
    let value = match type_id {
        0 => MetaValue::U8(read_array::<1>(reader)?[0]),
        1 => MetaValue::I8(i8::from_le_bytes(read_array(reader)?)),
        2 => MetaValue::U16(u16::from_le_bytes(read_array(reader)?)),
        3 => MetaValue::I16(i16::from_le_bytes(read_array(reader)?)),
        4 => MetaValue::U32(u32::from_le_bytes(read_array(reader)?)),
        5 => MetaValue::I32(i32::from_le_bytes(read_array(reader)?)),
        6 => MetaValue::F32(f32::from_le_bytes(read_array(reader)?)),
        7 => MetaValue::Bool(read_array::<1>(reader)?[0] != 0),
        8 => MetaValue::String(read_string(reader)?),
        9 => {
            // Array: u32 element_type, u64 count, then count values of element_type
            if depth >= MAX_ARRAY_DEPTH {
                return Err(ModelError::Other(format!(
                    "metadata arrays nested deeper than {}",
                    MAX_ARRAY_DEPTH
                )));
            }
            let elem_type = read_u32(reader)?;
            let count = read_u64(reader)?;
            let mut values = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
            for _ in 0..count {
                values.push(read_value(reader, elem_type, depth + 1)?);
            }
            MetaValue::Array(values)
        }
        10 => MetaValue::U64(read_u64(reader)?),
        11 => MetaValue::I64(i64::from_le_bytes(read_array(reader)?)),
        12 => MetaValue::F64(f64::from_le_bytes(read_array(reader)?)),
        other => return Err(ModelError::UnsupportedValueType(other)),
    };
    Ok(value)
}
