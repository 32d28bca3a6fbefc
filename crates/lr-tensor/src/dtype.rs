use std::fmt;

/// Element types a tensor slot can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point.
    F32,
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    /// Unsigned 8-bit integer, the usual storage for quantized image inputs.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
}

impl DType {
    /// All supported element types, in type-id order.
    pub const ALL: [DType; 8] = [
        DType::F32,
        DType::F16,
        DType::U8,
        DType::I8,
        DType::U16,
        DType::I16,
        DType::I32,
        DType::I64,
    ];

    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::F16 | DType::U16 | DType::I16 => 2,
            DType::F32 | DType::I32 => 4,
            DType::I64 => 8,
        }
    }

    /// Converts a model blob element type id to a `DType`.
    ///
    /// Type ids:
    /// - 0 => F32
    /// - 1 => F16
    /// - 2 => U8
    /// - 3 => I8
    /// - 4 => U16
    /// - 5 => I16
    /// - 6 => I32
    /// - 7 => I64
    pub fn from_type_id(id: u32) -> Option<DType> {
        DType::ALL.get(id as usize).copied()
    }

    /// Returns the model blob element type id for this `DType`.
    pub fn type_id(&self) -> u32 {
        match self {
            DType::F32 => 0,
            DType::F16 => 1,
            DType::U8 => 2,
            DType::I8 => 3,
            DType::U16 => 4,
            DType::I16 => 5,
            DType::I32 => 6,
            DType::I64 => 7,
        }
    }

    /// Representable value range as `(min, max)` in `f64`.
    ///
    /// For `I64` the bounds are the nearest `f64` values, which is what a
    /// saturating float-to-int cast clamps to anyway.
    pub fn value_range(&self) -> (f64, f64) {
        match self {
            DType::F32 => (f32::MIN as f64, f32::MAX as f64),
            DType::F16 => (half::f16::MIN.to_f64(), half::f16::MAX.to_f64()),
            DType::U8 => (u8::MIN as f64, u8::MAX as f64),
            DType::I8 => (i8::MIN as f64, i8::MAX as f64),
            DType::U16 => (u16::MIN as f64, u16::MAX as f64),
            DType::I16 => (i16::MIN as f64, i16::MAX as f64),
            DType::I32 => (i32::MIN as f64, i32::MAX as f64),
            DType::I64 => (i64::MIN as f64, i64::MAX as f64),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "float32",
            DType::F16 => "float16",
            DType::U8 => "uint8",
            DType::I8 => "int8",
            DType::U16 => "uint16",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
        };
        f.write_str(name)
    }
}
