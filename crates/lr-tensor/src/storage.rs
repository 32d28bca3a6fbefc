use half::f16;

use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// CPU-side tensor storage, one variant per element type.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    F32(Vec<f32>),
    F16(Vec<f16>),
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

/// A scalar type that can live in a [`CpuStorage`].
///
/// Conversions from `f64` saturate at the type bounds and truncate toward
/// zero, matching Rust's `as` casts; NaN becomes zero for integer types.
pub trait TensorElement: Copy + Send + Sync + 'static {
    const DTYPE: DType;

    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
    fn into_storage(data: Vec<Self>) -> CpuStorage;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl TensorElement for $ty {
            const DTYPE: DType = DType::$variant;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_f64(v: f64) -> Self {
                v as $ty
            }

            fn into_storage(data: Vec<Self>) -> CpuStorage {
                CpuStorage::$variant(data)
            }
        }
    };
}

impl_element!(f32, F32);
impl_element!(u8, U8);
impl_element!(i8, I8);
impl_element!(u16, U16);
impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);

impl TensorElement for f16 {
    const DTYPE: DType = DType::F16;

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    fn into_storage(data: Vec<Self>) -> CpuStorage {
        CpuStorage::F16(data)
    }
}

/// Expands `$body` once per variant with `$v` bound to the inner vector.
macro_rules! each_variant {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            CpuStorage::F32($v) => $body,
            CpuStorage::F16($v) => $body,
            CpuStorage::U8($v) => $body,
            CpuStorage::I8($v) => $body,
            CpuStorage::U16($v) => $body,
            CpuStorage::I16($v) => $body,
            CpuStorage::I32($v) => $body,
            CpuStorage::I64($v) => $body,
        }
    };
}

impl CpuStorage {
    /// Element count.
    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the active variant.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::F16(_) => DType::F16,
            CpuStorage::U8(_) => DType::U8,
            CpuStorage::I8(_) => DType::I8,
            CpuStorage::U16(_) => DType::U16,
            CpuStorage::I16(_) => DType::I16,
            CpuStorage::I32(_) => DType::I32,
            CpuStorage::I64(_) => DType::I64,
        }
    }

    /// `n` zeros of `dtype`.
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::F32 => CpuStorage::F32(vec![0.0; n]),
            DType::F16 => CpuStorage::F16(vec![f16::ZERO; n]),
            DType::U8 => CpuStorage::U8(vec![0; n]),
            DType::I8 => CpuStorage::I8(vec![0; n]),
            DType::U16 => CpuStorage::U16(vec![0; n]),
            DType::I16 => CpuStorage::I16(vec![0; n]),
            DType::I32 => CpuStorage::I32(vec![0; n]),
            DType::I64 => CpuStorage::I64(vec![0; n]),
        }
    }

    pub fn from_f32_vec(data: Vec<f32>) -> Self {
        CpuStorage::F32(data)
    }

    /// Create storage of `dtype` from `f64` values, converting each element.
    pub fn from_f64_slice(dtype: DType, values: &[f64]) -> Self {
        let mut storage = CpuStorage::zeros(dtype, values.len());
        each_variant!(&mut storage, v => store(v, values));
        storage
    }

    /// Borrow as `f32`; fails for any other element type.
    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        match self {
            CpuStorage::F32(v) => Ok(v.as_slice()),
            other => Err(dtype_mismatch(DType::F32, other.dtype())),
        }
    }

    /// Borrow as `u8`; fails for any other element type.
    pub fn as_u8_slice(&self) -> Result<&[u8]> {
        match self {
            CpuStorage::U8(v) => Ok(v.as_slice()),
            other => Err(dtype_mismatch(DType::U8, other.dtype())),
        }
    }

    /// Converts every element to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        each_variant!(self, v => v.iter().map(|x| x.to_f64()).collect())
    }

    /// Converts every element to `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            CpuStorage::F32(v) => v.clone(),
            CpuStorage::F16(v) => v.iter().map(|x| x.to_f32()).collect(),
            other => other.to_f64_vec().into_iter().map(|x| x as f32).collect(),
        }
    }

    /// Overwrite every element in place from `f64` values, converting to
    /// this storage's dtype. The allocation is kept.
    ///
    /// # Errors
    /// Returns an error if `values.len() != self.len()`.
    pub fn store_f64(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.len() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.len()],
                got: vec![values.len()],
            });
        }
        each_variant!(self, v => store(v, values));
        Ok(())
    }

    /// Overwrite every element in place from another storage of the same
    /// dtype and length. The allocation is kept.
    pub fn copy_from(&mut self, src: &CpuStorage) -> Result<()> {
        if src.len() != self.len() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.len()],
                got: vec![src.len()],
            });
        }
        match (self, src) {
            (CpuStorage::F32(d), CpuStorage::F32(s)) => d.copy_from_slice(s),
            (CpuStorage::F16(d), CpuStorage::F16(s)) => d.copy_from_slice(s),
            (CpuStorage::U8(d), CpuStorage::U8(s)) => d.copy_from_slice(s),
            (CpuStorage::I8(d), CpuStorage::I8(s)) => d.copy_from_slice(s),
            (CpuStorage::U16(d), CpuStorage::U16(s)) => d.copy_from_slice(s),
            (CpuStorage::I16(d), CpuStorage::I16(s)) => d.copy_from_slice(s),
            (CpuStorage::I32(d), CpuStorage::I32(s)) => d.copy_from_slice(s),
            (CpuStorage::I64(d), CpuStorage::I64(s)) => d.copy_from_slice(s),
            (d, s) => return Err(dtype_mismatch(d.dtype(), s.dtype())),
        }
        Ok(())
    }

    /// Address of the first element. Only meaningful for identity checks
    /// (e.g. asserting that a buffer was reused rather than reallocated).
    pub fn data_ptr(&self) -> *const u8 {
        each_variant!(self, v => v.as_ptr().cast::<u8>())
    }

    /// Decode little-endian raw bytes into storage of `dtype`.
    ///
    /// # Errors
    /// Returns an error if `bytes.len()` is not a multiple of the element size.
    pub fn from_le_bytes(dtype: DType, bytes: &[u8]) -> Result<Self> {
        let size = dtype.size_in_bytes();
        if bytes.len() % size != 0 {
            return Err(TensorError::ByteLength {
                dtype: dtype.to_string(),
                len: bytes.len(),
            });
        }
        let chunks = bytes.chunks_exact(size);
        let storage = match dtype {
            DType::F32 => CpuStorage::F32(
                chunks.map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect(),
            ),
            DType::F16 => CpuStorage::F16(chunks.map(|b| f16::from_le_bytes([b[0], b[1]])).collect()),
            DType::U8 => CpuStorage::U8(bytes.to_vec()),
            DType::I8 => CpuStorage::I8(bytes.iter().map(|&b| b as i8).collect()),
            DType::U16 => CpuStorage::U16(chunks.map(|b| u16::from_le_bytes([b[0], b[1]])).collect()),
            DType::I16 => CpuStorage::I16(chunks.map(|b| i16::from_le_bytes([b[0], b[1]])).collect()),
            DType::I32 => CpuStorage::I32(
                chunks.map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect(),
            ),
            DType::I64 => CpuStorage::I64(
                chunks
                    .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                    .collect(),
            ),
        };
        Ok(storage)
    }

    /// Encode the elements as little-endian raw bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        each_variant!(self, v => v.iter().flat_map(|x| x.to_le_bytes()).collect())
    }
}

fn store<T: TensorElement>(dst: &mut [T], values: &[f64]) {
    for (d, &v) in dst.iter_mut().zip(values) {
        *d = T::from_f64(v);
    }
}

fn dtype_mismatch(expected: DType, got: DType) -> TensorError {
    TensorError::DTypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    }
}
