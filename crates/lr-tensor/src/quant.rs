//! Affine quantization codec.
//!
//! A real value `r` is carried as a stored value `q` with
//! `q = round(r / scale) + zero_point` and recovered as
//! `r = (q - zero_point) * scale`. Rounding is half-to-even and the stored
//! value is clamped to the target element type's range.
//!
//! The bulk functions operate on whole storages and are defined as a map of
//! the scalar functions, so they agree with element-wise application bit for
//! bit.

use std::fmt;

use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::storage::CpuStorage;
use crate::tensor::Tensor;

/// Scale and zero point of an affinely quantized slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    pub scale: f64,
    pub zero_point: i64,
}

impl QuantParams {
    /// Validated constructor: `scale` must be finite and strictly positive.
    pub fn new(scale: f64, zero_point: i64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TensorError::InvalidScale(scale));
        }
        Ok(QuantParams { scale, zero_point })
    }

    /// Interpret a raw `(scale, zero_point)` pair where `(0, 0)` means
    /// "not quantized".
    pub fn from_pair(scale: f64, zero_point: i64) -> Result<Option<Self>> {
        if scale == 0.0 && zero_point == 0 {
            return Ok(None);
        }
        QuantParams::new(scale, zero_point).map(Some)
    }
}

impl fmt::Display for QuantParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scale={} zero_point={}", self.scale, self.zero_point)
    }
}

/// Quantize one real value for storage as `dtype`.
///
/// The result is integral and lies within `dtype.value_range()`. NaN maps
/// to the zero point.
pub fn quantize_value(real: f64, params: &QuantParams, dtype: DType) -> f64 {
    let (lo, hi) = dtype.value_range();
    let zp = params.zero_point as f64;
    if real.is_nan() {
        return zp.clamp(lo, hi);
    }
    ((real / params.scale).round_ties_even() + zp).clamp(lo, hi)
}

/// Recover the real value of one stored element. Computed in `f64`.
pub fn dequantize_value(stored: f64, params: &QuantParams) -> f32 {
    ((stored - params.zero_point as f64) * params.scale) as f32
}

/// Quantize a sequence of real values into new storage of `dtype`.
///
/// With `params == None` this is a plain element-type conversion.
pub fn quantize(values: &[f32], params: Option<&QuantParams>, dtype: DType) -> CpuStorage {
    let reals: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    CpuStorage::from_f64_slice(dtype, &encode(&reals, params, dtype))
}

/// Dequantize a storage into real values.
///
/// With `params == None` the stored values are returned converted to `f32`.
pub fn dequantize(stored: &CpuStorage, params: Option<&QuantParams>) -> Vec<f32> {
    match params {
        Some(p) => stored
            .to_f64_vec()
            .into_iter()
            .map(|q| dequantize_value(q, p))
            .collect(),
        None => stored.to_f32_vec(),
    }
}

/// Encode `src` into the already-allocated `dst`, keeping `dst`'s dtype and
/// allocation.
///
/// Unquantized data of the same dtype is copied verbatim; anything else is
/// routed through `f64`, quantized when `params` is present and converted.
pub fn quantize_into(src: &Tensor, params: Option<&QuantParams>, dst: &mut CpuStorage) -> Result<()> {
    if params.is_none() && src.dtype() == dst.dtype() {
        return dst.copy_from(src.storage());
    }
    let encoded = encode(&src.storage().to_f64_vec(), params, dst.dtype());
    dst.store_f64(&encoded)
}

/// Dequantize a raw output tensor into an `f32` tensor of the same shape.
/// Without `params` the tensor is returned unchanged.
pub fn dequantize_tensor(raw: Tensor, params: Option<&QuantParams>) -> Tensor {
    match params {
        Some(p) => {
            let data = dequantize(raw.storage(), Some(p));
            Tensor::new(data, raw.shape().clone())
        }
        None => raw,
    }
}

fn encode(reals: &[f64], params: Option<&QuantParams>, dtype: DType) -> Vec<f64> {
    match params {
        Some(p) => reals.iter().map(|&r| quantize_value(r, p, dtype)).collect(),
        None => reals.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use approx::assert_relative_eq;

    fn params(scale: f64, zero_point: i64) -> QuantParams {
        QuantParams::new(scale, zero_point).unwrap()
    }

    #[test]
    fn test_quantize_value_basic() {
        let p = params(0.5, 10);
        assert_eq!(quantize_value(5.0, &p, DType::U8), 20.0);
        assert_eq!(quantize_value(-5.0, &p, DType::U8), 0.0);
        assert_eq!(quantize_value(-5.0, &p, DType::I8), 0.0);
        assert_eq!(quantize_value(-6.0, &p, DType::I8), -2.0);
    }

    #[test]
    fn test_quantize_value_clamps() {
        let p = params(0.1, 0);
        assert_eq!(quantize_value(1000.0, &p, DType::U8), 255.0);
        assert_eq!(quantize_value(-1000.0, &p, DType::U8), 0.0);
        assert_eq!(quantize_value(1000.0, &p, DType::I8), 127.0);
        assert_eq!(quantize_value(-1000.0, &p, DType::I8), -128.0);
    }

    #[test]
    fn test_quantize_value_rounds_half_to_even() {
        let p = params(1.0, 0);
        assert_eq!(quantize_value(2.5, &p, DType::I32), 2.0);
        assert_eq!(quantize_value(3.5, &p, DType::I32), 4.0);
        assert_eq!(quantize_value(-2.5, &p, DType::I32), -2.0);
    }

    #[test]
    fn test_quantize_value_nan() {
        let p = params(0.5, 7);
        assert_eq!(quantize_value(f64::NAN, &p, DType::U8), 7.0);
    }

    #[test]
    fn test_dequantize_value() {
        let p = params(0.5, 10);
        assert_eq!(dequantize_value(20.0, &p), 5.0);
        assert_eq!(dequantize_value(0.0, &p), -5.0);
    }

    #[test]
    fn test_roundtrip_u8_within_one_unit() {
        for &(scale, zp) in &[(0.5, 10), (0.007843, 128), (1.0 / 255.0, 0), (3.25, 255)] {
            let p = params(scale, zp);
            for v in 0..=255u8 {
                let real = dequantize_value(v as f64, &p);
                let back = quantize_value(real as f64, &p, DType::U8);
                assert!(
                    (back - v as f64).abs() <= 1.0,
                    "v={} scale={} zp={} back={}",
                    v,
                    scale,
                    zp,
                    back
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_i8_within_one_unit() {
        let p = params(0.0123, -3);
        for v in i8::MIN..=i8::MAX {
            let real = dequantize_value(v as f64, &p);
            let back = quantize_value(real as f64, &p, DType::I8);
            assert!((back - v as f64).abs() <= 1.0);
        }
    }

    #[test]
    fn test_bulk_matches_scalar() {
        let p = params(0.37, 3);
        let values: Vec<f32> = (-40..40).map(|i| i as f32 * 0.173).collect();
        let bulk = quantize(&values, Some(&p), DType::I8);
        let scalar: Vec<f64> = values
            .iter()
            .map(|&v| quantize_value(v as f64, &p, DType::I8))
            .collect();
        assert_eq!(bulk.to_f64_vec(), scalar);

        let real = dequantize(&bulk, Some(&p));
        let scalar_real: Vec<f32> = scalar.iter().map(|&q| dequantize_value(q, &p)).collect();
        assert_eq!(
            real.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
            scalar_real.iter().map(|x| x.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_identity_without_params() {
        let values = vec![1.0f32, -2.5, 3.75];
        let stored = quantize(&values, None, DType::F32);
        assert_eq!(stored.as_f32_slice().unwrap(), values.as_slice());
        assert_eq!(dequantize(&stored, None), values);

        let bytes = CpuStorage::U8(vec![3, 200]);
        assert_eq!(dequantize(&bytes, None), vec![3.0, 200.0]);
    }

    #[test]
    fn test_quantize_into_reuses_storage() {
        let p = params(0.5, 10);
        let src = Tensor::new(vec![5.0; 4], Shape::new(vec![1, 2, 2, 1]));
        let mut dst = CpuStorage::zeros(DType::U8, 4);
        let ptr = dst.data_ptr();
        quantize_into(&src, Some(&p), &mut dst).unwrap();
        assert_eq!(dst.as_u8_slice().unwrap(), &[20, 20, 20, 20]);
        assert_eq!(dst.data_ptr(), ptr);
    }

    #[test]
    fn test_quantize_into_same_dtype_copies_verbatim() {
        let src = Tensor::from_vec(vec![i64::MAX, -1], Shape::new(vec![2])).unwrap();
        let mut dst = CpuStorage::zeros(DType::I64, 2);
        quantize_into(&src, None, &mut dst).unwrap();
        assert_eq!(dst, CpuStorage::I64(vec![i64::MAX, -1]));
    }

    #[test]
    fn test_dequantize_tensor() {
        let p = params(0.25, 2);
        let raw = Tensor::from_vec(vec![2u8, 6], Shape::new(vec![2])).unwrap();
        let out = dequantize_tensor(raw, Some(&p));
        assert_eq!(out.dtype(), DType::F32);
        assert_relative_eq!(out.data_f32().unwrap()[1], 1.0);
        assert_eq!(out.shape().dims(), &[2]);
    }

    #[test]
    fn test_params_validation() {
        assert!(QuantParams::new(0.0, 5).is_err());
        assert!(QuantParams::new(-1.0, 0).is_err());
        assert!(QuantParams::new(f64::NAN, 0).is_err());
        assert_eq!(QuantParams::from_pair(0.0, 0).unwrap(), None);
        assert!(QuantParams::from_pair(0.0, 3).is_err());
        assert_eq!(
            QuantParams::from_pair(0.5, 10).unwrap(),
            Some(QuantParams { scale: 0.5, zero_point: 10 })
        );
    }
}
