use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::{CpuStorage, TensorElement};

/// Row-major tensor data of any supported element type plus its shape.
///
/// Caller inputs and primitive outputs are both carried as `Tensor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// An `f32` tensor.
    ///
    /// # Panics
    /// If `data` does not hold exactly `shape.numel()` values.
    pub fn new(data: Vec<f32>, shape: Shape) -> Self {
        assert_eq!(data.len(), shape.numel(), "{} values cannot fill shape {}", data.len(), shape);
        Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
        }
    }

    /// Create a tensor of any element type from a vector and a shape.
    pub fn from_vec<T: TensorElement>(data: Vec<T>, shape: Shape) -> Result<Self> {
        Tensor::from_storage(T::into_storage(data), shape)
    }

    /// Wrap existing storage, checking that its length matches the shape.
    pub fn from_storage(storage: CpuStorage, shape: Shape) -> Result<Self> {
        if storage.len() != shape.numel() {
            return Err(TensorError::LengthMismatch {
                shape: shape.dims().to_vec(),
                expected: shape.numel(),
                got: storage.len(),
            });
        }
        Ok(Tensor { storage, shape })
    }

    /// Create a zero-filled tensor of `dtype` with the given shape.
    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        Tensor {
            storage: CpuStorage::zeros(dtype, shape.numel()),
            shape,
        }
    }

    /// Create an f32 tensor with every element set to `value`.
    pub fn full(value: f32, shape: Shape) -> Self {
        let n = shape.numel();
        Tensor::new(vec![value; n], shape)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Borrow the values of an `f32` tensor.
    pub fn data_f32(&self) -> Result<&[f32]> {
        self.storage.as_f32_slice()
    }

    /// Copies the elements out as `f32`, converting from the stored type.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.storage.to_f32_vec()
    }

    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_tensor() {
        let t = Tensor::new(vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5], Shape::new(vec![3, 2]));
        assert_eq!(t.shape().dims(), &[3, 2]);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.numel(), 6);
        assert_eq!(t.data_f32().unwrap()[5], 5.5);
    }

    #[test]
    #[should_panic]
    fn test_f32_tensor_wrong_length() {
        Tensor::new(vec![0.0; 2], Shape::new(vec![1, 3]));
    }

    #[test]
    fn test_from_vec_u8() {
        let t = Tensor::from_vec(vec![1u8, 2, 3, 4], Shape::new(vec![2, 2])).unwrap();
        assert_eq!(t.dtype(), DType::U8);
        assert!(t.data_f32().is_err());
        assert_eq!(t.to_f32_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let err = Tensor::from_vec(vec![1i32, 2], Shape::new(vec![3])).unwrap_err();
        assert!(matches!(err, TensorError::LengthMismatch { expected: 3, got: 2, .. }));
    }

    #[test]
    fn test_zeros_and_full() {
        let z = Tensor::zeros(DType::I16, Shape::new(vec![2, 3]));
        assert_eq!(z.dtype(), DType::I16);
        assert_eq!(z.to_f32_vec(), vec![0.0; 6]);

        let f = Tensor::full(5.0, Shape::new(vec![4]));
        assert_eq!(f.data_f32().unwrap(), &[5.0; 4]);
    }
}
