use lr_model::TensorSpec;
use lr_tensor::quant::dequantize_tensor;
use lr_tensor::Tensor;

use crate::error::{Result, RunnerError};

/// Results of one invocation.
///
/// A model with exactly one output yields `Single`; any other count yields
/// `Many` in declared output order.
#[derive(Debug, Clone, PartialEq)]
pub enum Outputs {
    Single(Tensor),
    Many(Vec<Tensor>),
}

impl Outputs {
    pub fn len(&self) -> usize {
        match self {
            Outputs::Single(_) => 1,
            Outputs::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The lone output, or `None` for a multi-output result.
    pub fn into_single(self) -> Option<Tensor> {
        match self {
            Outputs::Single(t) => Some(t),
            Outputs::Many(_) => None,
        }
    }

    /// All outputs in declared order, regardless of count.
    pub fn into_vec(self) -> Vec<Tensor> {
        match self {
            Outputs::Single(t) => vec![t],
            Outputs::Many(v) => v,
        }
    }
}

/// Dequantize raw primitive outputs where declared and package them.
pub fn collect(slots: &[TensorSpec], raw: Vec<Tensor>) -> Result<Outputs> {
    if raw.len() != slots.len() {
        return Err(RunnerError::Execution(
            format!("primitive returned {} outputs, model declares {}", raw.len(), slots.len()).into(),
        ));
    }
    let mut outputs: Vec<Tensor> = slots
        .iter()
        .zip(raw)
        .map(|(slot, t)| dequantize_tensor(t, slot.quantization.as_ref()))
        .collect();

    if outputs.len() == 1 {
        if let Some(t) = outputs.pop() {
            return Ok(Outputs::Single(t));
        }
    }
    Ok(Outputs::Many(outputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lr_tensor::{DType, Dim, QuantParams, Shape};

    fn out(name: &str, dtype: DType) -> TensorSpec {
        TensorSpec::output(name, vec![Dim::Dynamic], dtype)
    }

    #[test]
    fn test_single_output() {
        let raw = vec![Tensor::new(vec![1.5], Shape::new(vec![1]))];
        let outputs = collect(&[out("y", DType::F32)], raw).unwrap();
        assert_eq!(outputs.len(), 1);
        let t = outputs.into_single().unwrap();
        assert_eq!(t.data_f32().unwrap(), &[1.5]);
    }

    #[test]
    fn test_many_outputs_keep_order() {
        let raw = vec![
            Tensor::new(vec![1.0], Shape::new(vec![1])),
            Tensor::from_vec(vec![7i32], Shape::new(vec![1])).unwrap(),
        ];
        let outputs = collect(&[out("boxes", DType::F32), out("count", DType::I32)], raw).unwrap();
        assert!(outputs.clone().into_single().is_none());
        let v = outputs.into_vec();
        assert_eq!(v[0].dtype(), DType::F32);
        assert_eq!(v[1].dtype(), DType::I32);
    }

    #[test]
    fn test_quantized_output_dequantized() {
        let slot = out("probs", DType::U8).with_quantization(QuantParams::new(1.0 / 256.0, 0).unwrap());
        let raw = vec![Tensor::from_vec(vec![0u8, 128, 255], Shape::new(vec![3])).unwrap()];
        let t = collect(&[slot], raw).unwrap().into_single().unwrap();
        assert_eq!(t.dtype(), DType::F32);
        let v = t.data_f32().unwrap();
        assert_relative_eq!(v[0], 0.0);
        assert_relative_eq!(v[1], 0.5);
        assert_relative_eq!(v[2], 255.0 / 256.0);
    }

    #[test]
    fn test_unquantized_output_returned_as_produced() {
        let raw = vec![Tensor::from_vec(vec![3u8], Shape::new(vec![1])).unwrap()];
        let t = collect(&[out("y", DType::U8)], raw).unwrap().into_single().unwrap();
        assert_eq!(t.dtype(), DType::U8);
    }

    #[test]
    fn test_count_mismatch_is_execution_error() {
        let err = collect(&[out("a", DType::F32), out("b", DType::F32)], vec![]).unwrap_err();
        assert!(matches!(err, RunnerError::Execution(_)));
    }
}
