//! End-to-end tests: blob bytes in, runner invocations, outputs checked.

use approx::assert_relative_eq;

use lr_model::{BlobWriter, TensorSpec};
use lr_runner::{
    BoxError, IdentityExecutor, Inputs, NameMatching, Outputs, Runner, RunnerConfig, RunnerError, TensorBuffer,
};
use lr_tensor::quant::dequantize_value;
use lr_tensor::{DType, Dim, QuantParams, Shape, Tensor};

fn image_params() -> QuantParams {
    QuantParams::new(0.5, 10).unwrap()
}

/// One quantized u8 image input and one unquantized f32 output.
fn image_model() -> Vec<u8> {
    BlobWriter::new()
        .with_slot(
            TensorSpec::input("serving_default_image:0", Dim::all_fixed(&[1, 2, 2, 1]), DType::U8)
                .with_quantization(image_params()),
        )
        .with_slot(TensorSpec::output("StatefulPartitionedCall:0", Dim::all_fixed(&[1, 2, 2, 1]), DType::F32))
        .to_bytes()
        .unwrap()
}

fn widen(inputs: &[&TensorBuffer]) -> Result<Vec<Tensor>, BoxError> {
    let stored = inputs[0].to_tensor()?;
    let data = stored.to_f32_vec();
    Ok(vec![Tensor::new(data, stored.shape().clone())])
}

#[test]
fn test_quantized_image_end_to_end() {
    let mut seen = Vec::new();
    let primitive = |inputs: &[&TensorBuffer]| -> Result<Vec<Tensor>, BoxError> {
        seen = inputs[0].storage().as_u8_slice()?.to_vec();
        widen(inputs)
    };
    let mut runner = Runner::from_bytes(&image_model(), primitive, RunnerConfig::default()).unwrap();

    let outputs = runner.run(Tensor::full(5.0, Shape::new(vec![1, 2, 2, 1]))).unwrap();
    let out = outputs.into_single().unwrap();
    assert_eq!(out.shape().dims(), &[1, 2, 2, 1]);
    assert_eq!(out.data_f32().unwrap(), &[20.0; 4]);
    for &v in out.data_f32().unwrap() {
        assert_relative_eq!(dequantize_value(v as f64, &image_params()), 5.0);
    }
    drop(runner);
    assert_eq!(seen, vec![20u8; 4]);
}

#[test]
fn test_quantized_round_trip_through_identity() {
    let params = QuantParams::new(0.1, 128).unwrap();
    let bytes = BlobWriter::new()
        .with_slot(TensorSpec::input("x", vec![Dim::Dynamic], DType::U8).with_quantization(params))
        .with_slot(TensorSpec::output("y", vec![Dim::Dynamic], DType::U8).with_quantization(params))
        .to_bytes()
        .unwrap();
    let mut runner = Runner::from_bytes(&bytes, IdentityExecutor, RunnerConfig::default()).unwrap();

    let values = vec![-12.8, -3.3, 0.0, 0.05, 2.5, 12.7];
    let out = runner
        .run(Tensor::new(values.clone(), Shape::new(vec![6])))
        .unwrap()
        .into_single()
        .unwrap();
    for (got, want) in out.data_f32().unwrap().iter().zip(&values) {
        assert!((got - want).abs() <= 0.1 + 1e-6, "{got} vs {want}");
    }
}

#[test]
fn test_arity_errors() {
    let mut runner = Runner::from_bytes(&image_model(), IdentityExecutor, RunnerConfig::default()).unwrap();
    let t = || Tensor::full(1.0, Shape::new(vec![1, 2, 2, 1]));

    let err = runner.run(vec![t(), t()]).unwrap_err();
    assert!(matches!(err, RunnerError::Arity { expected: 1, got: 2 }));
    let err = runner.run(Vec::<Tensor>::new()).unwrap_err();
    assert!(matches!(err, RunnerError::Arity { expected: 1, got: 0 }));
}

#[test]
fn test_shape_mismatch_before_execution() {
    let mut calls = 0;
    let primitive = |inputs: &[&TensorBuffer]| -> Result<Vec<Tensor>, BoxError> {
        calls += 1;
        widen(inputs)
    };
    let mut runner = Runner::from_bytes(&image_model(), primitive, RunnerConfig::default()).unwrap();
    let err = runner.run(Tensor::full(1.0, Shape::new(vec![1, 3, 2, 1]))).unwrap_err();
    assert!(matches!(err, RunnerError::ShapeMismatch { .. }));
    let err = runner.run(Tensor::full(1.0, Shape::new(vec![4]))).unwrap_err();
    assert!(matches!(err, RunnerError::ShapeMismatch { .. }));
    drop(runner);
    assert_eq!(calls, 0);
}

fn two_input_model() -> Vec<u8> {
    BlobWriter::new()
        .with_slot(TensorSpec::input("serving_default_image:0", vec![Dim::Dynamic], DType::F32))
        .with_slot(TensorSpec::input("serving_default_image_mask:0", vec![Dim::Dynamic], DType::F32))
        .with_slot(TensorSpec::output("out_image", vec![Dim::Dynamic], DType::F32))
        .with_slot(TensorSpec::output("out_mask", vec![Dim::Dynamic], DType::F32))
        .to_bytes()
        .unwrap()
}

fn scalar(v: f32) -> Tensor {
    Tensor::new(vec![v], Shape::new(vec![1]))
}

fn first_values(outputs: Outputs) -> Vec<f32> {
    outputs.into_vec().iter().map(|t| t.to_f32_vec()[0]).collect()
}

#[test]
fn test_named_inputs_substring_matching() {
    let mut runner = Runner::from_bytes(&two_input_model(), IdentityExecutor, RunnerConfig::default()).unwrap();

    // "image" is a substring of both slot names and comes first.
    let out = runner.run(vec![("image", scalar(1.0)), ("mask", scalar(2.0))]).unwrap();
    assert_eq!(first_values(out), vec![1.0, 1.0]);

    let out = runner.run(vec![("mask", scalar(2.0)), ("image", scalar(1.0))]).unwrap();
    assert_eq!(first_values(out), vec![1.0, 2.0]);

    let err = runner.run(vec![("image:0", scalar(1.0))]).unwrap_err();
    assert!(matches!(err, RunnerError::UnknownInput { slot } if slot == "serving_default_image_mask:0"));
}

#[test]
fn test_named_inputs_exact_first() {
    let config = RunnerConfig {
        name_matching: NameMatching::ExactThenSubstring,
        ..RunnerConfig::default()
    };
    let mut runner = Runner::from_bytes(&two_input_model(), IdentityExecutor, config).unwrap();
    let out = runner
        .run(vec![
            ("image", scalar(2.0)),
            ("serving_default_image:0", scalar(1.0)),
        ])
        .unwrap();
    assert_eq!(first_values(out), vec![1.0, 2.0]);
}

#[test]
fn test_output_cardinality() {
    let mut single = Runner::from_bytes(&image_model(), IdentityExecutor, RunnerConfig::default()).unwrap();
    let out = single.run(Tensor::full(0.0, Shape::new(vec![1, 2, 2, 1]))).unwrap();
    assert!(matches!(out, Outputs::Single(_)));

    let mut many = Runner::from_bytes(&two_input_model(), IdentityExecutor, RunnerConfig::default()).unwrap();
    let out = many.run(Inputs::Positional(vec![scalar(1.0), scalar(2.0)])).unwrap();
    assert!(matches!(&out, Outputs::Many(v) if v.len() == 2));
    assert_eq!(first_values(out), vec![1.0, 2.0]);
}

#[test]
fn test_dynamic_shapes_reuse_buffers() {
    let mut runner = Runner::from_bytes(&two_input_model(), IdentityExecutor, RunnerConfig::default()).unwrap();
    let batch = |n: usize| vec![Tensor::full(1.0, Shape::new(vec![n])), Tensor::full(0.0, Shape::new(vec![n]))];

    runner.run(batch(3)).unwrap();
    assert_eq!(runner.stats().allocations, 2);
    runner.run(batch(3)).unwrap();
    assert_eq!(runner.stats().allocations, 2);
    assert_eq!(runner.stats().reuses, 2);

    let out = runner.run(batch(5)).unwrap().into_vec();
    assert_eq!(out[0].shape().dims(), &[5]);
    assert_eq!(runner.stats().allocations, 4);
}

#[test]
fn test_shared_metadata() {
    let metadata = lr_model::load(&image_model()).unwrap();
    let mut a = Runner::new(metadata.clone(), IdentityExecutor, RunnerConfig::default());
    let mut b = Runner::new(metadata.clone(), IdentityExecutor, RunnerConfig::default());
    let t = Tensor::full(2.0, Shape::new(vec![1, 2, 2, 1]));
    assert_eq!(a.run(t.clone()).unwrap(), b.run(t).unwrap());
    assert_eq!(std::sync::Arc::strong_count(&metadata), 3);
}

#[test]
fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.lrtm");
    std::fs::write(&path, image_model()).unwrap();
    let runner = Runner::from_file(&path, IdentityExecutor, RunnerConfig::default()).unwrap();
    assert_eq!(runner.metadata().inputs()[0].quantization, Some(image_params()));

    let err = Runner::from_file(&dir.path().join("missing.lrtm"), IdentityExecutor, RunnerConfig::default())
        .unwrap_err();
    assert!(matches!(err, RunnerError::ModelLoad(_)));
}

#[test]
fn test_malformed_blob() {
    let err = Runner::from_bytes(b"LRTM", IdentityExecutor, RunnerConfig::default()).unwrap_err();
    assert!(matches!(err, RunnerError::ModelLoad(_)));
}
