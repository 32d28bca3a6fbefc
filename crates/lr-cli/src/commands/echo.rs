//! `lr echo`: bind constant inputs to every slot and run them through the
//! identity primitive, printing what comes back.
//!
//! The identity primitive yields one output per input, so this only succeeds
//! for models declaring as many outputs as inputs.

use std::path::PathBuf;

use anyhow::Context;
use lr_model::TensorSpec;
use lr_runner::{IdentityExecutor, Runner, RunnerConfig};
use lr_tensor::{Dim, Shape, Tensor};

pub fn execute(model: PathBuf, value: f32, dynamic_size: usize, config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => RunnerConfig::from_file(&path)?,
        None => RunnerConfig::default(),
    };
    let mut runner = Runner::from_file(&model, IdentityExecutor, config)
        .with_context(|| format!("failed to load '{}'", model.display()))?;

    let inputs: Vec<Tensor> = runner
        .metadata()
        .inputs()
        .iter()
        .map(|slot| Tensor::full(value, concrete_shape(slot, dynamic_size)))
        .collect();
    for (slot, t) in runner.metadata().inputs().iter().zip(&inputs) {
        println!("input  {:<32} {}", slot.name, t.shape());
    }

    let outputs = runner.run(inputs)?.into_vec();
    for (slot, t) in runner.metadata().outputs().iter().zip(&outputs) {
        println!("output {:<32} {} {} {:?}", slot.name, t.shape(), t.dtype(), preview(t));
    }
    tracing::info!("buffer stats: {:?}", runner.stats());
    Ok(())
}

fn concrete_shape(slot: &TensorSpec, dynamic_size: usize) -> Shape {
    Shape::new(
        slot.shape
            .iter()
            .map(|d| match d {
                Dim::Fixed(n) => *n,
                Dim::Dynamic => dynamic_size,
            })
            .collect(),
    )
}

fn preview(t: &Tensor) -> Vec<f32> {
    t.to_f32_vec().into_iter().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lr_tensor::DType;

    #[test]
    fn test_concrete_shape() {
        let slot = TensorSpec::input("x", vec![Dim::Dynamic, Dim::Fixed(3)], DType::F32);
        assert_eq!(concrete_shape(&slot, 4).dims(), &[4, 3]);
    }
}
