//! `lr inspect`: print the slot table and weight table of a blob.

use std::path::PathBuf;

use anyhow::Context;
use lr_model::{ModelBlob, ModelMetadata};

pub fn execute(model: PathBuf) -> anyhow::Result<()> {
    let blob = ModelBlob::open(&model).with_context(|| format!("failed to open '{}'", model.display()))?;
    let metadata = ModelMetadata::from_blob(&blob)
        .with_context(|| format!("no usable slot metadata in '{}'", model.display()))?;

    println!("Model: {}", model.display());
    println!("  Format version: {}", blob.header.version);
    println!("  Size: {:.2} KB", blob.len() as f64 / 1024.0);
    println!();

    println!("Slots:");
    for line in metadata.summary().lines() {
        println!("  {line}");
    }
    println!();

    if blob.weights.is_empty() {
        println!("Weights: none");
        return Ok(());
    }
    println!("Weights:");
    println!("  {:<32} {:<8} {:<20} {:>10}", "Name", "Type", "Shape", "Bytes");
    for info in &blob.weights {
        println!(
            "  {:<32} {:<8} {:<20} {:>10}",
            info.name,
            info.dtype.to_string(),
            info.shape()?.to_string(),
            info.data_size()?
        );
    }
    Ok(())
}
