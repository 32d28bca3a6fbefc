//! `lr-model` - Model blob container and tensor slot registry for lite-runner.

pub mod blob;
pub mod error;
pub mod registry;

pub use blob::{BlobWriter, ModelBlob};
pub use error::{ModelError, Result};
pub use registry::{load, Direction, ModelMetadata, TensorSpec};
