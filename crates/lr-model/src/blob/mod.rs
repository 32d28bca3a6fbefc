pub mod header;
pub mod metadata;
pub mod reader;
pub mod weights;
pub mod writer;

pub use header::{BlobHeader, BLOB_ALIGNMENT, BLOB_MAGIC, BLOB_VERSION};
pub use metadata::{MetaTable, MetaValue};
pub use reader::ModelBlob;
pub use weights::WeightInfo;
pub use writer::BlobWriter;
