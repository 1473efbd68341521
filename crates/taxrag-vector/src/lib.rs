//! taxrag-vector
//!
//! Read side of the persisted vector stores: an exact in-memory index, a
//! LanceDB-backed index, the native and legacy corpus loaders and the
//! per-document catalog.

pub mod catalog;
pub mod flat;
pub mod lance;
pub mod legacy;
pub mod metadata;
pub mod schema;
pub mod table;
pub mod writer;

pub use catalog::Catalog;
pub use flat::FlatIndex;
pub use lance::{LanceVectorIndex, NativeLoader};
pub use legacy::LegacyLoader;

use taxrag_core::config::{StorageFormat, StorageSettings};
use taxrag_core::traits::CorpusLoader;

/// Pick the loader for the configured on-disk layout.
pub fn loader_for(storage: &StorageSettings) -> Box<dyn CorpusLoader> {
    match storage.format {
        StorageFormat::Native => Box::new(NativeLoader::new(&storage.table)),
        StorageFormat::Legacy => Box::new(LegacyLoader::new()),
    }
}
