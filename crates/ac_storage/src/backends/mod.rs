pub mod memory;

#[cfg(feature = "qdrant")]
pub mod qdrant;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{MemoryStore, MemoryVectorIndex};

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantIndex;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
