//! Storage adapters

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemorySnapshotStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSnapshotStore;
