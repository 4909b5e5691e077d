pub mod file;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{FilePageStore, JsonSummaryStore};
pub use memory::{MemoryPageStore, MemorySummaryStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSummaryStore;
