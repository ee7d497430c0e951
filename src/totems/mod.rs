pub mod memory;
pub mod retrieval;

// Re-export для удобного импорта
pub use memory::{MemoryKind, MemoryRecord, ROLE_ASSISTANT, ROLE_TAG, ROLE_USER};
pub use retrieval::{cosine_similarity, MemoryStore, MemoryStoreStats};
