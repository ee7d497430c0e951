pub mod vector_store;

pub use vector_store::{cosine_similarity, MemoryStore, MemoryStoreStats};
