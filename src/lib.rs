//! ZIGGURAT TWIN - digital twin persona with retrieval-augmented memory
//!
//! Levels:
//! - `initiation` - configuration
//! - `priests` - embedding and generation providers
//! - `totems` - memory records and similarity search
//! - `demiurge` - survey-derived persona and prompt directives
//! - `twin` - the engine tying them together

pub mod demiurge;
pub mod error;
pub mod initiation;
pub mod priests;
pub mod totems;
pub mod twin;

pub use demiurge::{PersonaProfile, SurveyAnswers, SurveyValue};
pub use error::{TwinError, TwinResult};
pub use initiation::{ProviderConfig, TwinConfig};
pub use priests::{build_provider, Embedder, Generator, TwinProvider};
pub use totems::{cosine_similarity, MemoryKind, MemoryRecord, MemoryStore};
pub use twin::TwinEngine;
