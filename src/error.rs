//! Typed errors surfaced by the twin library.
//!
//! Provider failures never show up here: adapters recover from them locally.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TwinError {
    /// Memory kind outside of survey/chat/decision/correction/situation
    #[error("Invalid memory kind: {0}")]
    InvalidMemoryKind(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type TwinResult<T> = std::result::Result<T, TwinError>;
