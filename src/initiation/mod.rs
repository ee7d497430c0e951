//! 🜂 Уровень 0: Инициация
//!
//! Модуль инициации отвечает за загрузку конфигурации двойника
//! и параметров провайдера.

pub mod config;

pub use config::{ProviderConfig, TwinConfig, DEFAULT_DISPLAY_NAME};
