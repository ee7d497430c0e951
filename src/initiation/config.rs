//! 🜂 Конфигурация цифрового двойника
//!
//! Управляет параметрами системы:
//! - Имя двойника и глубина поиска по памяти
//! - Провайдер эмбеддингов и генерации (ключ API, модели, таймауты)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TwinError;
use crate::priests::dummy_embeddings::DEFAULT_OFFLINE_DIM;

pub const DEFAULT_DISPLAY_NAME: &str = "You";

/// Главная конфигурация двойника
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinConfig {
    /// Имя, от лица которого отвечает двойник
    pub display_name: String,
    /// Количество релевантных воспоминаний для извлечения
    pub recall_count: usize,
    pub provider: ProviderConfig,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            recall_count: 5,
            provider: ProviderConfig::default(),
        }
    }
}

/// Параметры провайдера
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Ключ API; без ключа используется offline провайдер
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embed_model: String,
    pub base_url: String,
    /// Таймаут одного HTTP запроса
    pub timeout_secs: u64,
    /// Повторы при 429/5xx и сетевых ошибках
    pub max_retries: u32,
    /// Размерность offline векторов
    pub offline_dim: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            chat_model: "gemini-1.5-flash".to_string(),
            embed_model: "text-embedding-004".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
            max_retries: 1,
            offline_dim: DEFAULT_OFFLINE_DIM,
        }
    }
}

impl ProviderConfig {
    /// Ключ без пробелов, если он не пустой
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl TwinConfig {
    /// Загружает конфигурацию из TOML файла
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: TwinConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Загружает файл если путь указан, иначе настройки по умолчанию
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Валидирует конфигурацию
    pub fn validate(&self) -> std::result::Result<(), TwinError> {
        if self.display_name.trim().is_empty() {
            return Err(TwinError::InvalidConfig("display_name is empty".to_string()));
        }
        if self.recall_count == 0 {
            return Err(TwinError::InvalidConfig("recall_count must be > 0".to_string()));
        }

        let provider = &self.provider;
        if provider.offline_dim == 0 {
            return Err(TwinError::InvalidConfig("offline_dim must be > 0".to_string()));
        }
        if provider.timeout_secs == 0 {
            return Err(TwinError::InvalidConfig("timeout_secs must be > 0".to_string()));
        }
        if provider.chat_model.trim().is_empty() || provider.embed_model.trim().is_empty() {
            return Err(TwinError::InvalidConfig("model names must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TwinConfig::default();
        assert_eq!(config.display_name, "You");
        assert_eq!(config.recall_count, 5);
        assert_eq!(config.provider.offline_dim, 256);
        assert!(config.provider.usable_api_key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_api_key_is_unusable() {
        let mut provider = ProviderConfig::default();
        provider.api_key = Some("   ".to_string());
        assert!(provider.usable_api_key().is_none());

        provider.api_key = Some(" abc ".to_string());
        assert_eq!(provider.usable_api_key(), Some("abc"));
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "display_name = \"Ada\"\n\n[provider]\ntimeout_secs = 5\nmax_retries = 0"
        )?;

        let config = TwinConfig::load(file.path())?;
        assert_eq!(config.display_name, "Ada");
        assert_eq!(config.recall_count, 5);
        assert_eq!(config.provider.timeout_secs, 5);
        assert_eq!(config.provider.max_retries, 0);
        assert_eq!(config.provider.chat_model, "gemini-1.5-flash");
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TwinConfig::default();
        config.recall_count = 0;
        assert!(matches!(config.validate(), Err(TwinError::InvalidConfig(_))));

        let mut config = TwinConfig::default();
        config.provider.offline_dim = 0;
        assert!(config.validate().is_err());

        let mut config = TwinConfig::default();
        config.display_name = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(TwinConfig::load(Path::new("/definitely/not/here.toml")).is_err());
        assert!(TwinConfig::load_or_default(None).is_ok());
    }
}
