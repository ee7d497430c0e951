//! 🜂 Уровень 1: Жрецы - провайдеры эмбеддингов и генерации

pub mod dummy_embeddings;
pub mod embeddings;
pub mod gemini;

pub use dummy_embeddings::OfflineProvider;
pub use embeddings::{Embedder, Generator, TwinProvider};
pub use gemini::GeminiProvider;

use std::sync::Arc;
use tracing::{info, warn};

use crate::initiation::ProviderConfig;

/// Выбирает провайдер: Gemini при наличии ключа, иначе offline
pub fn build_provider(config: &ProviderConfig) -> Arc<dyn TwinProvider> {
    let Some(api_key) = config.usable_api_key() else {
        info!("No API key configured, using offline provider");
        return Arc::new(OfflineProvider::new(config.offline_dim));
    };

    match GeminiProvider::new(config, api_key) {
        Ok(provider) => {
            info!(model = %config.chat_model, "Gemini provider configured");
            Arc::new(provider)
        }
        Err(e) => {
            warn!("Failed to configure Gemini provider, staying offline: {:#}", e);
            Arc::new(OfflineProvider::new(config.offline_dim))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_selection() {
        let mut config = ProviderConfig::default();
        let provider = build_provider(&config);
        assert_eq!(provider.name(), "offline");
        assert!(!provider.is_live());

        config.api_key = Some("key".to_string());
        let provider = build_provider(&config);
        assert_eq!(provider.name(), "gemini");
        assert!(provider.is_live());
    }
}
