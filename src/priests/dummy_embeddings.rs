//! 🌙 Offline провайдер - Fallback для случаев без API
//!
//! Используется когда удаленная модель недоступна.
//! Векторы детерминированы хешем текста, ответ - фиксированный шаблон.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::priests::embeddings::{Embedder, Generator, TwinProvider};

pub const DEFAULT_OFFLINE_DIM: usize = 256;

/// Максимальная длина эха сообщения в offline ответе (в символах)
pub const STUB_ECHO_CHARS: usize = 160;

/// Детерминированный offline провайдер
#[derive(Debug, Clone)]
pub struct OfflineProvider {
    embedding_dim: usize,
}

impl OfflineProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Создает псевдо-случайный вектор, засеянный хешем текста
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(Self::hash_text(text));
        (0..self.embedding_dim).map(|_| rng.gen::<f32>()).collect()
    }

    /// Шаблонный ответ, повторяющий начало сообщения
    pub fn stub_reply(user_message: &str) -> String {
        let prefix: String = user_message.chars().take(STUB_ECHO_CHARS).collect();
        format!(
            "[Offline twin reply] Based on your persona and memories, here's a likely response: {} ...",
            prefix
        )
    }

    fn hash_text(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self::new(DEFAULT_OFFLINE_DIM)
    }
}

impl Embedder for OfflineProvider {
    fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }
}

impl Generator for OfflineProvider {
    fn chat(&self, _system_prompt: &str, user_message: &str) -> String {
        Self::stub_reply(user_message)
    }
}

impl TwinProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    fn is_live(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_embeddings_are_deterministic() {
        let provider = OfflineProvider::default();
        let texts = vec!["Ship it.".to_string(), "Ship it!".to_string(), "Ship it.".to_string()];
        let vectors = provider.embed(&texts);

        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == DEFAULT_OFFLINE_DIM));
        assert_eq!(vectors[0], vectors[2]);
        assert_ne!(vectors[0], vectors[1]);
        assert!(vectors[0].iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_empty_text_still_gets_vector() {
        let provider = OfflineProvider::new(8);
        assert_eq!(provider.embed_one("").len(), 8);
        assert!(provider.embed(&[]).is_empty());
    }

    #[test]
    fn test_stub_reply_truncates_echo() {
        let long = "x".repeat(400);
        let reply = OfflineProvider::stub_reply(&long);
        assert!(reply.starts_with("[Offline twin reply]"));
        assert!(reply.contains(&"x".repeat(STUB_ECHO_CHARS)));
        assert!(!reply.contains(&"x".repeat(STUB_ECHO_CHARS + 1)));

        let provider = OfflineProvider::default();
        let short = provider.chat("ignored", "What's your take on deadlines?");
        assert!(short.contains("What's your take on deadlines? ..."));
    }
}
