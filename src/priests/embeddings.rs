//! 🜂 Уровень 1: Жрецы - Интерфейсы провайдеров
//!
//! Двойник потребляет две внешние способности: векторизацию текста и
//! генерацию ответа. Обе обязаны деградировать до детерминированного
//! offline результата, поэтому методы трейтов не возвращают ошибок.

/// Trait для эмбеддингов, поддерживает разные реализации
pub trait Embedder: Send + Sync {
    /// Один вектор на каждую строку, в том же порядке
    fn embed(&self, texts: &[String]) -> Vec<Vec<f32>>;

    fn embedding_dim(&self) -> usize;

    /// Векторизует один текст
    fn embed_one(&self, text: &str) -> Vec<f32> {
        self.embed(&[text.to_string()])
            .into_iter()
            .next()
            .unwrap_or_default()
    }
}

/// Trait для генерации ответа по системной инструкции и сообщению пользователя
pub trait Generator: Send + Sync {
    fn chat(&self, system_prompt: &str, user_message: &str) -> String;
}

/// Полный провайдер двойника: эмбеддинги + генерация
pub trait TwinProvider: Embedder + Generator {
    /// Короткое имя для логов и CLI
    fn name(&self) -> &str;

    /// True when backed by a remote model rather than offline stubs
    fn is_live(&self) -> bool;
}
