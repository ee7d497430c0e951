//! 🏛️ Записи памяти двойника
//!
//! Каждая запись - одно высказывание, решение или факт вместе с его
//! эмбеддингом. После создания запись не изменяется.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TwinError;

/// Metadata key used to tag chat turns with their speaker
pub const ROLE_TAG: &str = "role";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// Тип записи памяти
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// Ответы анкеты и производные сводки
    Survey,
    /// Реплики диалога (пользователь и ассистент)
    Chat,
    /// Примеры решений и смоделированные решения
    Decision,
    /// Поправки пользователя
    Correction,
    /// Описания ситуаций
    Situation,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 5] = [
        MemoryKind::Survey,
        MemoryKind::Chat,
        MemoryKind::Decision,
        MemoryKind::Correction,
        MemoryKind::Situation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Survey => "survey",
            MemoryKind::Chat => "chat",
            MemoryKind::Decision => "decision",
            MemoryKind::Correction => "correction",
            MemoryKind::Situation => "situation",
        }
    }

    /// Uppercase label used when a record is quoted inside a prompt
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryKind {
    type Err = TwinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TwinError::InvalidMemoryKind(s.to_string()))
    }
}

/// Запись в памяти двойника
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Уникальный идентификатор записи
    pub id: Uuid,
    pub kind: MemoryKind,
    /// Исходный текст
    pub text: String,
    /// Векторное представление
    pub embedding: Vec<f32>,
    /// Временная метка создания
    pub timestamp: DateTime<Utc>,
    /// Метаданные (например role=user)
    pub tags: HashMap<String, String>,
    /// Переживает clear(keep_permanent = true)
    pub permanent: bool,
}

impl MemoryRecord {
    /// Создает новую запись
    pub fn new(kind: MemoryKind, text: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            text,
            embedding,
            timestamp: Utc::now(),
            tags: HashMap::new(),
            permanent: false,
        }
    }

    /// Создает запись из строкового типа; неизвестный тип - ошибка
    pub fn from_parts(kind: &str, text: String, embedding: Vec<f32>) -> Result<Self, TwinError> {
        let kind = kind.trim().to_lowercase().parse::<MemoryKind>()?;
        Ok(Self::new(kind, text, embedding))
    }

    /// Добавляет метаданные
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// True for chat turns produced by the assistant side
    pub fn is_assistant_turn(&self) -> bool {
        self.tag(ROLE_TAG) == Some(ROLE_ASSISTANT)
    }

    /// Короткая строка для просмотра списка памяти
    pub fn preview(&self, max_chars: usize) -> String {
        let text: String = self.text.chars().take(max_chars).collect();
        format!(
            "[{}] {} | {} | permanent: {}",
            self.kind,
            text,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            if self.permanent { "yes" } else { "no" }
        )
    }
}
