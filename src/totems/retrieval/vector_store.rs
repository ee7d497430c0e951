//! 🜃 Уровень 2: Тотемы Памяти - Векторный поиск
//!
//! In-memory хранилище записей двойника в порядке добавления.
//! Поиск - точный полный перебор по косинусному сходству.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::totems::memory::{MemoryKind, MemoryRecord};

/// Упорядоченное хранилище записей памяти
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    /// Записи в порядке добавления
    entries: Vec<MemoryRecord>,
    /// Общее количество запросов к хранилищу
    #[serde(skip)]
    query_count: u64,
}

impl MemoryStore {
    /// Создает пустое хранилище
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет запись в конец; дубликаты не отбрасываются
    pub fn add(&mut self, record: MemoryRecord) {
        debug!(kind = %record.kind, len = self.entries.len() + 1, "memory added");
        self.entries.push(record);
    }

    /// Снимок всех записей в порядке добавления
    pub fn list(&self) -> &[MemoryRecord] {
        &self.entries
    }

    /// Ищет наиболее похожие записи по косинусному сходству.
    ///
    /// Сортировка стабильная: при равном сходстве сохраняется порядок добавления.
    pub fn search(
        &mut self,
        query_embedding: &[f32],
        top_k: usize,
        kind_filter: Option<MemoryKind>,
    ) -> Vec<(f32, &MemoryRecord)> {
        self.query_count += 1;

        let mut similarities: Vec<(f32, &MemoryRecord)> = self
            .entries
            .iter()
            .filter(|entry| kind_filter.map_or(true, |kind| entry.kind == kind))
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .collect();

        // Сортируем по убыванию сходства
        similarities.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        similarities.truncate(top_k);

        debug!(
            kind = kind_filter.map(|k| k.as_str()).unwrap_or("any"),
            found = similarities.len(),
            "memory search"
        );
        similarities
    }

    /// Удаляет запись по позиции; индекс вне диапазона игнорируется
    pub fn delete(&mut self, index: usize) -> Option<MemoryRecord> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            debug!(index, len = self.entries.len(), "delete ignored, index out of range");
            None
        }
    }

    /// Очищает хранилище, при keep_permanent оставляет только постоянные записи
    pub fn clear(&mut self, keep_permanent: bool) -> usize {
        let initial_len = self.entries.len();
        if keep_permanent {
            self.entries.retain(|entry| entry.permanent);
        } else {
            self.entries.clear();
        }
        initial_len - self.entries.len()
    }

    /// Статистика хранилища
    pub fn stats(&self) -> MemoryStoreStats {
        let mut by_kind: HashMap<MemoryKind, usize> = HashMap::new();
        for entry in &self.entries {
            *by_kind.entry(entry.kind).or_insert(0) += 1;
        }

        MemoryStoreStats {
            total_entries: self.entries.len(),
            by_kind,
            permanent_count: self.entries.iter().filter(|e| e.permanent).count(),
            query_count: self.query_count,
        }
    }

    /// Возвращает количество записей
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Проверяет пустое ли хранилище
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Статистика хранилища памяти
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStoreStats {
    pub total_entries: usize,
    pub by_kind: HashMap<MemoryKind, usize>,
    pub permanent_count: usize,
    pub query_count: u64,
}

impl MemoryStoreStats {
    pub fn count(&self, kind: MemoryKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Форматирует статистику для вывода
    pub fn format(&self) -> String {
        let kinds: Vec<String> = MemoryKind::ALL
            .iter()
            .map(|kind| format!("{} {}", self.count(*kind), kind))
            .collect();
        format!(
            "📊 Memory Stats:\n   Entries: {} total ({})\n   Permanent: {}\n   Searches: {}",
            self.total_entries,
            kinds.join(", "),
            self.permanent_count,
            self.query_count
        )
    }
}

/// Вычисляет косинусное сходство между двумя векторами.
///
/// Пустой вектор, нулевая норма или разная длина дают 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    let denom = norm_a * norm_b;
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }

    let similarity = dot_product / denom;
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0) as f32
}
