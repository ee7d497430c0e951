//! 🏛️ Цифровой двойник - оркестрация памяти, личности и провайдера
//!
//! Поток: запрос → эмбеддинг → поиск по памяти → промпт → генерация → сохранение.
//! Каждая публичная операция - один атомарный шаг для вызывающего.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::demiurge::directives::{self, DecisionContext};
use crate::demiurge::{PersonaProfile, SurveyAnswers};
use crate::error::TwinError;
use crate::initiation::{ProviderConfig, TwinConfig, DEFAULT_DISPLAY_NAME};
use crate::priests::{build_provider, TwinProvider};
use crate::totems::{
    MemoryKind, MemoryRecord, MemoryStore, MemoryStoreStats, ROLE_ASSISTANT, ROLE_TAG, ROLE_USER,
};

pub const CATCHPHRASE_PREFIX: &str = "Catchphrase:";
pub const EXAMPLE_DECISION_KEYS: [&str; 3] =
    ["example_decision1", "example_decision2", "example_decision3"];

/// Survey records offered as decision context
const SURVEY_CONTEXT_K: usize = 2;
/// Lower bound on chat records scanned for user preferences
const MIN_PREFERENCE_SCAN: usize = 5;

/// Цифровой двойник: память + личность + провайдер
pub struct TwinEngine {
    store: Mutex<MemoryStore>,
    persona: RwLock<PersonaProfile>,
    provider: RwLock<Arc<dyn TwinProvider>>,
    provider_config: ProviderConfig,
}

impl TwinEngine {
    /// Создает двойника по конфигурации
    pub fn new(config: &TwinConfig) -> Self {
        let provider = build_provider(&config.provider);
        let mut engine = Self::with_provider(&config.display_name, provider);
        engine.provider_config = config.provider.clone();
        engine
    }

    /// Создает двойника с заданным провайдером
    pub fn with_provider(display_name: &str, provider: Arc<dyn TwinProvider>) -> Self {
        Self {
            store: Mutex::new(MemoryStore::new()),
            persona: RwLock::new(PersonaProfile::unprofiled(display_name)),
            provider: RwLock::new(provider),
            provider_config: ProviderConfig::default(),
        }
    }

    /// Меняет ключ API и пересобирает провайдер. True если провайдер живой.
    pub fn reconfigure(&self, api_key: Option<String>) -> bool {
        let config = ProviderConfig {
            api_key,
            ..self.provider_config.clone()
        };
        let provider = build_provider(&config);
        let live = provider.is_live();
        *self.provider.write() = provider;
        info!(live, "provider reconfigured");
        live
    }

    pub fn is_live(&self) -> bool {
        self.provider.read().is_live()
    }

    pub fn provider_name(&self) -> String {
        self.provider.read().name().to_string()
    }

    fn provider(&self) -> Arc<dyn TwinProvider> {
        self.provider.read().clone()
    }

    // --- Анкета и личность ---

    /// Пересчитывает личность по анкете и сохраняет производные воспоминания.
    ///
    /// Порядок записей: фраза, примеры решений, сводка.
    #[instrument(skip_all)]
    pub fn ingest_survey(&self, answers: &SurveyAnswers) -> usize {
        let provider = self.provider();
        let profile = {
            let mut persona = self.persona.write();
            *persona = PersonaProfile::from_survey(&persona.display_name, answers);
            persona.clone()
        };
        info!(type_code = %profile.type_code, tone = %profile.tone, "persona derived");

        let mut records = Vec::new();

        let catchphrase = answers.text("catchphrase");
        if !catchphrase.is_empty() {
            let embedding = provider.embed_one(&catchphrase);
            records.push(MemoryRecord::new(
                MemoryKind::Survey,
                format!("{} {}", CATCHPHRASE_PREFIX, catchphrase),
                embedding,
            ));
        }

        for key in EXAMPLE_DECISION_KEYS {
            let decision = answers.text(key);
            if !decision.is_empty() {
                let embedding = provider.embed_one(&decision);
                records.push(MemoryRecord::new(MemoryKind::Decision, decision, embedding));
            }
        }

        let summary = profile.memory_summary();
        let embedding = provider.embed_one(&summary);
        records.push(MemoryRecord::new(MemoryKind::Survey, summary, embedding));

        let created = records.len();
        let mut store = self.store.lock();
        for record in records {
            store.add(record);
        }
        created
    }

    /// Копия текущей личности
    pub fn persona(&self) -> PersonaProfile {
        self.persona.read().clone()
    }

    pub fn set_display_name(&self, name: &str) {
        let name = name.trim();
        self.persona.write().display_name = if name.is_empty() {
            DEFAULT_DISPLAY_NAME.to_string()
        } else {
            name.to_string()
        };
    }

    /// Фразы из анкеты в порядке добавления
    pub fn catchphrases(&self) -> Vec<String> {
        collect_catchphrases(&self.store.lock())
    }

    // --- Диалог с памятью ---

    /// Отвечает на сообщение голосом двойника
    #[instrument(skip(self, message))]
    pub fn chat(&self, message: &str, top_k: usize) -> String {
        let provider = self.provider();
        let persona = self.persona();

        let query = provider.embed_one(message);
        let (memory_lines, catchphrases) = {
            let mut store = self.store.lock();
            // Сообщение попадает в память до ответа и может найти само себя
            store.add(
                MemoryRecord::new(MemoryKind::Chat, message.to_string(), query.clone())
                    .with_tag(ROLE_TAG, ROLE_USER),
            );
            let lines: Vec<String> = store
                .search(&query, top_k, None)
                .into_iter()
                .map(|(_, record)| format!("- {}: {}", record.kind.label(), record.text))
                .collect();
            (lines, collect_catchphrases(&store))
        };
        debug!(memories = memory_lines.len(), "chat context retrieved");

        let system_prompt = directives::chat_prompt(&persona, &memory_lines, &catchphrases);
        let reply = provider.chat(&system_prompt, message);

        let reply_embedding = provider.embed_one(&reply);
        self.store.lock().add(
            MemoryRecord::new(MemoryKind::Chat, reply.clone(), reply_embedding)
                .with_tag(ROLE_TAG, ROLE_ASSISTANT),
        );
        reply
    }

    // --- Что бы я сделал ---

    /// Моделирует решение в описанной ситуации
    #[instrument(skip(self, situation))]
    pub fn simulate_decision(&self, situation: &str, top_k: usize, store_reply: bool) -> String {
        let provider = self.provider();
        let persona = self.persona();

        let query = provider.embed_one(situation);
        let (context, catchphrases) = {
            let mut store = self.store.lock();
            let decisions = texts(store.search(&query, top_k, Some(MemoryKind::Decision)));
            let survey = texts(store.search(&query, SURVEY_CONTEXT_K, Some(MemoryKind::Survey)));
            let preferences: Vec<String> = store
                .search(&query, top_k.max(MIN_PREFERENCE_SCAN), Some(MemoryKind::Chat))
                .into_iter()
                .filter(|(_, r)| !r.is_assistant_turn())
                .map(|(_, r)| r.text.clone())
                .collect();

            (
                DecisionContext {
                    decisions,
                    survey,
                    preferences,
                },
                collect_catchphrases(&store),
            )
        };
        debug!(
            decisions = context.decisions.len(),
            survey = context.survey.len(),
            preferences = context.preferences.len(),
            "decision context retrieved"
        );

        let system_prompt = directives::decision_prompt(&persona, &context, &catchphrases);
        let reply = provider.chat(&system_prompt, situation);

        if store_reply {
            let embedding = provider.embed_one(&reply);
            self.store
                .lock()
                .add(MemoryRecord::new(MemoryKind::Decision, reply.clone(), embedding));
        }
        reply
    }

    // --- Управление памятью ---

    /// Сохраняет воспоминание вручную; неизвестный тип прерывает создание
    pub fn remember(&self, kind: &str, text: &str, permanent: bool) -> Result<(), TwinError> {
        let mut record =
            MemoryRecord::from_parts(kind, text.to_string(), Vec::new())?.with_permanent(permanent);
        record.embedding = self.provider().embed_one(&record.text);
        self.store.lock().add(record);
        Ok(())
    }

    /// Снимок памяти в порядке добавления
    pub fn memories(&self) -> Vec<MemoryRecord> {
        self.store.lock().list().to_vec()
    }

    /// Удаляет запись по индексу; устаревший индекс игнорируется
    pub fn delete_memory(&self, index: usize) -> bool {
        self.store.lock().delete(index).is_some()
    }

    /// Удаляет несколько записей, начиная с наибольшего индекса
    pub fn delete_memories(&self, indices: &[usize]) -> usize {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        let mut store = self.store.lock();
        sorted
            .into_iter()
            .filter(|index| store.delete(*index).is_some())
            .count()
    }

    pub fn clear_memories(&self, keep_permanent: bool) -> usize {
        let removed = self.store.lock().clear(keep_permanent);
        info!(removed, keep_permanent, "memories cleared");
        removed
    }

    pub fn stats(&self) -> MemoryStoreStats {
        self.store.lock().stats()
    }
}

fn texts(hits: Vec<(f32, &MemoryRecord)>) -> Vec<String> {
    hits.into_iter().map(|(_, r)| r.text.clone()).collect()
}

fn collect_catchphrases(store: &MemoryStore) -> Vec<String> {
    store
        .list()
        .iter()
        .filter(|record| record.kind == MemoryKind::Survey)
        .filter_map(|record| {
            let head = record.text.get(..CATCHPHRASE_PREFIX.len())?;
            head.eq_ignore_ascii_case(CATCHPHRASE_PREFIX)
                .then(|| record.text[CATCHPHRASE_PREFIX.len()..].trim().to_string())
        })
        .collect()
}
