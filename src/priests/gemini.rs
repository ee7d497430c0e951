//! 🜂 Gemini провайдер - удаленные эмбеддинги и генерация
//!
//! Любая ошибка (сеть, статус, формат ответа, пустой ответ) логируется
//! и заменяется детерминированным offline результатом.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::initiation::ProviderConfig;
use crate::priests::dummy_embeddings::OfflineProvider;
use crate::priests::embeddings::{Embedder, Generator, TwinProvider};

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Адаптер Gemini REST API с внутренним offline fallback
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    chat_model: String,
    embed_model: String,
    base_url: String,
    max_retries: u32,
    fallback: OfflineProvider,
    /// Размерность последних выданных векторов
    last_dim: AtomicUsize,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            chat_model: config.chat_model.clone(),
            embed_model: config.embed_model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            fallback: OfflineProvider::new(config.offline_dim),
            last_dim: AtomicUsize::new(config.offline_dim),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POST с повторами на 429/5xx и сетевых ошибках
    fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let mut last_error = anyhow!("Gemini request was not attempted");
        let mut retry_delay = INITIAL_RETRY_DELAY;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!("Gemini API retry attempt {} after {:?}", attempt, retry_delay);
                std::thread::sleep(retry_delay);
                retry_delay *= 2;
            }

            let response = match self
                .client
                .post(url)
                .query(&[("key", self.api_key.as_str())])
                .json(body)
                .send()
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = anyhow!(e).context("Gemini request failed");
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = anyhow!("Gemini API returned {}", status);
                continue;
            }

            let text = response.text().context("Failed to read Gemini response")?;
            if !status.is_success() {
                let preview: String = text.chars().take(300).collect();
                bail!("Gemini API error ({}): {}", status, preview);
            }

            let json: Value =
                serde_json::from_str(&text).context("Failed to parse Gemini response")?;
            if let Some(error) = json.get("error") {
                let msg = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown Gemini API error");
                bail!("Gemini API error: {}", msg);
            }
            return Ok(json);
        }

        Err(last_error)
    }

    fn try_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.endpoint(&self.embed_model, "embedContent");
        let mut vectors = Vec::with_capacity(texts.len());

        // embedContent принимает один текст, поэтому идем по одному
        for text in texts {
            let body = json!({
                "model": format!("models/{}", self.embed_model),
                "content": { "parts": [{ "text": text }] },
            });
            let response = self.post_json(&url, &body)?;
            vectors.push(parse_embedding(&response));
        }

        let missing = vectors.iter().filter(|v| v.is_empty()).count();
        if missing == vectors.len() {
            bail!("Empty embeddings from Gemini API");
        }
        if missing > 0 {
            warn!(missing, "Gemini returned empty embeddings, filling with offline vectors");
            for (vector, text) in vectors.iter_mut().zip(texts) {
                if vector.is_empty() {
                    *vector = self.fallback.embed_text(text);
                }
            }
        }
        Ok(vectors)
    }

    fn try_chat(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let url = self.endpoint(&self.chat_model, "generateContent");
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
            "contents": [{ "role": "user", "parts": [{ "text": user_message }] }],
        });

        let response = self.post_json(&url, &body)?;
        parse_reply(&response).ok_or_else(|| anyhow!("No text in Gemini response"))
    }
}

impl Embedder for GeminiProvider {
    fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        let vectors = match self.try_embed(texts) {
            Ok(vectors) => {
                debug!(count = vectors.len(), "Gemini embeddings received");
                vectors
            }
            Err(e) => {
                warn!("Gemini embeddings unavailable, using offline vectors: {:#}", e);
                self.fallback.embed(texts)
            }
        };

        if let Some(first) = vectors.first() {
            self.last_dim.store(first.len(), Ordering::Relaxed);
        }
        vectors
    }

    /// До первого запроса совпадает с offline размерностью
    fn embedding_dim(&self) -> usize {
        self.last_dim.load(Ordering::Relaxed)
    }
}

impl Generator for GeminiProvider {
    fn chat(&self, system_prompt: &str, user_message: &str) -> String {
        match self.try_chat(system_prompt, user_message) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Gemini generation unavailable, using offline reply: {:#}", e);
                self.fallback.chat(system_prompt, user_message)
            }
        }
    }
}

impl TwinProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_live(&self) -> bool {
        true
    }
}

/// Извлекает `embedding.values`; отсутствие поля дает пустой вектор
fn parse_embedding(response: &Value) -> Vec<f32> {
    response
        .get("embedding")
        .and_then(|e| e.get("values"))
        .and_then(|v| v.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|x| x.as_f64())
                .map(|x| x as f32)
                .collect()
        })
        .unwrap_or_default()
}

/// Склеивает текстовые части первого кандидата с непустым текстом
fn parse_reply(response: &Value) -> Option<String> {
    let candidates = response.get("candidates")?.as_array()?;

    candidates.iter().find_map(|candidate| {
        let parts = candidate.get("content")?.get("parts")?.as_array()?;
        let joined = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
