//! Survey Answers - Validated Input for Persona Derivation
//!
//! The survey arrives as a flat key-value set. Numeric answers are
//! normalized to a 1-5 Likert scale here, so derivation never has to
//! coerce values itself.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const LIKERT_MIN: u8 = 1;
pub const LIKERT_MAX: u8 = 5;
/// Neutral midpoint used for any missing or unreadable Likert answer
pub const LIKERT_NEUTRAL: u8 = 3;

/// Humor styles offered by the survey form
pub const HUMOR_STYLES: [&str; 5] = ["light", "dry", "sarcastic", "playful", "none"];

/// Questions answered in free text; numbers given here keep their digits
pub const FREE_TEXT_KEYS: [&str; 5] = [
    "humor_style",
    "catchphrase",
    "example_decision1",
    "example_decision2",
    "example_decision3",
];

/// A single survey answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurveyValue {
    Likert(u8),
    Text(String),
}

/// Flat survey answer set keyed by question id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, SurveyValue>"
)]
pub struct SurveyAnswers {
    answers: BTreeMap<String, SurveyValue>,
}

impl SurveyAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of answers
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Value> =
            serde_json::from_str(json).context("Survey must be a JSON object")?;
        Ok(Self::from(raw))
    }

    /// Load answers from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read survey {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse survey {}", path.display()))
    }

    /// Store a numeric answer, clamped to the Likert range
    pub fn insert_likert(&mut self, key: &str, value: i64) {
        let clamped = value.clamp(LIKERT_MIN as i64, LIKERT_MAX as i64) as u8;
        self.answers
            .insert(key.to_string(), SurveyValue::Likert(clamped));
    }

    pub fn insert_text(&mut self, key: &str, value: impl Into<String>) {
        self.answers
            .insert(key.to_string(), SurveyValue::Text(value.into()));
    }

    pub fn with_likert(mut self, key: &str, value: i64) -> Self {
        self.insert_likert(key, value);
        self
    }

    pub fn with_text(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert_text(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SurveyValue> {
        self.answers.get(key)
    }

    /// Likert score for `key`; missing or non-numeric answers read as neutral
    pub fn likert(&self, key: &str) -> u8 {
        match self.answers.get(key) {
            Some(SurveyValue::Likert(v)) => *v,
            Some(SurveyValue::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(|v| v.clamp(LIKERT_MIN as i64, LIKERT_MAX as i64) as u8)
                .unwrap_or(LIKERT_NEUTRAL),
            None => LIKERT_NEUTRAL,
        }
    }

    /// Trimmed free-text answer, empty when missing
    pub fn text(&self, key: &str) -> String {
        match self.answers.get(key) {
            Some(SurveyValue::Text(s)) => s.trim().to_string(),
            Some(SurveyValue::Likert(v)) => v.to_string(),
            None => String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SurveyValue)> {
        self.answers.iter()
    }
}

impl From<BTreeMap<String, Value>> for SurveyAnswers {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut answers = SurveyAnswers::new();
        for (key, value) in raw {
            match value {
                Value::Number(n) if FREE_TEXT_KEYS.contains(&key.as_str()) => {
                    answers.insert_text(&key, n.to_string())
                }
                Value::Number(n) => {
                    let number = n
                        .as_i64()
                        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64));
                    match number {
                        Some(v) => answers.insert_likert(&key, v),
                        None => debug!(key = %key, "survey number out of range, ignored"),
                    }
                }
                Value::String(s) => answers.insert_text(&key, s),
                other => debug!(key = %key, value = %other, "unsupported survey value ignored"),
            }
        }
        answers
    }
}

impl From<SurveyAnswers> for BTreeMap<String, SurveyValue> {
    fn from(answers: SurveyAnswers) -> Self {
        answers.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_boundary_normalization() -> Result<()> {
        let answers = SurveyAnswers::from_json_str(
            r#"{
                "tone_directness": 9,
                "tone_formality": -2,
                "tone_empathy": 4.7,
                "msg_length": "2",
                "humor_style": "  dry ",
                "catchphrase": null,
                "extraversion": true
            }"#,
        )?;

        assert_eq!(answers.likert("tone_directness"), 5);
        assert_eq!(answers.likert("tone_formality"), 1);
        assert_eq!(answers.likert("tone_empathy"), 4);
        assert_eq!(answers.likert("msg_length"), 2);
        assert_eq!(answers.text("humor_style"), "dry");
        assert!(answers.get("catchphrase").is_none());
        assert!(answers.get("extraversion").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_and_malformed_default_to_neutral() {
        let answers = SurveyAnswers::new().with_text("risk_tolerance", "very high");
        assert_eq!(answers.likert("risk_tolerance"), LIKERT_NEUTRAL);
        assert_eq!(answers.likert("openness"), LIKERT_NEUTRAL);
        assert_eq!(answers.text("catchphrase"), "");
    }

    #[test]
    fn test_numbers_under_text_questions_stay_text() -> Result<()> {
        let answers = SurveyAnswers::from_json_str(
            r#"{ "catchphrase": 42, "example_decision1": 2024, "tone_empathy": 42 }"#,
        )?;

        assert_eq!(answers.get("catchphrase"), Some(&SurveyValue::Text("42".to_string())));
        assert_eq!(answers.text("catchphrase"), "42");
        assert_eq!(answers.text("example_decision1"), "2024");
        assert_eq!(answers.likert("tone_empathy"), 5);
        Ok(())
    }

    #[test]
    fn test_rejects_non_object_json() {
        assert!(SurveyAnswers::from_json_str("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_serializes_as_flat_map() -> Result<()> {
        let answers = SurveyAnswers::new()
            .with_likert("mbti_ei", 5)
            .with_text("catchphrase", "Ship it.");
        let json = serde_json::to_value(&answers)?;
        assert_eq!(json, serde_json::json!({ "catchphrase": "Ship it.", "mbti_ei": 5 }));

        let back: SurveyAnswers = serde_json::from_value(json)?;
        assert_eq!(back, answers);
        Ok(())
    }
}
