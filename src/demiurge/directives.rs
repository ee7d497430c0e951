//! Directive Engine - Prompt Assembly and Output Rules
//!
//! System instructions are built as an ordered list of optional
//! fragments. A fragment whose source data is empty is dropped, so an
//! empty context never renders as a bare header.

use crate::demiurge::persona::PersonaProfile;

/// Max memory lines quoted in a chat prompt
pub const CHAT_MEMORY_LINES: usize = 5;
pub const DECISION_LINES: usize = 5;
pub const SURVEY_LINES: usize = 3;
pub const PREFERENCE_LINES: usize = 5;
/// Catchphrases offered to the model at most
pub const MAX_CATCHPHRASES: usize = 2;

pub const RELEVANT_MEMORIES: &str = "Relevant Memories:";
pub const PAST_DECISIONS: &str = "Relevant Past Decisions:";
pub const SURVEY_CONTEXT: &str = "Survey Context:";
pub const CHAT_PREFERENCES: &str = "Past Preferences from Chats (user statements):";
pub const OUTPUT_RULES: &str = "Output style rules:";

/// Ordered prompt fragments joined by newlines
#[derive(Debug, Default, Clone)]
pub struct PromptBuilder {
    fragments: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.fragments.push(text.into());
        self
    }

    /// Header plus up to `limit` items; nothing at all when `items` is empty
    pub fn section<I>(mut self, header: &str, items: I, limit: usize, gap_after: bool) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let items: Vec<String> = items.into_iter().take(limit).collect();
        if items.is_empty() {
            return self;
        }

        self.fragments.push(header.to_string());
        self.fragments.extend(items);
        if gap_after {
            self.fragments.push(String::new());
        }
        self
    }

    pub fn build(self) -> String {
        self.fragments.join("\n")
    }
}

/// Retrieved context for a decision prompt, already rendered as text
#[derive(Debug, Default, Clone)]
pub struct DecisionContext {
    pub decisions: Vec<String>,
    pub survey: Vec<String>,
    pub preferences: Vec<String>,
}

fn catchphrase_hint(lead: &str, catchphrases: &[String]) -> Option<String> {
    if catchphrases.is_empty() {
        return None;
    }
    let picked: Vec<&str> = catchphrases
        .iter()
        .take(MAX_CATCHPHRASES)
        .map(String::as_str)
        .collect();
    Some(format!(" {}: {}.", lead, picked.join(", ")))
}

/// Output rules for a chat reply
pub fn chat_style_rules(persona: &PersonaProfile, catchphrases: &[String]) -> String {
    let mut rules = format!(
        "Respond in first person as {}. Keep the tone {}. \
         Be concise (1-3 sentences) unless detail was requested. \
         Avoid asking questions unless critical. Prefer decisive language.",
        persona.display_name, persona.tone
    );
    if let Some(hint) = catchphrase_hint("Optionally weave in these catchphrase(s) naturally", catchphrases) {
        rules.push_str(&hint);
    }
    rules
}

/// Output rules for a simulated decision
pub fn decision_style_rules(persona: &PersonaProfile, catchphrases: &[String]) -> String {
    let mut rules = format!(
        "Respond in first person as {}. State the decision clearly in the first sentence, \
         then give 1-2 sentences of reasoning. No follow-up questions. \
         Honor stated preferences if applicable.",
        persona.display_name
    );
    if let Some(hint) = catchphrase_hint("Optionally include catchphrase(s) tastefully", catchphrases) {
        rules.push_str(&hint);
    }
    rules
}

/// System instruction for a chat turn
pub fn chat_prompt(persona: &PersonaProfile, memory_lines: &[String], catchphrases: &[String]) -> String {
    PromptBuilder::new()
        .line(format!("You are the AI twin of {}.", persona.display_name))
        .line(format!("Persona: {}", persona.summary))
        .line(format!("Core Values: {}", persona.values))
        .line(format!("Humor: {}", persona.humor))
        .section(RELEVANT_MEMORIES, memory_lines.iter().cloned(), CHAT_MEMORY_LINES, true)
        .line(OUTPUT_RULES)
        .line(chat_style_rules(persona, catchphrases))
        .build()
}

/// System instruction for a decision simulation
pub fn decision_prompt(
    persona: &PersonaProfile,
    context: &DecisionContext,
    catchphrases: &[String],
) -> String {
    let bullets = |items: &[String]| -> Vec<String> {
        items.iter().map(|text| format!("- {}", text)).collect()
    };

    PromptBuilder::new()
        .line(format!("You are the AI twin of {}.", persona.display_name))
        .line(format!("Persona Summary: {}", persona.summary))
        .line(format!("Decision-Making Style: {}", persona.decision_style))
        .section(PAST_DECISIONS, bullets(&context.decisions), DECISION_LINES, false)
        .section(SURVEY_CONTEXT, bullets(&context.survey), SURVEY_LINES, false)
        .section(CHAT_PREFERENCES, bullets(&context.preferences), PREFERENCE_LINES, false)
        .line(OUTPUT_RULES)
        .line(decision_style_rules(persona, catchphrases))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demiurge::survey::SurveyAnswers;

    fn persona() -> PersonaProfile {
        PersonaProfile::from_survey("Ada", &SurveyAnswers::new().with_likert("tone_directness", 5))
    }

    #[test]
    fn test_empty_sections_vanish() {
        let prompt = PromptBuilder::new()
            .line("top")
            .section("Header:", Vec::<String>::new(), 5, true)
            .line("bottom")
            .build();
        assert_eq!(prompt, "top\nbottom");
    }

    #[test]
    fn test_section_limit_and_gap() {
        let items = (1..=4).map(|i| format!("- {}", i));
        let prompt = PromptBuilder::new()
            .section("H:", items, 2, true)
            .line("end")
            .build();
        assert_eq!(prompt, "H:\n- 1\n- 2\n\nend");
    }

    #[test]
    fn test_chat_prompt_layout() {
        let persona = persona();
        let lines = vec!["- CHAT: deadlines?".to_string()];
        let catchphrases = vec!["Ship it.".to_string(), "Ok.".to_string(), "Nope.".to_string()];
        let prompt = chat_prompt(&persona, &lines, &catchphrases);

        assert!(prompt.starts_with("You are the AI twin of Ada.\nPersona: Tone is direct"));
        assert!(prompt.contains("Relevant Memories:\n- CHAT: deadlines?\n\nOutput style rules:\n"));
        assert!(prompt.contains("Keep the tone direct, semi-formal."));
        assert!(prompt.ends_with("catchphrase(s) naturally: Ship it., Ok.."));
        assert!(!prompt.contains("Nope."));
    }

    #[test]
    fn test_decision_prompt_omits_empty_blocks() {
        let persona = persona();
        let context = DecisionContext {
            decisions: Vec::new(),
            survey: vec!["Catchphrase: Ship it.".to_string()],
            preferences: Vec::new(),
        };
        let prompt = decision_prompt(&persona, &context, &[]);

        assert!(!prompt.contains(PAST_DECISIONS));
        assert!(!prompt.contains(CHAT_PREFERENCES));
        assert!(prompt.contains("Survey Context:\n- Catchphrase: Ship it.\nOutput style rules:"));
        assert!(!prompt.contains("Optionally include"));
    }

    #[test]
    fn test_decision_prompt_caps_blocks() {
        let persona = persona();
        let context = DecisionContext {
            decisions: (0..8).map(|i| format!("decision {}", i)).collect(),
            survey: Vec::new(),
            preferences: (0..7).map(|i| format!("pref {}", i)).collect(),
        };
        let prompt = decision_prompt(&persona, &context, &["Ship it.".to_string()]);

        assert!(prompt.contains("- decision 4\n"));
        assert!(!prompt.contains("decision 5"));
        assert!(prompt.contains("- pref 4\n"));
        assert!(!prompt.contains("pref 5"));
        assert!(prompt.ends_with("Optionally include catchphrase(s) tastefully: Ship it.."));
    }
}
