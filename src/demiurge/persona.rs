//! Persona - The Profiled Individual Behind the Twin
//!
//! A persona is derived from survey answers in one pure step and
//! replaced wholesale on every new submission.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::demiurge::survey::{SurveyAnswers, HUMOR_STYLES};
use crate::initiation::DEFAULT_DISPLAY_NAME;

/// Value axes in priority order; ties in score keep this order
pub const VALUE_AXES: [(&str, &str); 5] = [
    ("honesty", "val_honesty"),
    ("efficiency", "val_efficiency"),
    ("loyalty", "val_loyalty"),
    ("creativity", "val_creativity"),
    ("frugality", "val_frugality"),
];

/// Four type-code axes: (survey key, high letter, low letter)
pub const TYPE_AXES: [(&str, char, char); 4] = [
    ("mbti_ei", 'E', 'I'),
    ("mbti_sn", 'N', 'S'),
    ("mbti_tf", 'F', 'T'),
    ("mbti_jp", 'P', 'J'),
];

/// Letter for an axis answered at the midpoint
pub const UNDECIDED_LETTER: char = 'X';

const TOP_VALUES: usize = 3;
const FALLBACK_VALUE: &str = "pragmatism";
const DEFAULT_HUMOR_STYLE: &str = "light";

/// Where a Likert answer falls relative to the 4/2 thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    High,
    Neutral,
    Low,
}

impl Level {
    fn of(score: u8) -> Self {
        if score >= 4 {
            Level::High
        } else if score <= 2 {
            Level::Low
        } else {
            Level::Neutral
        }
    }
}

/// Fields derived from one survey submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTraits {
    pub summary: String,
    pub tone: String,
    pub values: String,
    pub humor: String,
    pub decision_style: String,
    pub type_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub display_name: String,
    pub summary: String,
    pub tone: String,
    pub values: String,
    pub humor: String,
    pub decision_style: String,
    pub type_code: String,
    /// Raw survey answers, kept for audit
    pub raw_survey: SurveyAnswers,
}

impl Default for PersonaProfile {
    fn default() -> Self {
        Self::unprofiled(DEFAULT_DISPLAY_NAME)
    }
}

impl PersonaProfile {
    /// Profile used before any survey has been submitted
    pub fn unprofiled(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            summary: String::new(),
            tone: "balanced, friendly".to_string(),
            values: "pragmatic, honest".to_string(),
            humor: "light, situational".to_string(),
            decision_style: "evidence-driven with intuition".to_string(),
            type_code: String::new(),
            raw_survey: SurveyAnswers::new(),
        }
    }

    /// Build a fresh profile from survey answers
    pub fn from_survey(display_name: &str, answers: &SurveyAnswers) -> Self {
        let traits = derive(answers);
        Self {
            display_name: display_name.to_string(),
            summary: traits.summary,
            tone: traits.tone,
            values: traits.values,
            humor: traits.humor,
            decision_style: traits.decision_style,
            type_code: traits.type_code,
            raw_survey: answers.clone(),
        }
    }

    /// Compact summary stored as a survey memory
    pub fn memory_summary(&self) -> String {
        format!(
            "Tone: {}. Values: {}. Decision Style: {}. Humor: {}. Type: {}.",
            self.tone, self.values, self.decision_style, self.humor, self.type_code
        )
    }

    /// Multi-line description for CLI display
    pub fn describe(&self) -> String {
        format!(
            "👤 {}\n   Type: {}\n   Tone: {}\n   Values: {}\n   Humor: {}\n   Decisions: {}\n   {}",
            self.display_name,
            if self.type_code.is_empty() { "-" } else { &self.type_code },
            self.tone,
            self.values,
            self.humor,
            self.decision_style,
            if self.summary.is_empty() {
                "(no survey submitted yet)"
            } else {
                &self.summary
            }
        )
    }
}

/// Derive persona fields from survey answers. Never fails.
pub fn derive(answers: &SurveyAnswers) -> DerivedTraits {
    let tone = tone_phrase(answers);
    let top = top_values(answers);
    let humor = humor_phrase(answers);
    let decision_style = decision_style(answers);

    let summary = format!(
        "Tone is {}. Values center on {}. Humor is {}. Decision-making is {}. \
         Traits: agreeableness {}/5, conscientiousness {}/5, openness {}/5, extraversion {}/5.",
        tone,
        values_sentence(&top),
        humor,
        decision_style,
        answers.likert("agreeableness"),
        answers.likert("conscientiousness"),
        answers.likert("openness"),
        answers.likert("extraversion"),
    );

    DerivedTraits {
        summary,
        tone,
        values: top.join(", "),
        humor,
        decision_style,
        type_code: type_code(answers),
    }
}

fn tone_phrase(answers: &SurveyAnswers) -> String {
    let mut bits: Vec<&str> = Vec::new();
    let mut push = |bit: &'static str| {
        if !bits.contains(&bit) {
            bits.push(bit);
        }
    };

    push(match Level::of(answers.likert("tone_directness")) {
        Level::High => "direct",
        Level::Low => "diplomatic",
        Level::Neutral => "balanced",
    });
    push(match Level::of(answers.likert("tone_formality")) {
        Level::High => "formal",
        Level::Low => "casual",
        Level::Neutral => "semi-formal",
    });
    if Level::of(answers.likert("tone_empathy")) == Level::High {
        push("empathetic");
    }
    match Level::of(answers.likert("msg_length")) {
        Level::High => push("detailed"),
        Level::Low => push("concise"),
        Level::Neutral => {}
    }

    bits.join(", ")
}

fn top_values(answers: &SurveyAnswers) -> Vec<&'static str> {
    let scores: Vec<(&'static str, u8)> = VALUE_AXES
        .iter()
        .map(|(name, key)| (*name, answers.likert(key)))
        .collect();
    rank_values(scores, TOP_VALUES)
}

/// Highest scores first; the stable sort keeps axis order on ties
fn rank_values(mut scores: Vec<(&'static str, u8)>, n: usize) -> Vec<&'static str> {
    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores.into_iter().take(n).map(|(name, _)| name).collect()
}

/// "a", "a and b", "a, b and c"
fn values_sentence(values: &[&str]) -> String {
    match values {
        [] => FALLBACK_VALUE.to_string(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn humor_phrase(answers: &SurveyAnswers) -> String {
    let raw = answers.text("humor_style");
    let style = if raw.is_empty() {
        DEFAULT_HUMOR_STYLE.to_string()
    } else if let Some(offered) = HUMOR_STYLES.iter().find(|s| s.eq_ignore_ascii_case(&raw)) {
        offered.to_string()
    } else {
        // свободный ответ вне списка формы сохраняется как есть
        debug!(style = %raw, "humor style not among offered options");
        raw
    };

    match Level::of(answers.likert("humor_frequency")) {
        Level::High => format!("often {}", style),
        Level::Low => format!("rarely {}", style),
        Level::Neutral => style,
    }
}

fn decision_style(answers: &SurveyAnswers) -> String {
    let data = Level::of(answers.likert("decision_data_vs_intuition"));
    let risk = Level::of(answers.likert("risk_tolerance"));

    let base = match (data, risk) {
        (Level::High, Level::Low) => "data-first, risk-averse",
        (Level::High, Level::High) => "data-first, calculated risk-taker",
        (Level::Low, Level::High) => "intuition-led, comfortable with risk",
        (Level::Low, Level::Low) => "intuition-led, cautious",
        _ => "balances data and intuition",
    };

    match Level::of(answers.likert("speed_vs_thoroughness")) {
        Level::High => format!("{}, prefers speed", base),
        Level::Low => format!("{}, prefers thoroughness", base),
        Level::Neutral => base.to_string(),
    }
}

fn type_code(answers: &SurveyAnswers) -> String {
    TYPE_AXES
        .iter()
        .map(|(key, high, low)| match Level::of(answers.likert(key)) {
            Level::High => *high,
            Level::Low => *low,
            Level::Neutral => UNDECIDED_LETTER,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_answers() -> SurveyAnswers {
        SurveyAnswers::new()
            .with_likert("tone_directness", 5)
            .with_likert("tone_formality", 1)
            .with_likert("val_honesty", 5)
            .with_likert("val_creativity", 4)
            .with_likert("val_efficiency", 3)
            .with_likert("mbti_ei", 5)
            .with_likert("mbti_sn", 3)
            .with_text("catchphrase", "Ship it.")
    }

    #[test]
    fn test_sample_survey() {
        let traits = derive(&sample_answers());
        assert_eq!(traits.tone, "direct, casual");
        assert_eq!(traits.values, "honesty, creativity, efficiency");
        assert!(traits.values.starts_with("honesty"));
        assert_eq!(traits.type_code, "EXXX");
        assert_eq!(traits.humor, "light");
        assert_eq!(traits.decision_style, "balances data and intuition");
    }

    #[test]
    fn test_empty_survey_is_neutral() {
        let traits = derive(&SurveyAnswers::new());
        assert_eq!(traits.tone, "balanced, semi-formal");
        assert_eq!(traits.values, "honesty, efficiency, loyalty");
        assert_eq!(traits.type_code, "XXXX");
        assert_eq!(
            traits.summary,
            "Tone is balanced, semi-formal. Values center on honesty, efficiency and loyalty. \
             Humor is light. Decision-making is balances data and intuition. \
             Traits: agreeableness 3/5, conscientiousness 3/5, openness 3/5, extraversion 3/5."
        );
    }

    #[test]
    fn test_full_tone_phrase() {
        let answers = SurveyAnswers::new()
            .with_likert("tone_directness", 2)
            .with_likert("tone_formality", 4)
            .with_likert("tone_empathy", 5)
            .with_likert("msg_length", 1);
        assert_eq!(derive(&answers).tone, "diplomatic, formal, empathetic, concise");

        let detailed = SurveyAnswers::new().with_likert("msg_length", 4);
        assert_eq!(derive(&detailed).tone, "balanced, semi-formal, detailed");
    }

    #[test]
    fn test_decision_quadrants() {
        let cases = [
            (5, 1, 3, "data-first, risk-averse"),
            (4, 5, 3, "data-first, calculated risk-taker"),
            (1, 4, 5, "intuition-led, comfortable with risk, prefers speed"),
            (2, 2, 1, "intuition-led, cautious, prefers thoroughness"),
            (5, 3, 3, "balances data and intuition"),
            (3, 1, 2, "balances data and intuition, prefers thoroughness"),
        ];
        for (data, risk, speed, expected) in cases {
            let answers = SurveyAnswers::new()
                .with_likert("decision_data_vs_intuition", data)
                .with_likert("risk_tolerance", risk)
                .with_likert("speed_vs_thoroughness", speed);
            assert_eq!(derive(&answers).decision_style, expected);
        }
    }

    #[test]
    fn test_humor_phrase() {
        let often = SurveyAnswers::new()
            .with_text("humor_style", "sarcastic")
            .with_likert("humor_frequency", 5);
        assert_eq!(derive(&often).humor, "often sarcastic");

        let rarely = SurveyAnswers::new()
            .with_text("humor_style", "  ")
            .with_likert("humor_frequency", 1);
        assert_eq!(derive(&rarely).humor, "rarely light");

        let offered = SurveyAnswers::new().with_text("humor_style", "DRY");
        assert_eq!(derive(&offered).humor, "dry");

        let custom = SurveyAnswers::new().with_text("humor_style", "Absurdist");
        assert_eq!(derive(&custom).humor, "Absurdist");
    }

    #[test]
    fn test_type_code_letters() {
        let answers = SurveyAnswers::new()
            .with_likert("mbti_ei", 1)
            .with_likert("mbti_sn", 5)
            .with_likert("mbti_tf", 2)
            .with_likert("mbti_jp", 3);
        assert_eq!(derive(&answers).type_code, "INTX");
    }

    #[test]
    fn test_value_ranking_ties_follow_axis_order() {
        let answers = SurveyAnswers::new()
            .with_likert("val_frugality", 5)
            .with_likert("val_loyalty", 5)
            .with_likert("val_honesty", 1);
        assert_eq!(derive(&answers).values, "loyalty, frugality, efficiency");
    }

    #[test]
    fn test_values_sentence_forms() {
        assert_eq!(values_sentence(&[]), "pragmatism");
        assert_eq!(values_sentence(&["honesty"]), "honesty");
        assert_eq!(values_sentence(&["honesty", "loyalty"]), "honesty and loyalty");
        assert_eq!(rank_values(Vec::new(), 3), Vec::<&str>::new());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let answers = sample_answers();
        assert_eq!(derive(&answers), derive(&answers));

        let profile = PersonaProfile::from_survey("Ada", &answers);
        assert_eq!(profile, PersonaProfile::from_survey("Ada", &answers));
        assert_eq!(profile.raw_survey, answers);
        assert_eq!(
            profile.memory_summary(),
            "Tone: direct, casual. Values: honesty, creativity, efficiency. \
             Decision Style: balances data and intuition. Humor: light. Type: EXXX."
        );
    }
}
