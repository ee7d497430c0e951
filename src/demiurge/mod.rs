//! Demiurge Level - Persona System
//!
//! This module implements Level 3 of the ZIGGURAT MIND architecture:
//! the Demiurge turns survey answers into a persona and shapes the
//! instructions the twin speaks with.

pub mod directives;
pub mod persona;
pub mod survey;

pub use directives::{DecisionContext, PromptBuilder};
pub use persona::{derive, DerivedTraits, PersonaProfile};
pub use survey::{SurveyAnswers, SurveyValue};
