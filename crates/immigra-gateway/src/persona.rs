//! Persona table.

use std::collections::HashMap;
use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::AgentKind;

/// Default model candidate.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Cheaper candidate used for restricted-cost credentials.
pub const ECONOMY_MODEL: &str = "gpt-4o-mini";

const SAFETY_NOTE: &str = "Provide general information only, not legal advice. \
    Recommend consulting a licensed immigration attorney for case-specific decisions, \
    and point to official government sources where possible.";

/// Fixed system instruction and model parameters of an agent kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaConfig {
    pub kind: AgentKind,
    pub system_instruction: String,
    /// Candidate models, preferred first, cheapest last.
    pub model_preference: Vec<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl PersonaConfig {
    /// Returns the preferred model.
    pub fn default_model(&self) -> &str {
        self.model_preference
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_MODEL)
    }

    /// Returns the cheapest candidate.
    pub fn economy_model(&self) -> &str {
        self.model_preference
            .last()
            .map(String::as_str)
            .unwrap_or(DEFAULT_MODEL)
    }
}

/// Read-only map from agent kind to persona, built once per process.
#[derive(Debug, Clone)]
pub struct PersonaTable {
    personas: Arc<HashMap<AgentKind, PersonaConfig>>,
}

impl PersonaTable {
    /// Builds the table with the default model candidates.
    pub fn builtin() -> Self {
        Self::with_models(DEFAULT_MODEL, ECONOMY_MODEL)
    }

    /// Builds the table with the given default and economy models.
    pub fn with_models(default_model: &str, economy_model: &str) -> Self {
        let model_preference = if default_model == economy_model {
            vec![default_model.to_owned()]
        } else {
            vec![default_model.to_owned(), economy_model.to_owned()]
        };

        let personas = AgentKind::iter()
            .map(|kind| {
                let (topic, max_output_tokens, temperature) = persona_parameters(kind);
                let persona = PersonaConfig {
                    kind,
                    system_instruction: format!("{topic} {SAFETY_NOTE}"),
                    model_preference: model_preference.clone(),
                    max_output_tokens,
                    temperature,
                };
                (kind, persona)
            })
            .collect();

        Self {
            personas: Arc::new(personas),
        }
    }

    /// Returns the persona of an agent kind.
    pub fn get(&self, kind: AgentKind) -> Option<&PersonaConfig> {
        self.personas.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl Default for PersonaTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn persona_parameters(kind: AgentKind) -> (&'static str, u32, f32) {
    match kind {
        AgentKind::Visa => (
            "You are an expert assistant on U.S. visas. Explain visa categories, \
             eligibility, application steps, required forms and typical processing times.",
            1000,
            0.7,
        ),
        AgentKind::GreenCard => (
            "You are an expert assistant on U.S. permanent residence. Explain green card \
             paths through family, employment, asylum and other categories, adjustment of \
             status, consular processing and the supporting documents each requires.",
            1000,
            0.7,
        ),
        AgentKind::Citizenship => (
            "You are an expert assistant on U.S. naturalization. Explain eligibility, \
             Form N-400, continuous residence and physical presence, the civics and English \
             tests and the oath ceremony.",
            1000,
            0.7,
        ),
        AgentKind::WorkPermit => (
            "You are an expert assistant on U.S. employment authorization. Explain the EAD \
             (Form I-765), eligibility categories, renewals and work-based visas such as \
             H-1B, L-1 and O-1.",
            1000,
            0.7,
        ),
        AgentKind::FamilySponsorship => (
            "You are an expert assistant on family-based immigration. Explain Form I-130, \
             preference categories, priority dates, the visa bulletin and the affidavit of \
             support.",
            1000,
            0.7,
        ),
        AgentKind::StudentVisa => (
            "You are an expert assistant on U.S. student visas. Explain F-1, M-1 and J-1 \
             status, Form I-20, SEVIS, OPT, CPT and maintaining status.",
            1000,
            0.7,
        ),
        AgentKind::TravelDocument => (
            "You are an expert assistant on U.S. travel documents. Explain advance parole, \
             re-entry permits, refugee travel documents (Form I-131) and travel risks while \
             an application is pending.",
            1000,
            0.7,
        ),
        AgentKind::Translation => (
            "You are a professional translator for immigration paperwork. Translate the \
             text faithfully, keep names, dates and document numbers unchanged, and note \
             anything that requires a certified translation.",
            2000,
            0.3,
        ),
        AgentKind::DocumentReview => (
            "You review immigration documents. Summarise the document, list missing or \
             inconsistent information, and flag anything that commonly causes requests for \
             evidence or denials.",
            2000,
            0.3,
        ),
        AgentKind::DiversityVisa => (
            "You are an expert assistant on the Diversity Visa lottery. Explain country \
             eligibility, education and work requirements, entry rules, photo requirements \
             and the steps after selection.",
            1000,
            0.7,
        ),
        AgentKind::GenericChat => (
            "You are a friendly immigration assistant. Answer questions about U.S. \
             immigration clearly and concisely, asking follow-up questions when the \
             situation is unclear.",
            1000,
            0.7,
        ),
        AgentKind::Image => (
            "You analyse images of immigration documents and forms. Describe what the \
             image shows, transcribe relevant fields and point out issues such as expired \
             dates or missing signatures.",
            1000,
            0.5,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_persona() {
        let table = PersonaTable::builtin();
        assert_eq!(table.len(), 12);
        for kind in AgentKind::iter() {
            let persona = table.get(kind).unwrap();
            assert_eq!(persona.kind, kind);
            assert!(persona.system_instruction.contains("not legal advice"));
            assert!(persona.max_output_tokens > 0);
        }
    }

    #[test]
    fn model_preference_order() {
        let table = PersonaTable::builtin();
        let persona = table.get(AgentKind::Visa).unwrap();
        assert_eq!(persona.default_model(), "gpt-4o");
        assert_eq!(persona.economy_model(), "gpt-4o-mini");

        let single = PersonaTable::with_models("gpt-4.1", "gpt-4.1");
        let persona = single.get(AgentKind::Visa).unwrap();
        assert_eq!(persona.model_preference, vec!["gpt-4.1".to_owned()]);
        assert_eq!(persona.economy_model(), "gpt-4.1");
    }
}
