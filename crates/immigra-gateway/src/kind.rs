//! Agent kinds served by the gateway.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Immigration topic or variant an endpoint is dedicated to.
///
/// The kebab-case name doubles as the URL path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, JsonSchema)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AgentKind {
    Visa,
    GreenCard,
    Citizenship,
    WorkPermit,
    FamilySponsorship,
    StudentVisa,
    TravelDocument,
    Translation,
    DocumentReview,
    DiversityVisa,
    GenericChat,
    Image,
}

/// Body shape accepted by an agent kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{ message, history?, documentId? }`
    SingleTurn,
    /// `{ messages: [{ role, content }] }`
    MultiTurn,
    /// `{ image, prompt? }`
    Image,
}

impl AgentKind {
    /// Returns the body shape for this kind.
    pub const fn shape(self) -> PayloadShape {
        match self {
            Self::GenericChat => PayloadShape::MultiTurn,
            Self::Image => PayloadShape::Image,
            _ => PayloadShape::SingleTurn,
        }
    }

    /// Returns true if anonymous callers are rejected.
    pub const fn requires_identity(self) -> bool {
        matches!(self, Self::DocumentReview)
    }

    /// Returns true if replies use the `{ role, content }` envelope.
    pub const fn is_multi_turn(self) -> bool {
        matches!(self.shape(), PayloadShape::MultiTurn)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn path_segments_are_kebab_case() {
        assert_eq!(AgentKind::GreenCard.as_ref(), "green-card");
        assert_eq!(AgentKind::from_str("family-sponsorship").ok(), Some(AgentKind::FamilySponsorship));
        assert_eq!(AgentKind::from_str("generic-chat").ok(), Some(AgentKind::GenericChat));
        assert!(AgentKind::from_str("greencard").is_err());
        assert!(AgentKind::from_str("GREEN-CARD").is_err());
    }

    #[test]
    fn only_document_review_requires_identity() {
        let gated: Vec<_> = AgentKind::iter().filter(|k| k.requires_identity()).collect();
        assert_eq!(gated, vec![AgentKind::DocumentReview]);
        assert_eq!(AgentKind::iter().count(), 12);
    }

    #[test]
    fn shapes() {
        assert_eq!(AgentKind::Image.shape(), PayloadShape::Image);
        assert!(AgentKind::GenericChat.is_multi_turn());
        assert_eq!(AgentKind::Translation.shape(), PayloadShape::SingleTurn);
    }
}
