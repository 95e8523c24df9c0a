//! Completion response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub role: Role,
    /// Generated text. Providers may omit it, e.g. on content filtering.
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

impl Choice {
    /// Creates an assistant choice at the given index.
    pub fn assistant(index: u32, text: Option<String>) -> Self {
        Self {
            index,
            role: Role::Assistant,
            text,
            finish_reason: None,
        }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Provider answer to a [`CompletionRequest`].
///
/// [`CompletionRequest`]: super::CompletionRequest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Identifier of the originating request.
    pub request_id: Uuid,
    /// Model that actually served the request, if reported.
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Creates a response with the given choices.
    pub fn new(request_id: Uuid, choices: Vec<Choice>) -> Self {
        Self {
            request_id,
            model: None,
            choices,
            usage: None,
        }
    }

    /// Returns the first choice's text if it is present and not blank.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.text.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}
