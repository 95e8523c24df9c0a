//! Response mapping.

use immigra_service::completion::{CompletionResponse, Role};
use immigra_service::{Error as ProviderFailure, ErrorKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{AgentKind, GatewayError, Result};

/// Content returned when the provider produced no text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response generated";

/// Message shown instead of a credential failure.
pub const FALLBACK_MESSAGE: &str = "I'm sorry, the assistant is temporarily unavailable. \
    Please try again later, or contact our support team if you need help with your \
    immigration question right away.";

/// Outcome of the single provider call of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCallResult {
    pub succeeded: bool,
    pub text: Option<String>,
    pub error_kind: Option<ErrorKind>,
    /// Upstream error message of a failed call.
    pub error_detail: Option<String>,
}

impl ProviderCallResult {
    pub fn success(response: &CompletionResponse) -> Self {
        Self {
            succeeded: true,
            text: response.first_text().map(str::to_owned),
            error_kind: None,
            error_detail: None,
        }
    }

    pub fn failure(error: &ProviderFailure) -> Self {
        Self {
            succeeded: false,
            text: None,
            error_kind: Some(error.kind),
            error_detail: Some(error.detail()),
        }
    }

    /// Returns true if the provider rejected the credential.
    pub fn is_invalid_credential(&self) -> bool {
        self.error_kind == Some(ErrorKind::InvalidCredential)
    }
}

impl From<&immigra_service::Result<CompletionResponse>> for ProviderCallResult {
    fn from(result: &immigra_service::Result<CompletionResponse>) -> Self {
        match result {
            Ok(response) => Self::success(response),
            Err(error) => Self::failure(error),
        }
    }
}

/// Terminal result of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    /// Always [`Role::Assistant`].
    pub role: Role,
    /// Never empty.
    pub content: String,
    pub is_fallback: bool,
}

impl AgentResponse {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_fallback: false,
        }
    }

    /// The fixed answer substituted for credential failures.
    pub fn fallback() -> Self {
        Self {
            is_fallback: true,
            ..Self::assistant(FALLBACK_MESSAGE)
        }
    }
}

/// Client-facing reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AgentReply {
    /// `{ role: "assistant", content }` for generic chat.
    Chat {
        role: String,
        content: String,
        #[serde(
            default,
            rename = "isFallback",
            skip_serializing_if = "std::ops::Not::not"
        )]
        is_fallback: bool,
    },
    /// `{ message }` for every other agent.
    Single {
        message: String,
        #[serde(
            default,
            rename = "isFallback",
            skip_serializing_if = "std::ops::Not::not"
        )]
        is_fallback: bool,
    },
}

impl AgentReply {
    /// Returns the answer text.
    pub fn text(&self) -> &str {
        match self {
            Self::Chat { content, .. } => content,
            Self::Single { message, .. } => message,
        }
    }

    pub fn is_fallback(&self) -> bool {
        match self {
            Self::Chat { is_fallback, .. } | Self::Single { is_fallback, .. } => *is_fallback,
        }
    }
}

/// Maps provider results to agent responses and reply envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseMapper;

impl ResponseMapper {
    /// Maps a provider call result.
    ///
    /// A failed call reaching this point was not converted to a fallback and
    /// is reported as a provider error.
    pub fn map(&self, result: ProviderCallResult) -> Result<AgentResponse> {
        if !result.succeeded {
            let mut error = GatewayError::provider("Failed to get a response from the assistant");
            if let Some(detail) = result.error_detail {
                error = error.with_details(detail);
            }
            return Err(error);
        }

        let content = result
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_owned());

        Ok(AgentResponse::assistant(content))
    }

    /// Shapes the reply body for an agent kind.
    pub fn envelope(&self, kind: AgentKind, response: AgentResponse) -> AgentReply {
        if kind.is_multi_turn() {
            AgentReply::Chat {
                role: response.role.to_string(),
                content: response.content,
                is_fallback: response.is_fallback,
            }
        } else {
            AgentReply::Single {
                message: response.content,
                is_fallback: response.is_fallback,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use immigra_service::completion::Choice;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::GatewayErrorKind;

    #[test]
    fn success_uses_first_choice() {
        let response = CompletionResponse::new(
            Uuid::nil(),
            vec![Choice::assistant(0, Some("Use Form I-485.".into()))],
        );
        let mapped = ResponseMapper.map(ProviderCallResult::success(&response)).unwrap();
        assert_eq!(mapped.content, "Use Form I-485.");
        assert!(!mapped.is_fallback);
    }

    #[test]
    fn missing_text_becomes_placeholder() {
        let response = CompletionResponse::new(Uuid::nil(), vec![]);
        let mapped = ResponseMapper.map(ProviderCallResult::success(&response)).unwrap();
        assert_eq!(mapped.content, NO_RESPONSE_PLACEHOLDER);
    }

    #[test]
    fn failure_is_a_provider_error_with_details() {
        let failure = ProviderFailure::external_error().with_message("model overloaded");
        let error = ResponseMapper
            .map(ProviderCallResult::failure(&failure))
            .unwrap_err();
        assert_eq!(error.kind, GatewayErrorKind::Provider);
        assert_eq!(error.details.as_deref(), Some("model overloaded"));
    }

    #[test]
    fn envelopes_by_kind() {
        let single = ResponseMapper.envelope(AgentKind::Visa, AgentResponse::assistant("Yes."));
        assert_eq!(serde_json::to_value(&single).unwrap(), json!({"message": "Yes."}));

        let chat = ResponseMapper.envelope(AgentKind::GenericChat, AgentResponse::fallback());
        assert_eq!(
            serde_json::to_value(&chat).unwrap(),
            json!({"role": "assistant", "content": FALLBACK_MESSAGE, "isFallback": true})
        );
        assert!(chat.is_fallback());
    }
}
