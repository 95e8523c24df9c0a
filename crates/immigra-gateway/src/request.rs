//! Request validation.

use std::str::FromStr;

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use immigra_service::completion::{ImageData, Message, Role};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{AgentKind, GatewayError, PayloadShape, Result};

/// Longest accepted message, in characters.
const MAX_MESSAGE_LEN: u64 = 32_000;
/// Longest accepted image prompt, in characters.
const MAX_PROMPT_LEN: u64 = 4_000;
/// Upper bound on the base64 image text (about 10 MiB decoded).
const MAX_IMAGE_LEN: u64 = 14_000_000;
/// Most turns accepted in a conversation.
const MAX_TURNS: u64 = 100;

/// Standard alphabet; trailing `=` padding is optional.
const IMAGE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Prompt used for image requests that carry none.
pub const DEFAULT_IMAGE_PROMPT: &str =
    "Describe this image and point out any information relevant to an immigration case.";

pub(crate) mod messages {
    pub const MESSAGE_REQUIRED: &str = "Message is required";
    pub const NO_MESSAGES: &str = "No messages provided";
    pub const IMAGE_REQUIRED: &str = "Image is required";
    pub const IMAGE_INVALID: &str = "Image must be a base64-encoded PNG, JPEG, GIF or WebP";
    pub const UNKNOWN_KIND: &str = "Unknown agent kind";
    pub const INVALID_ROLE: &str = "Invalid message role";
    pub const LAST_NOT_USER: &str = "Last message must come from the user";
    pub const TOO_LARGE: &str = "Request exceeds allowed size";
}

/// One prior turn of a conversation.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ChatTurn {
    /// `user` or `assistant`.
    pub role: String,
    #[validate(length(max = MAX_MESSAGE_LEN))]
    pub content: String,
}

impl ChatTurn {
    /// Creates a new turn.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    fn into_message(self) -> Result<Message> {
        match Role::from_str(&self.role) {
            Ok(role @ (Role::User | Role::Assistant)) => Ok(Message::new(role, self.content)),
            _ => Err(GatewayError::validation(messages::INVALID_ROLE)),
        }
    }
}

/// Raw request body accepted by every agent endpoint.
///
/// Which fields are read depends on the agent kind: single-turn agents use
/// `message` (plus optional `history` and `documentId`), the image agent uses
/// `image` and `prompt`, and generic chat uses `messages`.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload {
    /// Question for a single-turn agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_MESSAGE_LEN))]
    pub message: Option<String>,

    /// Earlier turns, oldest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_TURNS), nested)]
    pub history: Option<Vec<ChatTurn>>,

    /// Document the review belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,

    /// Base64 image or `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_IMAGE_LEN))]
    pub image: Option<String>,

    /// Instruction accompanying the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_PROMPT_LEN))]
    pub prompt: Option<String>,

    /// Whole conversation for generic chat, oldest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_TURNS), nested)]
    pub messages: Option<Vec<ChatTurn>>,
}

impl AgentPayload {
    /// Creates a single-turn payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Creates a generic chat payload.
    pub fn conversation(turns: Vec<ChatTurn>) -> Self {
        Self {
            messages: Some(turns),
            ..Self::default()
        }
    }

    /// Creates an image payload.
    pub fn image(image: impl Into<String>, prompt: Option<String>) -> Self {
        Self {
            image: Some(image.into()),
            prompt,
            ..Self::default()
        }
    }
}

/// What the caller asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentInput {
    Text(String),
    Image { prompt: String, image: ImageData },
}

/// Validated, typed agent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub kind: AgentKind,
    pub input: AgentInput,
    /// Prior turns in their original order.
    pub history: Vec<Message>,
    /// Set only for document reviews.
    pub document_id: Option<Uuid>,
}

impl AgentRequest {
    /// Validates a raw payload addressed to the given path segment.
    ///
    /// Side-effect free; every failure is a validation error whose message
    /// is safe to return to the client.
    pub fn validate(kind: &str, payload: AgentPayload) -> Result<Self> {
        let kind = AgentKind::from_str(kind)
            .map_err(|_| GatewayError::validation(messages::UNKNOWN_KIND))?;

        payload.validate().map_err(|errors| {
            GatewayError::validation(messages::TOO_LARGE).with_source(errors)
        })?;

        match kind.shape() {
            PayloadShape::SingleTurn => Self::single_turn(kind, payload),
            PayloadShape::MultiTurn => Self::multi_turn(kind, payload),
            PayloadShape::Image => Self::image(kind, payload),
        }
    }

    /// Returns the text of the current question.
    pub fn text(&self) -> &str {
        match &self.input {
            AgentInput::Text(text) => text,
            AgentInput::Image { prompt, .. } => prompt,
        }
    }

    fn single_turn(kind: AgentKind, payload: AgentPayload) -> Result<Self> {
        let message = payload
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| GatewayError::validation(messages::MESSAGE_REQUIRED))?;

        let history = payload
            .history
            .unwrap_or_default()
            .into_iter()
            .map(ChatTurn::into_message)
            .collect::<Result<Vec<_>>>()?;

        let document_id = match kind {
            AgentKind::DocumentReview => payload.document_id,
            _ => None,
        };

        Ok(Self {
            kind,
            input: AgentInput::Text(message),
            history,
            document_id,
        })
    }

    fn multi_turn(kind: AgentKind, payload: AgentPayload) -> Result<Self> {
        let mut turns = payload
            .messages
            .filter(|m| !m.is_empty())
            .ok_or_else(|| GatewayError::validation(messages::NO_MESSAGES))?;

        // Non-empty: checked above.
        let Some(last) = turns.pop() else {
            return Err(GatewayError::validation(messages::NO_MESSAGES));
        };

        let last = last.into_message()?;
        if last.role != Role::User {
            return Err(GatewayError::validation(messages::LAST_NOT_USER));
        }

        let text = last.content.text();
        if text.trim().is_empty() {
            return Err(GatewayError::validation(messages::MESSAGE_REQUIRED));
        }

        let history = turns
            .into_iter()
            .map(ChatTurn::into_message)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            kind,
            input: AgentInput::Text(text),
            history,
            document_id: None,
        })
    }

    fn image(kind: AgentKind, payload: AgentPayload) -> Result<Self> {
        let encoded = payload
            .image
            .filter(|i| !i.trim().is_empty())
            .ok_or_else(|| GatewayError::validation(messages::IMAGE_REQUIRED))?;

        let image = decode_image(&encoded)
            .ok_or_else(|| GatewayError::validation(messages::IMAGE_INVALID))?;

        let prompt = payload
            .prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_PROMPT.to_owned());

        Ok(Self {
            kind,
            input: AgentInput::Image { prompt, image },
            history: Vec::new(),
            document_id: None,
        })
    }
}

/// Decodes a base64 image or `data:` URL and detects its format.
fn decode_image(encoded: &str) -> Option<ImageData> {
    let encoded = encoded.trim();
    let data = match encoded.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,")?.1,
        None => encoded,
    };

    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = IMAGE_BASE64.decode(compact).ok()?;
    let mime_type = sniff_image(&bytes)?;
    Some(ImageData::new(mime_type, bytes))
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}
