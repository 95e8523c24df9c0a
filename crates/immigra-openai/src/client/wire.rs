//! Chat completions wire format.

use immigra_service::completion::{
    Choice, CompletionRequest, CompletionResponse, Content, ContentPart, Message, Role, Usage,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl<'a> From<&'a CompletionRequest> for ChatRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: request.messages.iter().map(ChatMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: Role,
    pub content: ChatContent,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let content = match &message.content {
            Content::Text(text) => ChatContent::Text(text.clone()),
            Content::Parts(parts) => {
                ChatContent::Parts(parts.iter().map(ChatContentPart::from).collect())
            }
        };

        Self {
            role: message.role,
            content,
        }
    }
}

/// Plain string content or an array of typed parts.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ChatContent {
    Text(String),
    Parts(Vec<ChatContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ChatContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl From<&ContentPart> for ChatContentPart {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Self::Text { text: text.clone() },
            ContentPart::Image(image) => Self::ImageUrl {
                image_url: ImageUrl {
                    url: image.to_data_url(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageUrl {
    pub url: String,
}

/// Response body of a successful completion.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    pub fn into_completion(self, request_id: Uuid) -> CompletionResponse {
        let choices = self
            .choices
            .into_iter()
            .map(|choice| Choice {
                index: choice.index,
                role: choice
                    .message
                    .role
                    .as_deref()
                    .and_then(|role| role.parse().ok())
                    .unwrap_or(Role::Assistant),
                text: choice.message.content,
                finish_reason: choice.finish_reason,
            })
            .collect();

        let mut response = CompletionResponse::new(request_id, choices);
        response.model = self.model;
        response.usage = self.usage.map(|usage| Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        });
        response
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatReply,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}
