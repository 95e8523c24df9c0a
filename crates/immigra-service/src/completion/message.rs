//! Chat message types exchanged with completion providers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Persona instruction written by the service.
    System,
    /// End user input.
    User,
    /// Model output.
    Assistant,
}

/// Raw image attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// MIME type, e.g. `image/png`.
    pub mime_type: &'static str,
    /// Decoded image bytes.
    pub bytes: Bytes,
}

impl ImageData {
    /// Creates a new image attachment.
    pub fn new(mime_type: &'static str, bytes: impl Into<Bytes>) -> Self {
        Self {
            mime_type,
            bytes: bytes.into(),
        }
    }

    /// Encodes the image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

/// One segment of a multimodal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Plain text segment.
    Text(String),
    /// Inline image segment.
    Image(ImageData),
}

/// Message body: plain text or a list of multimodal parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Returns the concatenated text of this content.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text(text) => Some(text.as_str()),
                    ContentPart::Image(_) => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Returns true if any part carries an image.
    pub fn has_image(&self) -> bool {
        matches!(self, Self::Parts(parts) if parts.iter().any(|p| matches!(p, ContentPart::Image(_))))
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    /// Creates a text message with the given role.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text(text.into()),
        }
    }

    /// Creates a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Creates a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Creates a user message carrying text followed by an image.
    pub fn user_with_image(text: impl Into<String>, image: ImageData) -> Self {
        Self {
            role: Role::User,
            content: Content::Parts(vec![
                ContentPart::Text(text.into()),
                ContentPart::Image(image),
            ]),
        }
    }
}
