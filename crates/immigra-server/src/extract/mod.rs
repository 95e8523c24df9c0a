//! HTTP request extractors with error handling matched to the API envelope.
//!
//! - [`Json`] - JSON deserialization rejecting with `400 { error }`
//! - [`Identity`] - optional bearer-token identity, never rejects
//! - [`AuthClaims`] - claims carried by identity tokens

mod identity;
mod json;

pub use crate::extract::identity::{AuthClaims, Identity};
pub use crate::extract::json::Json;
