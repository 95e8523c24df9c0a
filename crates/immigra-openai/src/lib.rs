#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod connector;
mod error;

pub use client::{LlmClient, LlmConfig, LlmConfigBuilder, LlmConfigBuilderError, TRACING_TARGET};
pub use connector::OpenAiConnector;
pub use error::{Error, Result};
