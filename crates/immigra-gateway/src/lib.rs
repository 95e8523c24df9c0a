#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod compose;
mod dispatch;
mod error;
mod factory;
mod kind;
mod mapper;
mod persona;
mod policy;
mod request;

pub use compose::ComposedPrompt;
pub use dispatch::{Caller, DispatchStage, Gateway, TRACING_TARGET};
pub use error::{GatewayError, GatewayErrorKind, Result};
pub use factory::{ProviderClient, ProviderFactory};
pub use kind::{AgentKind, PayloadShape};
pub use mapper::{
    AgentReply, AgentResponse, FALLBACK_MESSAGE, NO_RESPONSE_PLACEHOLDER, ProviderCallResult,
    ResponseMapper,
};
pub use persona::{DEFAULT_MODEL, ECONOMY_MODEL, PersonaConfig, PersonaTable};
pub use policy::{DEFAULT_RESTRICTED_PREFIX, ModelPolicy};
pub use request::{AgentInput, AgentPayload, AgentRequest, ChatTurn, DEFAULT_IMAGE_PROMPT};
