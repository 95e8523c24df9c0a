#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod completion;
pub mod document;

pub use completion::{
    ApiCredential, CompletionProvider, CompletionRequest, CompletionResponse, CompletionService,
    ProviderConnector,
};
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use completion::{MockBehavior, MockProvider};
pub use document::{
    DEFAULT_DOCUMENT_CAPACITY, DocumentAnalysis, DocumentSink, MemoryDocumentStore,
};
pub use error::{BoxedError, Error, ErrorKind, Result};
