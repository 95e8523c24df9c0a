//! Recording mock provider for testing.
//!
//! [`MockProvider`] implements both [`CompletionProvider`] and
//! [`ProviderConnector`]. Every clone shares the same recorder, so a test can
//! keep one handle, give another to the code under test, and afterwards
//! inspect which requests, models and credentials were observed.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! immigra-service = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use immigra_service::completion::MockProvider;
//!
//! let provider = MockProvider::replying("You will need Form I-485.");
//! let service = provider.clone().into_service();
//! // ... exercise the service ...
//! assert_eq!(provider.call_count(), 1);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{
    ApiCredential, Choice, CompletionProvider, CompletionRequest, CompletionResponse,
    CompletionService, Error, ProviderConnector, Result,
};

/// What the mock answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Answer with a single choice carrying this text.
    Reply(String),
    /// Answer with a single choice carrying no text.
    Empty,
    /// Fail as if the provider rejected the credential.
    InvalidCredential,
    /// Fail with an upstream error carrying this message.
    Upstream(String),
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self::Reply("This is a mock response.".to_owned())
    }
}

#[derive(Debug, Default)]
struct Recorder {
    requests: Vec<CompletionRequest>,
    credentials: Vec<ApiCredential>,
}

#[derive(Debug, Default)]
struct MockState {
    behavior: MockBehavior,
    delay: Option<Duration>,
    recorder: Mutex<Recorder>,
}

/// Recording mock provider.
#[derive(Clone, Debug, Default)]
pub struct MockProvider {
    state: Arc<MockState>,
}

impl MockProvider {
    /// Creates a mock with the given behavior.
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            state: Arc::new(MockState {
                behavior,
                ..MockState::default()
            }),
        }
    }

    /// Creates a mock answering with the given text.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reply(text.into()))
    }

    /// Creates a mock answering with an empty choice.
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Creates a mock rejecting every credential.
    pub fn rejecting_credential() -> Self {
        Self::new(MockBehavior::InvalidCredential)
    }

    /// Creates a mock failing with an upstream error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Upstream(message.into()))
    }

    /// Creates a mock that waits before answering.
    ///
    /// Must be called before the mock is cloned.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        let behavior = self.state.behavior.clone();
        Self {
            state: Arc::new(MockState {
                behavior,
                delay: Some(delay),
                ..MockState::default()
            }),
        }
    }

    /// Wraps this provider in a [`CompletionService`].
    pub fn into_service(self) -> CompletionService {
        CompletionService::new(self)
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.recorder().requests.clone()
    }

    /// Returns the number of completion calls received.
    pub fn call_count(&self) -> usize {
        self.recorder().requests.len()
    }

    /// Returns the model of every request received so far.
    pub fn models(&self) -> Vec<String> {
        self.recorder()
            .requests
            .iter()
            .map(|r| r.model.clone())
            .collect()
    }

    /// Returns the number of times a service was built from this mock.
    pub fn connect_count(&self) -> usize {
        self.recorder().credentials.len()
    }

    /// Returns the credentials passed to [`ProviderConnector::connect`].
    pub fn credentials(&self) -> Vec<ApiCredential> {
        self.recorder().credentials.clone()
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        self.state
            .recorder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.recorder().requests.push(request.clone());

        if let Some(delay) = self.state.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.state.behavior {
            MockBehavior::Reply(text) => Ok(CompletionResponse::new(
                request.request_id,
                vec![Choice::assistant(0, Some(text.clone()))],
            )),
            MockBehavior::Empty => Ok(CompletionResponse::new(
                request.request_id,
                vec![Choice::assistant(0, None)],
            )),
            MockBehavior::InvalidCredential => Err(Error::invalid_credential()
                .with_message("Incorrect API key provided")),
            MockBehavior::Upstream(message) => {
                Err(Error::external_error().with_message(message.clone()))
            }
        }
    }
}

impl ProviderConnector for MockProvider {
    fn connect(&self, credential: &ApiCredential) -> Result<CompletionService> {
        self.recorder().credentials.push(credential.clone());
        Ok(self.clone().into_service())
    }
}
