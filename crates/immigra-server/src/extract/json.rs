//! JSON extractor with error handling matched to the API envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json as AxumJson, Request};
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::handler::{Error, ErrorKind};

/// Message returned for any body that cannot be read as JSON.
const INVALID_BODY: &str = "Invalid request body";

/// JSON extractor and response.
///
/// Rejections become `400 { error: "Invalid request body" }` with the
/// parser message as details, or `413` when the body exceeds the limit.
///
/// [`Json`]: AxumJson
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Creates a new [`Json`] wrapper around the provided value.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extractor = <AxumJson<T> as FromRequest<S>>::from_request(req, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ErrorKind::BadRequest
                .with_message(INVALID_BODY)
                .with_details(sanitize_error_message(&err.body_text())),
            JsonRejection::JsonSyntaxError(err) => ErrorKind::BadRequest
                .with_message(INVALID_BODY)
                .with_details(sanitize_error_message(&err.body_text())),
            JsonRejection::MissingJsonContentType(_) => ErrorKind::BadRequest
                .with_message(INVALID_BODY)
                .with_details("Expected request with `Content-Type: application/json`"),
            JsonRejection::BytesRejection(err) => {
                if err.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
                    ErrorKind::PayloadTooLarge.into_error()
                } else {
                    ErrorKind::BadRequest
                        .with_message(INVALID_BODY)
                        .with_details(sanitize_error_message(&err.body_text()))
                }
            }
            other => ErrorKind::BadRequest
                .with_message(INVALID_BODY)
                .with_details(sanitize_error_message(&other.body_text())),
        }
    }
}

/// Keeps parser messages short.
fn sanitize_error_message(message: &str) -> String {
    let lines = message.lines().take(3).collect::<Vec<_>>();
    lines.join(" ").chars().take(200).collect()
}

impl<T> aide::OperationInput for Json<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumJson::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumJson::<T>::inferred_early_responses(ctx, operation)
    }
}

impl<T> aide::OperationOutput for Json<T>
where
    T: schemars::JsonSchema + Serialize,
{
    type Inner = T;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        AxumJson::<T>::operation_response(ctx, operation)
    }

    fn inferred_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumJson::<T>::inferred_responses(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::routing::post;
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Question {
        message: String,
    }

    async fn echo(Json(question): Json<Question>) -> Json<Question> {
        Json(question)
    }

    fn server() -> anyhow::Result<TestServer> {
        Ok(TestServer::new(Router::new().route("/", post(echo)))?)
    }

    #[tokio::test]
    async fn accepts_valid_json() -> anyhow::Result<()> {
        let server = server()?;
        let response = server.post("/").json(&json!({"message": "hi"})).await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "hi"}));
        Ok(())
    }

    #[tokio::test]
    async fn syntax_errors_are_bad_requests() -> anyhow::Result<()> {
        let server = server()?;
        let response = server
            .post("/")
            .content_type("application/json")
            .text("{not json")
            .await;
        response.assert_status_bad_request();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["error"], "Invalid request body");
        assert!(body["details"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn wrong_shape_is_a_bad_request() -> anyhow::Result<()> {
        let server = server()?;
        let response = server.post("/").json(&json!({"message": 42})).await;
        response.assert_status_bad_request();
        Ok(())
    }
}
