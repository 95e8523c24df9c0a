//! OpenAPI specification middleware with Scalar UI integration.
//!
//! Generates the OpenAPI document from aide's [`ApiRouter`] and serves it
//! together with the Scalar API reference.
//!
//! [`ApiRouter`]: aide::axum::ApiRouter

use aide::axum::ApiRouter;
use aide::openapi::{Info, License, OpenApi};
use aide::scalar::Scalar;
use axum::routing::{Router, get};
use axum::{Extension, Json};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// OpenAPI configuration for aide integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct OpenApiConfig {
    /// Path which exposes the OpenAPI JSON specification.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_JSON_PATH", default_value = "/api/openapi.json")
    )]
    pub open_api_json: String,

    /// Path which exposes the Scalar API reference UI.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_SCALAR_PATH", default_value = "/api/scalar")
    )]
    pub scalar_ui: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            open_api_json: "/api/openapi.json".to_owned(),
            scalar_ui: "/api/scalar".to_owned(),
        }
    }
}

/// Extension trait for [`ApiRouter`] to add OpenAPI documentation with Scalar UI.
///
/// [`ApiRouter`]: aide::axum::ApiRouter
pub trait RouterOpenApiExt<S> {
    /// Adds OpenAPI documentation routes with default API info.
    fn with_open_api(self, config: &OpenApiConfig) -> Router<S>;

    /// Adds OpenAPI documentation routes with custom OpenAPI info.
    fn with_open_api_info(self, config: &OpenApiConfig, info: Info) -> Router<S>;
}

impl<S> RouterOpenApiExt<S> for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_open_api(self, config: &OpenApiConfig) -> Router<S> {
        let info = Info {
            title: "Immigra API".to_owned(),
            summary: Some("Immigration assistance agents".to_owned()),
            description: Some(
                "Immigra answers immigration questions through specialised agents for \
                visas, green cards, citizenship, document review and more. Answers are \
                general information and not legal advice."
                    .to_owned(),
            ),
            license: Some(License {
                name: "MIT".to_owned(),
                identifier: Some("MIT".to_owned()),
                ..License::default()
            }),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            ..Info::default()
        };

        self.with_open_api_info(config, info)
    }

    fn with_open_api_info(self, config: &OpenApiConfig, info: Info) -> Router<S> {
        async fn serve_openapi(Extension(api): Extension<OpenApi>) -> Json<OpenApi> {
            Json(api)
        }

        let mut api = OpenApi {
            info,
            ..OpenApi::default()
        };

        let scalar = Scalar::new(&config.open_api_json);
        let router = self
            .route(&config.scalar_ui, scalar.axum_route())
            .route(&config.open_api_json, get(serve_openapi));

        router.finish_api(&mut api).layer(Extension(api))
    }
}
