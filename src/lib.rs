pub mod config;
pub mod email;
pub mod error;
pub mod routes;
pub mod state;
pub mod submission;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::Mailer;
use crate::state::{AppState, SharedState};

/// Build the router with the mailer selected by `config`.
pub fn build_app(config: Config) -> Router {
    let mailer = match email::build_mailer(&config.mail) {
        Ok(mailer) => {
            tracing::info!("Mail provider {} configured", mailer.provider());
            Some(mailer)
        }
        Err(e) => {
            tracing::warn!("Mail provider not available: {e}");
            None
        }
    };

    build_app_with_mailer(config, mailer)
}

/// Build the router around an already constructed mailer.
pub fn build_app_with_mailer(config: Config, mailer: Option<Arc<dyn Mailer>>) -> Router {
    let cors = cors_layer(&config.cors_origins);
    let state: SharedState = Arc::new(AppState { config, mailer });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{o}': {e}");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}

async fn health() -> &'static str {
    "ok"
}
