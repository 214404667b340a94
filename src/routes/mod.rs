pub mod send_request;

use axum::routing::post;
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new().route(
        "/send-request",
        post(send_request::send)
            .get(send_request::liveness)
            .fallback(send_request::method_not_allowed),
    )
}
