//! HTTP 适配层（axum）

use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod handlers;
pub mod middleware;
pub mod response;

use middleware::trace_id_middleware;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/info", get(handlers::info))
        .route("/api/register", post(handlers::register))
        .route("/api/sign", post(handlers::sign))
        .route("/api/address", post(handlers::address))
        .route("/api/address/batch", post(handlers::address_batch))
        .layer(
            ServiceBuilder::new()
                // 请求体可能含助记词，TraceLayer 只记录方法、路径和状态码
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(trace_id_middleware)),
        )
        .with_state(state)
}
