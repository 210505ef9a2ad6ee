//! HTTP adapter exposing the payment engine as a JSON API.

pub mod error;
pub mod handlers;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Creates an Axum [`Router`] with every payment service endpoint.
///
/// Endpoints:
/// - `GET /` and `GET /health`: liveness
/// - `POST /auth/register`, `POST /auth/login`
/// - `POST /user/link-hand`
/// - `POST /pay`, `POST /pay/merchant`, `POST /wallet/credit`
/// - `GET /balance/{user_id}`, `GET /wallet/{user_id}/transactions`
/// - `GET /ledger/verify`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::post_register))
        .route("/auth/login", post(handlers::post_login))
        .route("/user/link-hand", post(handlers::post_link_hand))
        .route("/pay", post(handlers::post_pay))
        .route("/pay/merchant", post(handlers::post_merchant_pay))
        .route("/wallet/credit", post(handlers::post_credit))
        .route("/balance/{user_id}", get(handlers::get_balance))
        .route("/wallet/{user_id}/transactions", get(handlers::get_history))
        .route("/ledger/verify", get(handlers::get_verify))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .with_state(state)
}
