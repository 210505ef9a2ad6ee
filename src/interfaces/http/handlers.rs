//! Axum route handlers for the payment service.
//!
//! Each handler parses its request, calls the [`PaymentEngine`] and renders
//! the result as JSON. Monetary values are accepted as JSON numbers or
//! decimal strings and always returned as decimal strings.

use super::error::ApiError;
use crate::application::engine::{BalanceView, Login, Receipt, Registration};
use crate::application::PaymentEngine;
use crate::domain::chain::ChainReport;
use crate::domain::transaction::Transaction;
use crate::domain::user::UserId;
use crate::error::PaymentError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared application state for the payment service.
pub type AppState = Arc<PaymentEngine>;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkHandRequest {
    pub user_id: UserId,
    pub hand_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub user_id: UserId,
    pub amount: Decimal,
    pub hand_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    pub user_id: UserId,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct MerchantPayRequest {
    pub merchant_id: UserId,
    pub amount: Decimal,
    /// Hand token of the paying customer.
    pub hand_token: String,
}

#[derive(Debug, Serialize)]
pub struct Linked {
    pub message: &'static str,
    pub user_id: UserId,
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(PaymentError::InvalidInput(rejection.body_text()))
    }
}

/// `POST /auth/register`: Creates a user and a funded wallet.
pub async fn post_register(
    State(engine): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Registration> {
    let Json(req) = body?;
    let registration = engine
        .register(&req.name, req.email.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(registration))
}

/// `POST /auth/login`: Checks credentials.
pub async fn post_login(
    State(engine): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Login> {
    let Json(req) = body?;
    Ok(Json(engine.login(&req.email, &req.password).await?))
}

/// `POST /user/link-hand`: Records a hand enrolment for the user.
pub async fn post_link_hand(
    State(engine): State<AppState>,
    body: Result<Json<LinkHandRequest>, JsonRejection>,
) -> ApiResult<Linked> {
    let Json(req) = body?;
    engine.link_hand(req.user_id, &req.hand_token).await?;
    Ok(Json(Linked {
        message: "Hand linked to account",
        user_id: req.user_id,
    }))
}

/// `POST /pay`: Debits the payer and chains a ledger entry.
pub async fn post_pay(
    State(engine): State<AppState>,
    body: Result<Json<PayRequest>, JsonRejection>,
) -> ApiResult<Receipt> {
    let Json(req) = body?;
    Ok(Json(
        engine.pay(req.user_id, req.amount, &req.hand_token).await?,
    ))
}

/// `POST /pay/merchant`: Always 501 until payer identification exists.
pub async fn post_merchant_pay(
    State(engine): State<AppState>,
    body: Result<Json<MerchantPayRequest>, JsonRejection>,
) -> ApiResult<Receipt> {
    let Json(req) = body?;
    Ok(Json(
        engine
            .merchant_pay(req.merchant_id, req.amount, &req.hand_token)
            .await?,
    ))
}

/// `POST /wallet/credit`: Tops up a wallet.
pub async fn post_credit(
    State(engine): State<AppState>,
    body: Result<Json<CreditRequest>, JsonRejection>,
) -> ApiResult<Receipt> {
    let Json(req) = body?;
    Ok(Json(engine.credit(req.user_id, req.amount).await?))
}

/// `GET /balance/{user_id}`
pub async fn get_balance(
    State(engine): State<AppState>,
    user_id: Result<Path<UserId>, PathRejection>,
) -> ApiResult<BalanceView> {
    let Path(user_id) = user_id?;
    Ok(Json(engine.get_balance(user_id).await?))
}

/// `GET /wallet/{user_id}/transactions`
pub async fn get_history(
    State(engine): State<AppState>,
    user_id: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Vec<Transaction>> {
    let Path(user_id) = user_id?;
    Ok(Json(engine.history(user_id).await?))
}

/// `GET /ledger/verify`: Re-hashes the whole chain.
pub async fn get_verify(State(engine): State<AppState>) -> ApiResult<ChainReport> {
    Ok(Json(engine.verify_chain().await?))
}

pub async fn root() -> &'static str {
    "HandPay online"
}

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
