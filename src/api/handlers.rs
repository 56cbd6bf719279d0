// ABOUTME: Request handlers for deploy, settings and health endpoints.
// ABOUTME: Handlers only translate HTTP; decisions live in the trigger and store.

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::trigger::{Acknowledgment, TriggerRequest};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

/// Header carrying the shared secret on settings updates.
pub const SECRET_HEADER: &str = "x-swap-secret";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.version.clone(),
    })
}

pub async fn deploy(
    State(state): State<AppState>,
    body: Result<Json<TriggerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Acknowledgment>)> {
    let Json(request) = body?;
    let ack = state.trigger.accept(request)?;
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBody {
    pub swap_wait_seconds: i64,
}

pub async fn get_config(State(state): State<AppState>) -> ApiResult<Json<SettingsBody>> {
    let settings = state.store.get().await?;
    Ok(Json(SettingsBody {
        swap_wait_seconds: i64::from(settings.swap_wait_seconds()),
    }))
}

pub async fn put_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SettingsBody>, JsonRejection>,
) -> ApiResult<Json<SettingsBody>> {
    let secret = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    state.trigger.verify_secret(secret)?;

    let Json(body) = body?;
    let settings = state.store.set(body.swap_wait_seconds).await?;
    tracing::info!(
        swap_wait_seconds = settings.swap_wait_seconds(),
        "swap wait updated"
    );

    Ok(Json(SettingsBody {
        swap_wait_seconds: i64::from(settings.swap_wait_seconds()),
    }))
}
