//! Staff login: request a code, then trade it for a token.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use crate::auth::{ChallengeTicket, SessionToken};
use crate::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/challenge", post(challenge))
        .route("/auth/verify", post(verify))
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub challenge_id: String,
    pub code: String,
}

async fn challenge(
    State(state): State<AppState>,
    Json(body): Json<ChallengeRequest>,
) -> Result<Json<ChallengeTicket>, ApiError> {
    debug!("challenge request");
    let ticket = state.auth.issue_challenge(&body.phone).await?;
    Ok(Json(ticket))
}

async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<SessionToken>, ApiError> {
    debug!(challenge_id = %body.challenge_id, "verify request");
    let token = state.auth.verify(&body.challenge_id, &body.code).await?;
    Ok(Json(token))
}
