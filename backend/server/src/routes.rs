use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use board::{
    Referral, ReferralDraft, ReferralStore, VoteCounts,
    catalog::{App, POPULAR_APPS},
};
use tracing::info;

use crate::{error::AppError, state::AppState};

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Referral>>, AppError> {
    Ok(Json(state.store.list().await?))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReferralDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Referral>), AppError> {
    let Json(draft) = payload?;
    let referral = state.store.create(draft.normalize()?).await?;

    info!(id = %referral.id, app = %referral.app_name, "Created referral");
    Ok((StatusCode::CREATED, Json(referral)))
}

pub async fn votes_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<VoteCounts>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(counts) = payload?;
    state
        .store
        .set_votes(&id, counts.upvotes, counts.downvotes)
        .await?;

    info!(id, counts.upvotes, counts.downvotes, "Updated votes");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn apps_handler() -> Json<&'static [App]> {
    Json(&POPULAR_APPS)
}
