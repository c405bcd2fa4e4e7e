use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{LeaderboardEntryDto, MatchRecordDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::store::MATCH_HISTORY_CAPACITY;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::warn;

const DEFAULT_MATCH_LIMIT: usize = 20;
const MAX_MATCH_LIMIT: usize = MATCH_HISTORY_CAPACITY;

#[derive(Debug, serde::Deserialize)]
pub struct MatchesQuery {
    // Number of most recent matches to return.
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn leaderboard_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.recorder.leaderboard().await {
        Ok(entries) => {
            let body: Vec<LeaderboardEntryDto> =
                entries.into_iter().map(LeaderboardEntryDto::from).collect();
            Json(body).into_response()
        }
        Err(error) => {
            warn!(%error, "failed to read leaderboard");
            ErrorResponse::unavailable("leaderboard")
        }
    }
}

pub async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchesQuery>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_MATCH_LIMIT)
        .min(MAX_MATCH_LIMIT);

    match state.recorder.recent_matches(limit).await {
        Ok(records) => {
            let body: Vec<MatchRecordDto> =
                records.into_iter().map(MatchRecordDto::from).collect();
            Json(body).into_response()
        }
        Err(error) => {
            warn!(%error, "failed to read match history");
            ErrorResponse::unavailable("match history")
        }
    }
}
