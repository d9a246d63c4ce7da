//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::arena::Position;
use crate::game::{MatchId, MatchMode, MatchStatus, Participant, ParticipantId, ParticipantTotals};
use crate::matchmaking::{QueueError, QueueStats};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/matches", get(list_matches_handler))
        .route("/matches/:id", get(match_handler))
        .route("/matches/:id/report", post(report_handler))
        .route(
            "/participants/:id",
            get(participant_handler).delete(disconnect_handler),
        )
        .route("/queue/join", post(queue_join_handler))
        .route("/queue/leave", post(queue_leave_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Status endpoints
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_matches: usize,
    players_in_matches: usize,
    arenas: usize,
    queues: Vec<QueueStats>,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let queues = state.queue.queue_stats().await;

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_matches: state.registry.active_match_count(),
        players_in_matches: state.registry.total_players(),
        arenas: state.arenas.arenas().iter().filter(|a| a.is_valid()).count(),
        queues,
    })
}

async fn list_matches_handler(State(state): State<AppState>) -> Json<Vec<MatchStatus>> {
    let statuses = state
        .registry
        .matches()
        .iter()
        .map(|game| game.status())
        .collect();
    Json(statuses)
}

async fn match_handler(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
) -> Result<Json<MatchStatus>, AppError> {
    let game = state
        .registry
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("match {id}")))?;
    Ok(Json(game.status()))
}

#[derive(Serialize)]
struct QueuePosition {
    mode: MatchMode,
    position: usize,
}

#[derive(Serialize)]
struct ParticipantResponse {
    participant_id: ParticipantId,
    match_id: Option<MatchId>,
    match_kills: u32,
    queued: Option<QueuePosition>,
    totals: ParticipantTotals,
}

async fn participant_handler(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
) -> Json<ParticipantResponse> {
    let queued = state
        .queue
        .position(&id)
        .await
        .map(|(mode, position)| QueuePosition { mode, position });

    Json(ParticipantResponse {
        participant_id: id,
        match_id: state.registry.match_of(&id).map(|game| game.id()),
        match_kills: state.registry.match_kills(&id),
        queued,
        totals: state.context.ledger.totals(&id),
    })
}

async fn disconnect_handler(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
) -> StatusCode {
    state.disconnect(&id).await;
    StatusCode::NO_CONTENT
}

// ============================================================================
// Matchmaking endpoints
// ============================================================================

#[derive(Deserialize)]
struct JoinQueueRequest {
    participant_id: ParticipantId,
    name: Option<String>,
    mode: MatchMode,
}

#[derive(Serialize)]
struct JoinQueueResponse {
    status: &'static str,
    mode: MatchMode,
    position: usize,
    match_id: Option<MatchId>,
}

async fn queue_join_handler(
    State(state): State<AppState>,
    Json(req): Json<JoinQueueRequest>,
) -> Result<Json<JoinQueueResponse>, AppError> {
    if !state.limiters.check_queue() {
        return Err(AppError::RateLimited);
    }

    let name = match req.name {
        Some(name) if name.trim().is_empty() => {
            return Err(AppError::BadRequest("name must not be blank".to_string()))
        }
        Some(name) => name,
        None => format!("Player_{}", &req.participant_id.to_string()[..8]),
    };

    let position = state
        .queue
        .join(Participant::new(req.participant_id, name), req.mode)
        .await?;

    // the join may have formed a match synchronously
    let match_id = state
        .registry
        .match_of(&req.participant_id)
        .map(|game| game.id());

    Ok(Json(JoinQueueResponse {
        status: if match_id.is_some() { "matched" } else { "queued" },
        mode: req.mode,
        position,
        match_id,
    }))
}

#[derive(Deserialize)]
struct LeaveQueueRequest {
    participant_id: ParticipantId,
    mode: Option<MatchMode>,
}

#[derive(Serialize)]
struct LeaveQueueResponse {
    left: bool,
}

async fn queue_leave_handler(
    State(state): State<AppState>,
    Json(req): Json<LeaveQueueRequest>,
) -> Result<Json<LeaveQueueResponse>, AppError> {
    if !state.limiters.check_queue() {
        return Err(AppError::RateLimited);
    }

    let left = match req.mode {
        Some(mode) => state.queue.leave(&req.participant_id, mode).await,
        None => state.queue.leave_all(&req.participant_id).await,
    };
    Ok(Json(LeaveQueueResponse { left }))
}

// ============================================================================
// Match reports from the game transport
// ============================================================================

/// Report from the embedding game transport
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReportMsg {
    Position {
        participant_id: ParticipantId,
        position: Position,
    },
    Damage {
        attacker: ParticipantId,
        victim: ParticipantId,
        amount: f64,
    },
    Elimination {
        victim: ParticipantId,
        killer: Option<ParticipantId>,
    },
    Leave {
        participant_id: ParticipantId,
    },
}

#[derive(Serialize)]
struct ReportResponse {
    accepted: bool,
}

async fn report_handler(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
    Json(report): Json<ReportMsg>,
) -> Result<Json<ReportResponse>, AppError> {
    if !state.limiters.check_report() {
        return Err(AppError::RateLimited);
    }

    let game = state
        .registry
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("match {id}")))?;

    let accepted = match report {
        ReportMsg::Position {
            participant_id,
            position,
        } => game.update_position(&participant_id, position),
        ReportMsg::Damage {
            attacker,
            victim,
            amount,
        } => game.record_damage(&attacker, &victim, amount),
        ReportMsg::Elimination { victim, killer } => game.eliminate_player(&victim, killer),
        ReportMsg::Leave { participant_id } => {
            game.contains(&participant_id) && state.registry.remove_participant(&participant_id)
        }
    };

    Ok(Json(ReportResponse { accepted }))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Too many requests")]
    RateLimited,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Queue(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}
