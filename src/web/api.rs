//! Defines the Axum API routes and handlers.

use crate::command;
use crate::engine::ActionQueue;
use crate::program::{self, ActionGroup, Program};
use crate::web::models::{
    CommandRequest, EnqueuedResponse, ErrorResponse, ProgramRequest, StatusResponse,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

pub type AppState = ActionQueue;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Creates the Axum router with all the API endpoints.
pub fn create_router(queue: AppState) -> Router {
    Router::new()
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/command", post(enqueue_command))
        .route("/api/v1/program", post(enqueue_program))
        .with_state(queue)
}

fn error(status: StatusCode, message: impl ToString, line: Option<usize>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            line,
        }),
    )
}

fn closed() -> ApiError {
    error(StatusCode::SERVICE_UNAVAILABLE, "robot is shutting down", None)
}

/// Handler to get the current status of the action engine.
async fn get_status(State(queue): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::new(queue.stats(), !queue.is_closed()))
}

/// Handler to parse a single command and enqueue it as one group.
async fn enqueue_command(
    State(queue): State<AppState>,
    Json(payload): Json<CommandRequest>,
) -> Result<(StatusCode, Json<EnqueuedResponse>), ApiError> {
    let actions = command::parse(payload.command.trim())
        .map_err(|e| error(StatusCode::BAD_REQUEST, e, None))?;
    let count = actions.len();
    queue
        .enqueue(ActionGroup::single(actions, 1))
        .map_err(|_| closed())?;
    tracing::info!("Queued via HTTP: {}", payload.command.trim());
    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueuedResponse {
            groups: 1,
            actions: count,
            warnings: Vec::new(),
        }),
    ))
}

/// Handler to compile program text and enqueue every group in order.
async fn enqueue_program(
    State(queue): State<AppState>,
    Json(payload): Json<ProgramRequest>,
) -> Result<(StatusCode, Json<EnqueuedResponse>), ApiError> {
    let program: Program = program::compile_str(&payload.program)
        .map_err(|e| error(StatusCode::BAD_REQUEST, &e.kind, Some(e.line)))?;
    let actions = program.action_count();
    let warnings = program.warnings.iter().map(ToString::to_string).collect();
    let groups = queue.enqueue_program(program).map_err(|_| closed())?;
    tracing::info!("Queued program via HTTP: {} groups", groups);
    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueuedResponse {
            groups,
            actions,
            warnings,
        }),
    ))
}
