//! Contains the data models for API requests and responses.

use serde::{Deserialize, Serialize};

use crate::engine::EngineStats;

/// Current state of the action engine.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub accepting: bool,
    pub pending_groups: u64,
    pub groups_completed: u64,
    pub actions_completed: u64,
    pub actions_failed: u64,
    pub last_completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
}

impl StatusResponse {
    pub fn new(stats: EngineStats, accepting: bool) -> Self {
        let status = if !accepting {
            "Stopped"
        } else if stats.busy {
            "Busy"
        } else {
            "Idle"
        };
        Self {
            status: status.to_string(),
            accepting,
            pending_groups: stats.pending_groups,
            groups_completed: stats.groups_completed,
            actions_completed: stats.actions_completed,
            actions_failed: stats.actions_failed,
            last_completed_at: stats.last_completed_at,
            last_error: stats.last_error,
        }
    }
}

/// A single command line to enqueue.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Program text, one command per line.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgramRequest {
    pub program: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnqueuedResponse {
    pub groups: usize,
    pub actions: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}
