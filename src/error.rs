// src/error.rs - Top-level error for the robot host
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Hardware error: {0}")]
    Actuator(#[from] crate::hardware::ActuatorError),
    #[error("Queue error: {0}")]
    Queue(#[from] crate::engine::QueueClosed),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
