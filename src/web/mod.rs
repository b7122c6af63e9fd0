//! HTTP status and command API, served with axum next to the control server.

pub mod api;
pub mod models;
