use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use robo_rs::config::Config;
use robo_rs::engine::{self, ActionQueue, Engine};
use robo_rs::hardware::{HardwareContext, SimulatedGpio, SimulatedMotorDriver, SimulatedServoDriver, SimulatedSpeech};
use robo_rs::web::api::create_router;
use robo_rs::Robot;

fn setup() -> (ActionQueue, Engine<Robot>, Router) {
    let hw = HardwareContext::new(
        Box::new(SimulatedGpio::new()),
        Box::new(SimulatedServoDriver::new()),
        Box::new(SimulatedMotorDriver::new()),
        Box::new(SimulatedSpeech::new()),
    );
    let robot = Robot::new(hw, &Config::default());
    let (queue, engine) = engine::channel(robot, &Config::default().engine);
    let app = create_router(queue.clone());
    (queue, engine, app)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_status_of_idle_engine() {
    let (_queue, _engine, app) = setup();
    let response = app
        .oneshot(Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "Idle");
    assert_eq!(body["accepting"], true);
    assert_eq!(body["pending_groups"], 0);
}

#[tokio::test]
async fn test_command_is_enqueued() {
    let (queue, _engine, app) = setup();
    let response = app
        .oneshot(post_json("/api/v1/command", json!({ "command": "move both arms up" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["groups"], 1);
    assert_eq!(body["actions"], 2);
    assert_eq!(queue.stats().pending_groups, 1);
}

#[tokio::test]
async fn test_bad_command_is_rejected() {
    let (queue, _engine, app) = setup();
    let response = app
        .oneshot(post_json("/api/v1/command", json!({ "command": "fly away" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "unable to parse command");
    assert!(body.get("line").is_none());
    assert_eq!(queue.stats().pending_groups, 0);
}

#[tokio::test]
async fn test_program_is_compiled_and_enqueued() {
    let (queue, _engine, app) = setup();
    let program = "say hello\n[\nset both eyes on\nmove left arm 45\n]\n[\nwait 1\n";
    let response = app
        .oneshot(post_json("/api/v1/program", json!({ "program": program })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["groups"], 3);
    assert_eq!(body["actions"], 5);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(queue.stats().pending_groups, 3);
}

#[tokio::test]
async fn test_program_error_reports_line() {
    let (queue, _engine, app) = setup();
    let program = "say hello\nwait -1\n";
    let response = app
        .oneshot(post_json("/api/v1/program", json!({ "program": program })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["line"], 2);
    // Nothing from a failed program is queued.
    assert_eq!(queue.stats().pending_groups, 0);
}

#[tokio::test]
async fn test_closed_engine_is_unavailable() {
    let (_queue, engine, app) = setup();
    drop(engine);

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/command", json!({ "command": "go" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .oneshot(Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "Stopped");
    assert_eq!(body["accepting"], false);
}
