// src/host.rs - Long-running host: engine, control server and HTTP API
use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::engine;
use crate::error::HostError;
use crate::hardware::{Actuator, ActuatorError, HardwareContext};
use crate::robot::Robot;
use crate::{server, web};

/// Run the host until `shutdown` resolves, then stop every front end and
/// release the hardware.
///
/// Listeners are bound before `open_hardware` is called, so a bind failure
/// returns without claiming any output.
pub async fn serve<H, S>(config: &Config, open_hardware: H, shutdown: S) -> Result<(), HostError>
where
    H: FnOnce() -> Result<HardwareContext, ActuatorError>,
    S: Future<Output = std::io::Result<()>>,
{
    let listener = TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    let http_listener = if config.http.enabled {
        Some(TcpListener::bind((config.http.bind.as_str(), config.http.port)).await?)
    } else {
        None
    };

    let robot = Robot::new(open_hardware()?, config);
    if let Err(e) = robot.initialize().await {
        tracing::error!("Hardware initialization failed: {}", e);
        if let Err(e) = robot.shutdown().await {
            tracing::error!("Failed to release hardware: {}", e);
        }
        return Err(e.into());
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let (queue, engine) = engine::channel(robot, &config.engine);
    let engine_task = tokio::spawn(engine.run(shutdown_tx.subscribe()));
    let server_task = tokio::spawn(server::serve(listener, queue.clone(), shutdown_tx.subscribe()));

    let http_task = match http_listener {
        Some(listener) => {
            if let Ok(addr) = listener.local_addr() {
                tracing::info!("Web API listening on http://{}", addr);
            }
            let app = web::api::create_router(queue.clone());
            let mut stop = shutdown_tx.subscribe();
            Some(tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = stop.recv().await;
                    })
                    .await
            }))
        }
        None => None,
    };
    drop(queue);

    let signal = shutdown.await;
    let _ = shutdown_tx.send(());

    // The engine releases the hardware whatever happened to the front ends.
    let server_result = server_task.await;
    let http_result = match http_task {
        Some(task) => Some(task.await),
        None => None,
    };
    engine_task.await??;

    signal?;
    server_result??;
    if let Some(result) = http_result {
        result??;
    }
    Ok(())
}
