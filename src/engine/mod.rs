//! Action execution engine.
//!
//! Producers push [`ActionGroup`]s through an [`ActionQueue`]; a single
//! [`Engine`] consumer pops them in FIFO order. All actions of a group start
//! together and the next group is only dequeued once every one of them has
//! finished, so groups act as a barrier. A failing action is logged and
//! counted; it neither cancels its siblings nor stops the consumer.

mod queue;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::command::Action;
use crate::config::EngineConfig;
use crate::hardware::{Actuator, ActuatorError};
use crate::program::ActionGroup;

pub use queue::{ActionQueue, EngineStats, QueueClosed};
use queue::EngineCounters;

/// Single consumer of the action queue; sole owner of the actuator.
pub struct Engine<A> {
    actuator: A,
    rx: mpsc::UnboundedReceiver<ActionGroup>,
    counters: Arc<EngineCounters>,
    action_timeout: Option<Duration>,
}

/// Create a queue handle and the engine that drains it.
pub fn channel<A: Actuator>(actuator: A, config: &EngineConfig) -> (ActionQueue, Engine<A>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let counters = Arc::new(EngineCounters::default());
    let engine = Engine {
        actuator,
        rx,
        counters: counters.clone(),
        action_timeout: config.action_timeout(),
    };
    (ActionQueue::new(tx, counters), engine)
}

impl<A: Actuator> Engine<A> {
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Consume groups until shutdown is signalled or every producer is gone
    /// and the queue is drained, then bring the hardware to a safe state.
    ///
    /// A signal (or the shutdown sender being dropped) interrupts the group
    /// in flight at its next suspension point.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<EngineStats, ActuatorError> {
        tracing::info!("Action engine started");
        loop {
            let group = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Action engine shutting down");
                    break;
                }
                next = self.rx.recv() => match next {
                    Some(group) => group,
                    None => {
                        tracing::info!("Action queue closed and drained");
                        break;
                    }
                },
            };

            let interrupted = tokio::select! {
                biased;
                _ = shutdown.recv() => true,
                _ = self.execute_group(&group) => false,
            };
            if interrupted {
                tracing::warn!("Shutdown interrupted group from line #{}", group.line());
                self.counters.busy.store(false, Ordering::Release);
                break;
            }
        }

        let stats = self.counters.snapshot();
        tracing::info!(
            "Engine stopped: {} groups completed, {} actions completed, {} failed",
            stats.groups_completed,
            stats.actions_completed,
            stats.actions_failed
        );
        self.actuator.shutdown().await?;
        Ok(stats)
    }

    async fn execute_group(&self, group: &ActionGroup) {
        self.counters.started.fetch_add(1, Ordering::AcqRel);
        self.counters.busy.store(true, Ordering::Release);
        tracing::debug!("Executing group from line #{}: {}", group.line(), group);

        let start = Instant::now();
        let results = join_all(group.actions().iter().map(|action| self.execute_action(action))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();

        tracing::debug!(
            "Group from line #{} finished in {:.3}s ({} of {} actions failed)",
            group.line(),
            start.elapsed().as_secs_f64(),
            failed,
            results.len()
        );
        if let Ok(mut last) = self.counters.last_completed_at.lock() {
            *last = Some(Utc::now());
        }
        self.counters.completed.fetch_add(1, Ordering::AcqRel);
        self.counters.busy.store(false, Ordering::Release);
    }

    async fn execute_action(&self, action: &Action) -> Result<(), ActuatorError> {
        tracing::trace!("Starting action: {}", action);
        let run = action.execute(&self.actuator);
        let result = match self.action_timeout {
            None => run.await,
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    if matches!(action, Action::Drive { .. }) {
                        // The abandoned drive never reached its own disable.
                        if let Err(e) = self.actuator.move_base(0.0, 0.0, Duration::ZERO).await {
                            tracing::error!("Failed to stop base after timeout: {}", e);
                        }
                    }
                    Err(ActuatorError::Timeout(limit))
                }
            },
        };

        match &result {
            Ok(()) => {
                self.counters.actions_completed.fetch_add(1, Ordering::AcqRel);
            }
            Err(e) => {
                self.counters.actions_failed.fetch_add(1, Ordering::AcqRel);
                tracing::warn!("Action '{}' failed: {}", action, e);
                if let Ok(mut last) = self.counters.last_error.lock() {
                    *last = Some(format!("{}: {}", action, e));
                }
            }
        }
        result
    }
}
