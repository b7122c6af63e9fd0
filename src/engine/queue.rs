// src/engine/queue.rs - Multi-producer handle onto the action group FIFO
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::program::{ActionGroup, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("action queue is closed")]
pub struct QueueClosed;

/// Counters shared between producers and the consumer.
#[derive(Debug, Default)]
pub(crate) struct EngineCounters {
    pub(crate) enqueued: AtomicU64,
    pub(crate) started: AtomicU64,
    pub(crate) completed: AtomicU64,
    pub(crate) actions_completed: AtomicU64,
    pub(crate) actions_failed: AtomicU64,
    pub(crate) busy: AtomicBool,
    pub(crate) last_completed_at: Mutex<Option<DateTime<Utc>>>,
    pub(crate) last_error: Mutex<Option<String>>,
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Groups enqueued but not yet started.
    pub pending_groups: u64,
    pub groups_completed: u64,
    pub actions_completed: u64,
    pub actions_failed: u64,
    /// A group is executing right now.
    pub busy: bool,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl EngineCounters {
    pub(crate) fn snapshot(&self) -> EngineStats {
        let enqueued = self.enqueued.load(Ordering::Acquire);
        let started = self.started.load(Ordering::Acquire);
        EngineStats {
            pending_groups: enqueued.saturating_sub(started),
            groups_completed: self.completed.load(Ordering::Acquire),
            actions_completed: self.actions_completed.load(Ordering::Acquire),
            actions_failed: self.actions_failed.load(Ordering::Acquire),
            busy: self.busy.load(Ordering::Acquire),
            last_completed_at: self.last_completed_at.lock().ok().and_then(|t| *t),
            last_error: self.last_error.lock().ok().and_then(|e| e.clone()),
        }
    }
}

/// Cloneable producer side of the queue. `enqueue` never blocks.
#[derive(Debug, Clone)]
pub struct ActionQueue {
    tx: mpsc::UnboundedSender<ActionGroup>,
    counters: Arc<EngineCounters>,
}

impl ActionQueue {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ActionGroup>, counters: Arc<EngineCounters>) -> Self {
        Self { tx, counters }
    }

    /// Append a group to the tail of the queue.
    pub fn enqueue(&self, group: ActionGroup) -> Result<(), QueueClosed> {
        // Count before sending so the consumer never sees started > enqueued.
        self.counters.enqueued.fetch_add(1, Ordering::AcqRel);
        self.tx.send(group).map_err(|_| {
            self.counters.enqueued.fetch_sub(1, Ordering::AcqRel);
            QueueClosed
        })
    }

    /// Enqueue every group of a program in order.
    pub fn enqueue_program(&self, program: Program) -> Result<usize, QueueClosed> {
        let count = program.groups.len();
        for group in program.groups {
            self.enqueue(group)?;
        }
        Ok(count)
    }

    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
