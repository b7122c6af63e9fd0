// src/hardware/servo.rs - Arm servo output
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ActuatorError;
use crate::command::Angle;

/// How a servo is mounted relative to the arm it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Normal,
    Inverted,
}

/// Map an arm angle to the angle the servo must be driven to.
pub fn effective_angle(orientation: Orientation, angle: Angle) -> Angle {
    match orientation {
        Orientation::Normal => angle,
        // 180 - a is always within range.
        Orientation::Inverted => Angle::new(Angle::MAX as u16 - angle.degrees() as u16).unwrap_or(angle),
    }
}

/// Servo driver board, addressed by channel.
#[async_trait]
pub trait ServoDriver: Send + Sync {
    async fn set_angle(&self, channel: u8, angle: Angle) -> Result<(), ActuatorError>;

    /// Stop driving every channel.
    async fn release(&self) -> Result<(), ActuatorError> {
        Ok(())
    }
}

/// In-memory servo driver that records every position written.
#[derive(Debug, Clone, Default)]
pub struct SimulatedServoDriver {
    inner: Arc<Mutex<ServoLog>>,
}

#[derive(Debug, Default)]
struct ServoLog {
    positions: HashMap<u8, Angle>,
    writes: Vec<(u8, Angle)>,
    released: bool,
}

impl SimulatedServoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, channel: u8) -> Option<Angle> {
        self.inner.lock().ok()?.positions.get(&channel).copied()
    }

    /// Every `(channel, angle)` written, in order.
    pub fn writes(&self) -> Vec<(u8, Angle)> {
        self.inner.lock().map(|log| log.writes.clone()).unwrap_or_default()
    }

    pub fn is_released(&self) -> bool {
        self.inner.lock().map(|log| log.released).unwrap_or(false)
    }
}

#[async_trait]
impl ServoDriver for SimulatedServoDriver {
    async fn set_angle(&self, channel: u8, angle: Angle) -> Result<(), ActuatorError> {
        tracing::trace!("servo[{}] <- {}", channel, angle);
        let mut log = self.inner.lock().map_err(|_| ActuatorError::Poisoned("servo"))?;
        log.positions.insert(channel, angle);
        log.writes.push((channel, angle));
        log.released = false;
        Ok(())
    }

    async fn release(&self) -> Result<(), ActuatorError> {
        let mut log = self.inner.lock().map_err(|_| ActuatorError::Poisoned("servo"))?;
        log.released = true;
        Ok(())
    }
}
