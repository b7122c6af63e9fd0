// src/hardware/motor.rs - Motor controller connection
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serial2_tokio::SerialPort;
use tokio::sync::Mutex;

use super::ActuatorError;
use crate::motion::DriveCommand;

#[async_trait]
pub trait MotorDriver: Send + Sync {
    async fn send(&self, command: DriveCommand) -> Result<(), ActuatorError>;
}

/// Serial connection statistics
#[derive(Debug, Clone, Default)]
pub struct SerialStats {
    pub commands_sent: u64,
    pub bytes_sent: u64,
    pub errors: u64,
}

/// Motor controller on a serial line.
pub struct SerialMotorDriver {
    port: Mutex<SerialPort>,
    port_name: String,
    write_timeout: Duration,
    stats: Mutex<SerialStats>,
}

impl SerialMotorDriver {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, ActuatorError> {
        tracing::info!("Connecting to motor controller on {} at {} baud", port_name, baud_rate);
        let port = SerialPort::open(port_name, baud_rate).map_err(|e| ActuatorError::Serial {
            port: port_name.to_string(),
            source: e,
        })?;
        Ok(Self {
            port: Mutex::new(port),
            port_name: port_name.to_string(),
            write_timeout: Duration::from_secs(1),
            stats: Mutex::new(SerialStats::default()),
        })
    }

    pub async fn stats(&self) -> SerialStats {
        self.stats.lock().await.clone()
    }
}

#[async_trait]
impl MotorDriver for SerialMotorDriver {
    async fn send(&self, command: DriveCommand) -> Result<(), ActuatorError> {
        let wire = command.to_wire();
        tracing::debug!("Motor TX: {}", wire.trim_end());

        let result = {
            let port = self.port.lock().await;
            tokio::time::timeout(self.write_timeout, port.write_all(wire.as_bytes())).await
        };

        let mut stats = self.stats.lock().await;
        match result {
            Ok(Ok(())) => {
                stats.commands_sent += 1;
                stats.bytes_sent += wire.len() as u64;
                Ok(())
            }
            Ok(Err(e)) => {
                stats.errors += 1;
                tracing::error!("Serial write error on {}: {}", self.port_name, e);
                Err(ActuatorError::Serial { port: self.port_name.clone(), source: e })
            }
            Err(_) => {
                stats.errors += 1;
                tracing::error!("Serial write timeout on {}", self.port_name);
                Err(ActuatorError::Timeout(self.write_timeout))
            }
        }
    }
}

impl std::fmt::Debug for SerialMotorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialMotorDriver")
            .field("port", &self.port_name)
            .finish()
    }
}

/// Motor driver that records commands instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct SimulatedMotorDriver {
    sent: Arc<StdMutex<Vec<DriveCommand>>>,
}

impl SimulatedMotorDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<DriveCommand> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<DriveCommand> {
        self.sent.lock().ok()?.last().copied()
    }
}

#[async_trait]
impl MotorDriver for SimulatedMotorDriver {
    async fn send(&self, command: DriveCommand) -> Result<(), ActuatorError> {
        tracing::trace!("motor <- {}", command);
        self.sent
            .lock()
            .map_err(|_| ActuatorError::Poisoned("motor"))?
            .push(command);
        Ok(())
    }
}
