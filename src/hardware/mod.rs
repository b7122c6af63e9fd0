// src/hardware/mod.rs - Actuator boundary and hardware context
pub mod gpio;
pub mod motor;
pub mod servo;
pub mod speech;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::command::{Angle, Level, Side, ValidationError};
use crate::config::{Config, GpioBackendKind, MotorBackendKind, SpeechBackendKind};

pub use gpio::{GpioBackend, SimulatedGpio, SysfsGpio};
pub use motor::{MotorDriver, SerialMotorDriver, SimulatedMotorDriver};
pub use servo::{effective_angle, Orientation, ServoDriver, SimulatedServoDriver};
pub use speech::{CommandSpeech, SimulatedSpeech, SpeechPlayer};

/// Failure reported by an actuator backend while executing an action.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial error on {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Speech error: {0}")]
    Speech(String),
    #[error("Invalid value: {0}")]
    Validation(#[from] ValidationError),
    #[error("GPIO pin {0} is not configured as an output")]
    UnknownPin(u32),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0} backend state poisoned")]
    Poisoned(&'static str),
}

/// Capabilities the execution engine drives.
///
/// Every operation suspends until the physical effect is complete and is
/// idempotent for a repeated target.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Ramp an arm to `angle`, one degree per tick.
    async fn move_arm(&self, side: Side, angle: Angle) -> Result<(), ActuatorError>;
    async fn set_eye_state(&self, side: Side, level: Level) -> Result<(), ActuatorError>;
    async fn set_antenna_state(&self, side: Side, level: Level) -> Result<(), ActuatorError>;
    async fn say(&self, text: &str) -> Result<(), ActuatorError>;
    /// Drive at `(x, y)` for `duration`, then disable the motors.
    async fn move_base(&self, x: f64, y: f64, duration: Duration) -> Result<(), ActuatorError>;
    /// Bring every output to a safe state: motors disabled, digital outputs low.
    async fn shutdown(&self) -> Result<(), ActuatorError>;
}

/// Exclusive handles to every hardware backend, built once at startup.
pub struct HardwareContext {
    pub gpio: Box<dyn GpioBackend>,
    pub servos: Box<dyn ServoDriver>,
    pub motors: Box<dyn MotorDriver>,
    pub speech: Box<dyn SpeechPlayer>,
}

impl HardwareContext {
    pub fn new(
        gpio: Box<dyn GpioBackend>,
        servos: Box<dyn ServoDriver>,
        motors: Box<dyn MotorDriver>,
        speech: Box<dyn SpeechPlayer>,
    ) -> Self {
        Self { gpio, servos, motors, speech }
    }

    /// Open the backends selected in the configuration.
    pub fn from_config(config: &Config) -> Result<Self, ActuatorError> {
        let gpio: Box<dyn GpioBackend> = match config.gpio.backend {
            GpioBackendKind::Simulated => Box::new(SimulatedGpio::new()),
            GpioBackendKind::Sysfs => Box::new(SysfsGpio::new(&config.gpio.sysfs_root)),
        };
        let motors: Box<dyn MotorDriver> = match config.motor.backend {
            MotorBackendKind::Simulated => Box::new(SimulatedMotorDriver::new()),
            MotorBackendKind::Serial => {
                Box::new(SerialMotorDriver::open(&config.motor.port, config.motor.baud)?)
            }
        };
        let speech: Box<dyn SpeechPlayer> = match config.speech.backend {
            SpeechBackendKind::Simulated => Box::new(SimulatedSpeech::new()),
            SpeechBackendKind::Command => Box::new(CommandSpeech::new(
                config.speech.program.clone(),
                config.speech.args.clone(),
            )),
        };
        tracing::info!(
            "Hardware backends: gpio={:?} motor={:?} speech={:?}",
            config.gpio.backend,
            config.motor.backend,
            config.speech.backend
        );
        Ok(Self::new(gpio, Box::new(SimulatedServoDriver::new()), motors, speech))
    }
}

impl std::fmt::Debug for HardwareContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareContext").finish_non_exhaustive()
    }
}
