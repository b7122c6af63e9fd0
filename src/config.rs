//! # Robot Configuration
//!
//! Everything the host needs to know about the robot it drives: where the
//! control server listens, how the arms are wired to the servo driver, which
//! GPIO lines light the eyes and antennas, and which backend serves each
//! actuator.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! port = 5656
//!
//! [arms.right]
//! channel = 1
//! orientation = "inverted"
//!
//! [gpio]
//! backend = "sysfs"
//! left_eye = 17
//!
//! [motor]
//! backend = "serial"
//! port = "/dev/ttyUSB0"
//! ```
//!
//! Every field has a default, so an empty file (or no file) yields a robot
//! with simulated backends.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::command::{Angle, Side};
use crate::hardware::servo::Orientation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the robot host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub arms: ArmsConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Line-oriented control server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Optional HTTP status/command API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_bind(),
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Upper bound on a single action; unbounded when absent.
    #[serde(default)]
    pub action_timeout_secs: Option<f64>,
}

impl EngineConfig {
    /// Per-action bound as a `Duration`.
    ///
    /// Values that cannot form a positive `Duration` (negative, zero, NaN or
    /// too large) are treated as unbounded; `Config::validate` rejects them.
    pub fn action_timeout(&self) -> Option<Duration> {
        let secs = self.action_timeout_secs?;
        match Duration::try_from_secs_f64(secs) {
            Ok(limit) if !limit.is_zero() => Some(limit),
            _ => {
                tracing::warn!("Ignoring unusable action timeout: {}s", secs);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Interval between one-degree arm steps.
    #[serde(default = "default_arm_tick_ms")]
    pub arm_tick_ms: u64,
    /// Delay before an eye or antenna output changes.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl TimingConfig {
    pub fn arm_tick(&self) -> Duration {
        Duration::from_millis(self.arm_tick_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            arm_tick_ms: default_arm_tick_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArmsConfig {
    #[serde(default = "default_left_arm")]
    pub left: ArmConfig,
    #[serde(default = "default_right_arm")]
    pub right: ArmConfig,
}

impl ArmsConfig {
    pub fn arm(&self, side: Side) -> &ArmConfig {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl Default for ArmsConfig {
    fn default() -> Self {
        Self {
            left: default_left_arm(),
            right: default_right_arm(),
        }
    }
}

/// One arm servo on the servo driver board.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArmConfig {
    pub channel: u8,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_initial_angle")]
    pub initial_angle: Angle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioBackendKind {
    #[default]
    Simulated,
    Sysfs,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GpioConfig {
    #[serde(default)]
    pub backend: GpioBackendKind,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,
    #[serde(default = "default_left_eye")]
    pub left_eye: u32,
    #[serde(default = "default_right_eye")]
    pub right_eye: u32,
    #[serde(default = "default_left_antenna")]
    pub left_antenna: u32,
    #[serde(default = "default_right_antenna")]
    pub right_antenna: u32,
}

impl GpioConfig {
    pub fn eye_pin(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left_eye,
            Side::Right => self.right_eye,
        }
    }

    pub fn antenna_pin(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left_antenna,
            Side::Right => self.right_antenna,
        }
    }

    pub fn pins(&self) -> [u32; 4] {
        [self.left_eye, self.right_eye, self.left_antenna, self.right_antenna]
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            backend: GpioBackendKind::default(),
            sysfs_root: default_sysfs_root(),
            left_eye: default_left_eye(),
            right_eye: default_right_eye(),
            left_antenna: default_left_antenna(),
            right_antenna: default_right_antenna(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorBackendKind {
    #[default]
    Simulated,
    Serial,
}

/// Motor controller on a serial line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotorConfig {
    #[serde(default)]
    pub backend: MotorBackendKind,
    #[serde(default = "default_motor_port")]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            backend: MotorBackendKind::default(),
            port: default_motor_port(),
            baud: default_baud(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackendKind {
    #[default]
    Simulated,
    Command,
}

/// Speech playback through an external program that receives the text as its last argument.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub backend: SpeechBackendKind,
    #[serde(default = "default_speech_program")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: SpeechBackendKind::default(),
            program: default_speech_program(),
            args: Vec::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pins = self.gpio.pins();
        for (i, pin) in pins.iter().enumerate() {
            if pins[..i].contains(pin) {
                return Err(ConfigError::Invalid(format!("GPIO pin {} is assigned twice", pin)));
            }
        }
        if self.arms.left.channel == self.arms.right.channel {
            return Err(ConfigError::Invalid(format!(
                "Both arms use servo channel {}",
                self.arms.left.channel
            )));
        }
        if self.timing.arm_tick_ms == 0 {
            return Err(ConfigError::Invalid("timing.arm_tick_ms must be > 0".to_string()));
        }
        if let Some(timeout) = self.engine.action_timeout_secs {
            let representable = Duration::try_from_secs_f64(timeout).is_ok_and(|d| !d.is_zero());
            if !(timeout.is_finite() && timeout > 0.0 && representable) {
                return Err(ConfigError::Invalid(format!(
                    "engine.action_timeout_secs must be a positive number of seconds, got {}",
                    timeout
                )));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_bind() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5656 }
fn default_http_port() -> u16 { 3000 }
fn default_arm_tick_ms() -> u64 { 10 }
fn default_settle_ms() -> u64 { 50 }
fn default_initial_angle() -> Angle { Angle::OUT }
fn default_left_arm() -> ArmConfig {
    ArmConfig { channel: 0, orientation: Orientation::Normal, initial_angle: default_initial_angle() }
}
fn default_right_arm() -> ArmConfig {
    ArmConfig { channel: 1, orientation: Orientation::Inverted, initial_angle: default_initial_angle() }
}
fn default_sysfs_root() -> String { "/sys/class/gpio".to_string() }
fn default_left_eye() -> u32 { 17 }
fn default_right_eye() -> u32 { 27 }
fn default_left_antenna() -> u32 { 22 }
fn default_right_antenna() -> u32 { 23 }
fn default_motor_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud() -> u32 { 9600 }
fn default_speech_program() -> String { "espeak".to_string() }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}
