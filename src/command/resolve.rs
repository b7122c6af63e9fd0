// src/command/resolve.rs - Textual parameter resolution for robot commands
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to turn a textual token into a usable parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("angle out of range: {0} (must be between 0 and 180, inclusive)")]
    AngleOutOfRange(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("duration must not be negative: {0}")]
    NegativeDuration(f64),
    #[error("{axis} axis out of range: {value} (must be between -1 and 1)")]
    AxisOutOfRange { axis: char, value: f64 },
}

/// Servo angle in whole degrees, always within `0..=180`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Angle(u8);

impl Angle {
    pub const MAX: u8 = 180;
    pub const UP: Angle = Angle(0);
    pub const OUT: Angle = Angle(90);
    pub const DOWN: Angle = Angle(180);

    pub fn new(degrees: u16) -> Result<Self, ValidationError> {
        if degrees <= Self::MAX as u16 {
            Ok(Angle(degrees as u8))
        } else {
            Err(ValidationError::AngleOutOfRange(degrees.to_string()))
        }
    }

    pub fn degrees(self) -> u8 {
        self.0
    }
}

impl TryFrom<u16> for Angle {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Angle::new(value)
    }
}

impl From<Angle> for u16 {
    fn from(angle: Angle) -> Self {
        angle.0 as u16
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Which of the two symmetric body parts a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn resolve(text: &str) -> Option<Side> {
        match text {
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Digital output level for eyes and antennas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn resolve(text: &str) -> Option<Level> {
        match text {
            "on" => Some(Level::High),
            "off" => Some(Level::Low),
            _ => None,
        }
    }

    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::High => f.write_str("on"),
            Level::Low => f.write_str("off"),
        }
    }
}

/// Resolve an arm position token: `up`, `down`, `out` or a whole number of degrees.
pub fn resolve_angle(text: &str) -> Result<Angle, ValidationError> {
    match text {
        "up" => Ok(Angle::UP),
        "down" => Ok(Angle::DOWN),
        "out" => Ok(Angle::OUT),
        _ => {
            let degrees: i64 = text
                .parse()
                .map_err(|_| ValidationError::AngleOutOfRange(text.to_string()))?;
            u16::try_from(degrees)
                .map_err(|_| ValidationError::AngleOutOfRange(text.to_string()))
                .and_then(Angle::new)
        }
    }
}

/// Parse a real number, optionally rejecting negative values.
pub fn interpret_float(text: &str, ensure_positive: bool) -> Result<f64, ValidationError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidNumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(ValidationError::InvalidNumber(text.to_string()));
    }
    if ensure_positive && value < 0.0 {
        return Err(ValidationError::NegativeDuration(value));
    }
    Ok(value)
}

/// Resolve a `wait` argument into a sleep duration.
pub fn resolve_duration(text: &str) -> Result<Duration, ValidationError> {
    let seconds = interpret_float(text, true)?;
    Duration::try_from_secs_f64(seconds).map_err(|_| ValidationError::InvalidNumber(text.to_string()))
}
