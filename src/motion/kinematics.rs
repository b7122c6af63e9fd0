// src/motion/kinematics.rs
use std::fmt;

use crate::command::ValidationError;

/// Rotation direction of one wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Throttle for one wheel: direction plus magnitude in percent (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelThrottle {
    pub direction: Direction,
    pub percent: u8,
}

impl WheelThrottle {
    /// Scale a mixed wheel speed in `[-1, 1]` to a throttle.
    pub fn from_speed(speed: f64) -> Self {
        let direction = if speed < 0.0 { Direction::Reverse } else { Direction::Forward };
        let percent = (speed.abs().min(1.0) * 100.0).round() as u8;
        Self { direction, percent }
    }

    fn wire(&self) -> String {
        let dir = match self.direction {
            Direction::Forward => 'F',
            Direction::Reverse => 'R',
        };
        format!("{}{:03}", dir, self.percent)
    }
}

/// Command for the motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCommand {
    /// Remove power from both motors (no holding torque).
    Disable,
    Drive { left: WheelThrottle, right: WheelThrottle },
}

impl DriveCommand {
    /// Encode for the motor controller's line protocol.
    ///
    /// `M1` is the left wheel, `M2` the right one; `MD` disables both.
    pub fn to_wire(&self) -> String {
        match self {
            DriveCommand::Disable => "MD\r\n".to_string(),
            DriveCommand::Drive { left, right } => {
                format!("M1:{}\r\nM2:{}\r\n", left.wire(), right.wire())
            }
        }
    }
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveCommand::Disable => f.write_str("disable"),
            DriveCommand::Drive { left, right } => {
                write!(f, "drive L={}{}% R={}{}%",
                    if left.direction == Direction::Reverse { "-" } else { "+" }, left.percent,
                    if right.direction == Direction::Reverse { "-" } else { "+" }, right.percent)
            }
        }
    }
}

/// Mix a joystick-style `(x, y)` into left/right wheel speeds, each in `[-1, 1]`.
///
/// `x` is the lateral axis (positive turns right), `y` the forward axis.
pub fn wheel_speeds(x: f64, y: f64) -> Result<(f64, f64), ValidationError> {
    check_axis('x', x)?;
    check_axis('y', y)?;

    // The mixing formula expects a positive lateral input to turn left.
    let lateral = -x;
    let v = y * (2.0 - lateral.abs());
    let w = lateral * (2.0 - y.abs());
    let left = (v - w) / 2.0;
    let right = (v + w) / 2.0;
    Ok((left, right))
}

/// Differential-drive command for `(x, y)`; the origin disables the motors.
pub fn differential_drive(x: f64, y: f64) -> Result<DriveCommand, ValidationError> {
    let (left, right) = wheel_speeds(x, y)?;
    if x == 0.0 && y == 0.0 {
        return Ok(DriveCommand::Disable);
    }
    Ok(DriveCommand::Drive {
        left: WheelThrottle::from_speed(left),
        right: WheelThrottle::from_speed(right),
    })
}

fn check_axis(axis: char, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (-1.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::AxisOutOfRange { axis, value })
    }
}
