// src/command/action.rs - One actuator operation derived from a parsed command
use std::fmt;
use std::time::Duration;

use crate::hardware::{Actuator, ActuatorError};

use super::resolve::{Angle, Level, Side};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    MoveArm { side: Side, angle: Angle },
    SetEye { side: Side, level: Level },
    SetAntenna { side: Side, level: Level },
    Say(String),
    Drive { x: f64, y: f64, duration: Duration },
    Wait(Duration),
}

impl Action {
    /// Run the action to completion against the given actuator.
    pub async fn execute<A>(&self, actuator: &A) -> Result<(), ActuatorError>
    where
        A: Actuator + ?Sized,
    {
        match self {
            Action::MoveArm { side, angle } => actuator.move_arm(*side, *angle).await,
            Action::SetEye { side, level } => actuator.set_eye_state(*side, *level).await,
            Action::SetAntenna { side, level } => actuator.set_antenna_state(*side, *level).await,
            Action::Say(text) => actuator.say(text).await,
            Action::Drive { x, y, duration } => actuator.move_base(*x, *y, *duration).await,
            Action::Wait(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::MoveArm { side, angle } => write!(f, "move {side} arm to {angle}"),
            Action::SetEye { side, level } => write!(f, "set {side} eye {level}"),
            Action::SetAntenna { side, level } => write!(f, "set {side} antenna {level}"),
            Action::Say(text) => write!(f, "say {text:?}"),
            Action::Drive { x, y, duration } => {
                write!(f, "drive x={x:.2} y={y:.2} for {:.2}s", duration.as_secs_f64())
            }
            Action::Wait(duration) => write!(f, "wait {:.2}s", duration.as_secs_f64()),
        }
    }
}
