// src/robot.rs - The robot body: arms, eyes, antennas, voice and wheels
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::command::{Angle, Level, Side};
use crate::config::{Config, GpioConfig, TimingConfig};
use crate::hardware::{effective_angle, Actuator, ActuatorError, HardwareContext, Orientation};
use crate::motion::{differential_drive, DriveCommand};

struct ArmServo {
    channel: u8,
    orientation: Orientation,
    position: Mutex<Angle>,
}

/// [`Actuator`] implementation over a [`HardwareContext`].
pub struct Robot {
    hw: HardwareContext,
    arms: [ArmServo; 2],
    gpio: GpioConfig,
    timing: TimingConfig,
    drive: Mutex<()>,
}

impl Robot {
    pub fn new(hw: HardwareContext, config: &Config) -> Self {
        let arm = |side: Side| {
            let arm = config.arms.arm(side);
            ArmServo {
                channel: arm.channel,
                orientation: arm.orientation,
                position: Mutex::new(arm.initial_angle),
            }
        };
        Self {
            hw,
            arms: [arm(Side::Left), arm(Side::Right)],
            gpio: config.gpio.clone(),
            timing: config.timing.clone(),
            drive: Mutex::new(()),
        }
    }

    /// Open the configured backends and build the robot.
    pub fn from_config(config: &Config) -> Result<Self, ActuatorError> {
        Ok(Self::new(HardwareContext::from_config(config)?, config))
    }

    /// Claim outputs and put every actuator in its resting state.
    pub async fn initialize(&self) -> Result<(), ActuatorError> {
        tracing::info!("Initializing robot hardware");
        for pin in self.gpio.pins() {
            self.hw.gpio.setup_output(pin).await?;
        }
        for arm in &self.arms {
            let position = *arm.position.lock().await;
            self.hw
                .servos
                .set_angle(arm.channel, effective_angle(arm.orientation, position))
                .await?;
        }
        self.hw.motors.send(DriveCommand::Disable).await?;
        tracing::info!("Robot hardware ready");
        Ok(())
    }

    /// Last commanded angle of an arm.
    pub async fn arm_position(&self, side: Side) -> Angle {
        *self.arms[side.index()].position.lock().await
    }

    async fn set_output(&self, pin: u32, level: Level) -> Result<(), ActuatorError> {
        tokio::time::sleep(self.timing.settle()).await;
        self.hw.gpio.write(pin, level).await
    }
}

#[async_trait]
impl Actuator for Robot {
    async fn move_arm(&self, side: Side, angle: Angle) -> Result<(), ActuatorError> {
        let arm = &self.arms[side.index()];
        let mut position = arm.position.lock().await;
        tracing::debug!("Moving {} arm {} -> {}", side, *position, angle);

        let target = angle.degrees();
        while position.degrees() != target {
            let next = if position.degrees() < target {
                position.degrees() + 1
            } else {
                position.degrees() - 1
            };
            let next = Angle::new(next as u16)?;
            self.hw
                .servos
                .set_angle(arm.channel, effective_angle(arm.orientation, next))
                .await?;
            *position = next;
            tokio::time::sleep(self.timing.arm_tick()).await;
        }
        Ok(())
    }

    async fn set_eye_state(&self, side: Side, level: Level) -> Result<(), ActuatorError> {
        tracing::debug!("Setting {} eye {}", side, level);
        self.set_output(self.gpio.eye_pin(side), level).await
    }

    async fn set_antenna_state(&self, side: Side, level: Level) -> Result<(), ActuatorError> {
        tracing::debug!("Setting {} antenna {}", side, level);
        self.set_output(self.gpio.antenna_pin(side), level).await
    }

    async fn say(&self, text: &str) -> Result<(), ActuatorError> {
        self.hw.speech.speak(text).await
    }

    async fn move_base(&self, x: f64, y: f64, duration: Duration) -> Result<(), ActuatorError> {
        let command = differential_drive(x, y)?;
        let _drive = self.drive.lock().await;
        tracing::debug!("Base {} for {:.2}s", command, duration.as_secs_f64());
        self.hw.motors.send(command).await?;
        tokio::time::sleep(duration).await;
        self.hw.motors.send(DriveCommand::Disable).await
    }

    async fn shutdown(&self) -> Result<(), ActuatorError> {
        tracing::info!("Shutting down robot hardware");
        let mut first_error = None;

        if let Err(e) = self.hw.motors.send(DriveCommand::Disable).await {
            tracing::error!("Failed to disable motors: {}", e);
            first_error.get_or_insert(e);
        }
        for pin in self.gpio.pins() {
            if let Err(e) = self.hw.gpio.release(pin).await {
                tracing::error!("Failed to release GPIO {}: {}", pin, e);
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.hw.servos.release().await {
            tracing::error!("Failed to release servos: {}", e);
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
