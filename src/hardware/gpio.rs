// src/hardware/gpio.rs - Digital outputs for eyes and antennas
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ActuatorError;
use crate::command::Level;

#[async_trait]
pub trait GpioBackend: Send + Sync {
    /// Claim a pin as an output, driven low.
    async fn setup_output(&self, pin: u32) -> Result<(), ActuatorError>;
    async fn write(&self, pin: u32, level: Level) -> Result<(), ActuatorError>;
    /// Drive the pin low and give it back.
    async fn release(&self, pin: u32) -> Result<(), ActuatorError>;
}

/// Linux sysfs GPIO (`/sys/class/gpio`).
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }
}

#[async_trait]
impl GpioBackend for SysfsGpio {
    async fn setup_output(&self, pin: u32) -> Result<(), ActuatorError> {
        if tokio::fs::metadata(self.pin_dir(pin)).await.is_err() {
            tracing::debug!("Exporting GPIO {}", pin);
            tokio::fs::write(self.root.join("export"), pin.to_string()).await?;
        }
        tokio::fs::write(self.pin_dir(pin).join("direction"), "low").await?;
        Ok(())
    }

    async fn write(&self, pin: u32, level: Level) -> Result<(), ActuatorError> {
        let value = if level.is_high() { "1" } else { "0" };
        tracing::trace!("gpio{} <- {}", pin, value);
        tokio::fs::write(self.pin_dir(pin).join("value"), value).await?;
        Ok(())
    }

    async fn release(&self, pin: u32) -> Result<(), ActuatorError> {
        self.write(pin, Level::Low).await?;
        tokio::fs::write(self.root.join("unexport"), pin.to_string()).await?;
        Ok(())
    }
}

/// In-memory GPIO bank.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGpio {
    pins: Arc<Mutex<HashMap<u32, Level>>>,
}

impl SimulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a claimed pin.
    pub fn level(&self, pin: u32) -> Option<Level> {
        self.pins.lock().ok()?.get(&pin).copied()
    }

    pub fn claimed(&self) -> usize {
        self.pins.lock().map(|pins| pins.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GpioBackend for SimulatedGpio {
    async fn setup_output(&self, pin: u32) -> Result<(), ActuatorError> {
        let mut pins = self.pins.lock().map_err(|_| ActuatorError::Poisoned("gpio"))?;
        pins.insert(pin, Level::Low);
        Ok(())
    }

    async fn write(&self, pin: u32, level: Level) -> Result<(), ActuatorError> {
        let mut pins = self.pins.lock().map_err(|_| ActuatorError::Poisoned("gpio"))?;
        match pins.get_mut(&pin) {
            Some(current) => {
                *current = level;
                Ok(())
            }
            None => Err(ActuatorError::UnknownPin(pin)),
        }
    }

    async fn release(&self, pin: u32) -> Result<(), ActuatorError> {
        let mut pins = self.pins.lock().map_err(|_| ActuatorError::Poisoned("gpio"))?;
        pins.remove(&pin);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_simulated_gpio_requires_setup() {
        let gpio = SimulatedGpio::new();
        assert!(matches!(gpio.write(5, Level::High).await, Err(ActuatorError::UnknownPin(5))));
        gpio.setup_output(5).await.unwrap();
        assert_eq!(gpio.level(5), Some(Level::Low));
        gpio.write(5, Level::High).await.unwrap();
        assert_eq!(gpio.level(5), Some(Level::High));
        gpio.release(5).await.unwrap();
        assert_eq!(gpio.level(5), None);
    }

    #[tokio::test]
    async fn test_sysfs_gpio_writes_value_files() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("gpio17")).unwrap();
        let gpio = SysfsGpio::new(dir.path());

        gpio.setup_output(17).await.unwrap();
        let direction = std::fs::read_to_string(dir.path().join("gpio17/direction")).unwrap();
        assert_eq!(direction, "low");

        gpio.write(17, Level::High).await.unwrap();
        let value = std::fs::read_to_string(dir.path().join("gpio17/value")).unwrap();
        assert_eq!(value, "1");

        gpio.release(17).await.unwrap();
        let value = std::fs::read_to_string(dir.path().join("gpio17/value")).unwrap();
        assert_eq!(value, "0");
        let unexport = std::fs::read_to_string(dir.path().join("unexport")).unwrap();
        assert_eq!(unexport, "17");
    }
}
