// src/motion/mod.rs - Base motion for the differential-drive chassis
pub mod kinematics;

pub use kinematics::{differential_drive, wheel_speeds, Direction, DriveCommand, WheelThrottle};
