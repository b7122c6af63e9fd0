//! Remote operation of a small wheeled robot from text commands.
//!
//! Lines are parsed by [`command`], grouped into a [`program::Program`] and
//! executed group by group by the [`engine`] against a [`hardware::Actuator`],
//! normally the [`robot::Robot`].

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod hardware;
pub mod host;
pub mod motion;
pub mod program;
pub mod robot;
pub mod server;
pub mod web;

pub use command::{parse, Action, Angle, Level, ParseError, Side, ValidationError};
pub use config::{load_config, Config, ConfigError};
pub use engine::{ActionQueue, Engine, EngineStats, QueueClosed};
pub use error::HostError;
pub use hardware::{Actuator, ActuatorError, HardwareContext};
pub use program::{compile, compile_str, ActionGroup, CompileError, Program, ProgramCompiler};
pub use robot::Robot;
