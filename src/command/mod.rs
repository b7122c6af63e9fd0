// src/command/mod.rs - Text command language
pub mod action;
pub mod grammar;
pub mod resolve;

pub use action::Action;
pub use grammar::{parse, Command, ParseError, Target, GO_DURATION};
pub use resolve::{interpret_float, resolve_angle, resolve_duration, Angle, Level, Side, ValidationError};
