//! Command grammar.
//!
//! Each line is matched against an ordered table of rules; the first rule whose
//! shape matches the whole line decides the outcome, even if resolving its
//! parameters then fails. Keywords are matched case-insensitively, free text
//! (`say`) keeps the case it was written in.

use std::time::Duration;

use thiserror::Error;

use super::action::Action;
use super::resolve::{resolve_angle, resolve_duration, Angle, Level, Side, ValidationError};

/// Default duration of the `go` command.
pub const GO_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unable to parse command")]
    NoMatch,
    #[error(transparent)]
    InvalidParameter(#[from] ValidationError),
}

/// Which paired body part a `both` command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    One(Side),
    Both,
}

impl Target {
    fn sides(self) -> &'static [Side] {
        match self {
            Target::One(Side::Left) => &[Side::Left],
            Target::One(Side::Right) => &[Side::Right],
            Target::Both => &Side::BOTH,
        }
    }
}

/// A recognised command with its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MoveArm { target: Target, angle: Angle },
    SetEye { target: Target, level: Level },
    SetAntenna { target: Target, level: Level },
    Say(String),
    Go,
    Wait(Duration),
}

type Rule = fn(&Line<'_>) -> Option<Result<Command, ValidationError>>;

/// Rules in precedence order.
const RULES: &[(&str, Rule)] = &[
    ("move arm", move_arm),
    ("move both arms", move_both_arms),
    ("set eye", set_eye),
    ("set both eyes", set_both_eyes),
    ("set antenna", set_antenna),
    ("set both antennas", set_both_antennas),
    ("say", say),
    ("go", go),
    ("wait", wait),
];

/// A source line with a lower-cased shadow used for keyword matching.
struct Line<'a> {
    original: &'a str,
    folded: String,
}

impl<'a> Line<'a> {
    fn new(original: &'a str) -> Self {
        Self {
            original,
            folded: original.to_ascii_lowercase(),
        }
    }

    /// Space-separated words of the folded line; doubled spaces yield empty words.
    fn words(&self) -> Vec<&str> {
        self.folded.split(' ').collect()
    }

    /// Original-case remainder after a keyword prefix, if non-empty.
    fn rest_after(&self, prefix: &str) -> Option<&'a str> {
        if self.folded.starts_with(prefix) && self.original.len() > prefix.len() {
            // ASCII folding preserves byte offsets.
            Some(&self.original[prefix.len()..])
        } else {
            None
        }
    }
}

fn is_angle_token(token: &str) -> bool {
    matches!(token, "up" | "down" | "out")
        || (!token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
}

fn move_arm(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    match line.words().as_slice() {
        ["move", side, "arm", angle] if is_angle_token(angle) => {
            let side = Side::resolve(side)?;
            Some(resolve_angle(angle).map(|angle| Command::MoveArm {
                target: Target::One(side),
                angle,
            }))
        }
        _ => None,
    }
}

fn move_both_arms(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    match line.words().as_slice() {
        ["move", "both", "arms", angle] if is_angle_token(angle) => Some(
            resolve_angle(angle).map(|angle| Command::MoveArm {
                target: Target::Both,
                angle,
            }),
        ),
        _ => None,
    }
}

fn set_eye(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    match line.words().as_slice() {
        ["set", side, "eye", level] => Some(Ok(Command::SetEye {
            target: Target::One(Side::resolve(side)?),
            level: Level::resolve(level)?,
        })),
        _ => None,
    }
}

fn set_both_eyes(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    match line.words().as_slice() {
        ["set", "both", "eyes", level] => Some(Ok(Command::SetEye {
            target: Target::Both,
            level: Level::resolve(level)?,
        })),
        _ => None,
    }
}

fn set_antenna(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    match line.words().as_slice() {
        ["set", side, "ear" | "antenna", level] => Some(Ok(Command::SetAntenna {
            target: Target::One(Side::resolve(side)?),
            level: Level::resolve(level)?,
        })),
        _ => None,
    }
}

fn set_both_antennas(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    match line.words().as_slice() {
        ["set", "both", "ears" | "antennas" | "antennae", level] => Some(Ok(Command::SetAntenna {
            target: Target::Both,
            level: Level::resolve(level)?,
        })),
        _ => None,
    }
}

fn say(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    line.rest_after("say ")
        .map(|text| Ok(Command::Say(text.to_string())))
}

fn go(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    (line.folded == "go").then_some(Ok(Command::Go))
}

fn wait(line: &Line<'_>) -> Option<Result<Command, ValidationError>> {
    line.rest_after("wait ")
        .map(|text| resolve_duration(text).map(Command::Wait))
}

impl Command {
    /// Match one line against the grammar.
    pub fn parse(text: &str) -> Result<Command, ParseError> {
        let line = Line::new(text);
        for (name, rule) in RULES {
            if let Some(result) = rule(&line) {
                tracing::trace!("'{}' matched rule '{}'", text, name);
                return result.map_err(ParseError::from);
            }
        }
        Err(ParseError::NoMatch)
    }

    /// Expand the command into the actions it performs, one per addressed side.
    pub fn into_actions(self) -> Vec<Action> {
        match self {
            Command::MoveArm { target, angle } => target
                .sides()
                .iter()
                .map(|&side| Action::MoveArm { side, angle })
                .collect(),
            Command::SetEye { target, level } => target
                .sides()
                .iter()
                .map(|&side| Action::SetEye { side, level })
                .collect(),
            Command::SetAntenna { target, level } => target
                .sides()
                .iter()
                .map(|&side| Action::SetAntenna { side, level })
                .collect(),
            Command::Say(text) => vec![Action::Say(text)],
            Command::Go => vec![Action::Drive {
                x: 0.0,
                y: 1.0,
                duration: GO_DURATION,
            }],
            Command::Wait(duration) => vec![Action::Wait(duration)],
        }
    }
}

/// Parse one line into the one or two actions it describes.
pub fn parse(line: &str) -> Result<Vec<Action>, ParseError> {
    Command::parse(line).map(Command::into_actions)
}
