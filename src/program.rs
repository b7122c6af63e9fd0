//! Program compiler.
//!
//! Turns a sequence of lines into an ordered [`Program`] of [`ActionGroup`]s.
//! A line outside brackets becomes a group of its own; every line between a
//! `[` and the following `]` is merged into one group whose actions run
//! concurrently.
//!
//! ```text
//! say hello          -> group 1
//! [                  -> group 2 opens
//! move both arms up
//! set both eyes on
//! ]                  -> group 2 closes (4 actions)
//! ```

use std::fmt;

use thiserror::Error;

use crate::command::{self, Action, ParseError};

/// Actions that start together and complete as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionGroup {
    actions: Vec<Action>,
    line: usize,
}

impl ActionGroup {
    fn opened_at(line: usize) -> Self {
        Self {
            actions: Vec::new(),
            line,
        }
    }

    /// A group holding the actions of a single command.
    pub fn single(actions: Vec<Action>, line: usize) -> Self {
        Self { actions, line }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// 1-based source line the group starts at.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for ActionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{action}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileErrorKind {
    #[error("nested groups are not allowed")]
    NestedGroup,
    #[error("`]` without matching `[`")]
    UnmatchedClose,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error at line #{line}: {kind}")]
pub struct CompileError {
    pub line: usize,
    pub kind: CompileErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileWarning {
    UnclosedGroup { opened_at: usize },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileWarning::UnclosedGroup { opened_at } => {
                write!(f, "unclosed group (opened at line #{opened_at})")
            }
        }
    }
}

/// An ordered sequence of action groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub groups: Vec<ActionGroup>,
    pub warnings: Vec<CompileWarning>,
}

impl Program {
    pub fn action_count(&self) -> usize {
        self.groups.iter().map(ActionGroup::len).sum()
    }
}

/// Outcome of feeding one line to the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Blank line.
    Ignored,
    /// `[` opened a group.
    Opened,
    /// Actions were appended to the open group.
    Appended,
    /// A group is complete and ready to run.
    Completed(ActionGroup),
}

#[derive(Debug)]
enum State {
    Outside,
    InsideGroup(ActionGroup),
}

/// Incremental bracket-grouping state machine.
///
/// Batch compilation aborts on the first error; interactive sessions keep
/// feeding lines after an error, in which case the state is left as it was
/// before the offending line.
#[derive(Debug)]
pub struct ProgramCompiler {
    state: State,
    line: usize,
}

impl Default for ProgramCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramCompiler {
    pub fn new() -> Self {
        Self {
            state: State::Outside,
            line: 0,
        }
    }

    pub fn is_inside_group(&self) -> bool {
        matches!(self.state, State::InsideGroup(_))
    }

    /// Number of lines fed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn feed(&mut self, text: &str) -> Result<Step, CompileError> {
        self.line += 1;
        let line = self.line;
        let text = text.trim();

        match text {
            "[" => match self.state {
                State::InsideGroup(_) => Err(self.error(CompileErrorKind::NestedGroup)),
                State::Outside => {
                    self.state = State::InsideGroup(ActionGroup::opened_at(line));
                    Ok(Step::Opened)
                }
            },
            "]" => match std::mem::replace(&mut self.state, State::Outside) {
                State::InsideGroup(group) => Ok(Step::Completed(group)),
                State::Outside => Err(self.error(CompileErrorKind::UnmatchedClose)),
            },
            "" => Ok(Step::Ignored),
            _ => {
                let actions = command::parse(text).map_err(|e| self.error(e.into()))?;
                match &mut self.state {
                    State::Outside => Ok(Step::Completed(ActionGroup::single(actions, line))),
                    State::InsideGroup(group) => {
                        group.actions.extend(actions);
                        Ok(Step::Appended)
                    }
                }
            }
        }
    }

    /// End of input. Returns the trailing group if one is still open.
    pub fn finish(self) -> Option<(ActionGroup, CompileWarning)> {
        match self.state {
            State::Outside => None,
            State::InsideGroup(group) => {
                let warning = CompileWarning::UnclosedGroup { opened_at: group.line };
                tracing::warn!("{}", warning);
                Some((group, warning))
            }
        }
    }

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError { line: self.line, kind }
    }
}

/// Compile a whole line source, aborting on the first error.
pub fn compile<I, S>(lines: I) -> Result<Program, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut compiler = ProgramCompiler::new();
    let mut program = Program::default();

    for line in lines {
        if let Step::Completed(group) = compiler.feed(line.as_ref())? {
            program.groups.push(group);
        }
    }

    if let Some((group, warning)) = compiler.finish() {
        program.groups.push(group);
        program.warnings.push(warning);
    }

    tracing::debug!(
        "Compiled {} groups ({} actions)",
        program.groups.len(),
        program.action_count()
    );
    Ok(program)
}

/// Compile program text, one command per line.
pub fn compile_str(source: &str) -> Result<Program, CompileError> {
    compile(source.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Angle, Side, ValidationError};
    use std::time::Duration;

    #[test]
    fn test_bracket_group_merges_lines() {
        let program = compile(["[", "say hi", "wait 1", "]"]).unwrap();
        assert_eq!(program.groups.len(), 1);
        assert_eq!(
            program.groups[0].actions(),
            &[Action::Say("hi".to_string()), Action::Wait(Duration::from_secs(1))]
        );
        assert!(program.warnings.is_empty());
    }

    #[test]
    fn test_lines_outside_brackets_are_singletons_in_order() {
        let program = compile(["say one", "", "move both arms up", "go"]).unwrap();
        let sizes: Vec<usize> = program.groups.iter().map(ActionGroup::len).collect();
        assert_eq!(sizes, vec![1, 2, 1]);
        let lines: Vec<usize> = program.groups.iter().map(ActionGroup::line).collect();
        assert_eq!(lines, vec![1, 3, 4]);
    }

    #[test]
    fn test_nested_group_fails_at_line_two() {
        let err = compile(["[", "[", "go", "]"]).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, CompileErrorKind::NestedGroup);
        assert_eq!(err.to_string(), "Error at line #2: nested groups are not allowed");
    }

    #[test]
    fn test_stray_close_fails_at_line_one() {
        let err = compile(["]"]).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, CompileErrorKind::UnmatchedClose);
    }

    #[test]
    fn test_unclosed_group_is_kept_with_warning() {
        let program = compile(["[", "go"]).unwrap();
        assert_eq!(program.groups.len(), 1);
        assert_eq!(program.groups[0].len(), 1);
        assert!(matches!(program.groups[0].actions()[0], Action::Drive { .. }));
        assert_eq!(program.warnings, vec![CompileWarning::UnclosedGroup { opened_at: 1 }]);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = compile(["go", "", "move left arm 200"]).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(
            err.kind,
            CompileErrorKind::Parse(ParseError::InvalidParameter(ValidationError::AngleOutOfRange(_)))
        ));

        let err = compile(["fly"]).unwrap_err();
        assert_eq!(err.to_string(), "Error at line #1: unable to parse command");
    }

    #[test]
    fn test_empty_group_and_crlf_source() {
        let program = compile_str("[\r\n]\r\nmove right arm 10\r\n").unwrap();
        assert_eq!(program.groups.len(), 2);
        assert!(program.groups[0].is_empty());
        assert_eq!(
            program.groups[1].actions(),
            &[Action::MoveArm { side: Side::Right, angle: Angle::new(10).unwrap() }]
        );
    }

    #[test]
    fn test_compiler_state_survives_errors() {
        let mut compiler = ProgramCompiler::new();
        assert_eq!(compiler.feed("[").unwrap(), Step::Opened);
        assert!(compiler.feed("[").is_err());
        assert!(compiler.is_inside_group());
        assert!(compiler.feed("bogus").is_err());
        assert_eq!(compiler.feed("go").unwrap(), Step::Appended);
        match compiler.feed("]").unwrap() {
            Step::Completed(group) => assert_eq!(group.len(), 1),
            other => panic!("unexpected step {other:?}"),
        }
        assert!(compiler.feed("]").is_err());
        assert!(!compiler.is_inside_group());
        assert!(compiler.finish().is_none());
    }
}
