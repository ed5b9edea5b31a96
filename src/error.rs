use crate::command::{ExitCode, FAILURE, NOT_FOUND};
use crate::lexer::LexingError;
use std::io;
use thiserror::Error;

const RED: &str = "\x1b[31m";
const BOLD_RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Everything that can go wrong while running a line.
///
/// None of these stop the shell: each one is reported and turned into the
/// status given by [`ShellError::status`].
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] LexingError),

    #[error("Command not found: '{0}'")]
    CommandNotFound(String),

    #[error("Error in internal command '{name}': {cause:#}")]
    Builtin {
        name: &'static str,
        cause: anyhow::Error,
    },

    #[error("Error executing '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Internal commands cannot be used in pipelines: '{0}'")]
    BuiltinInPipeline(String),

    #[error("Syntax error: empty command in pipeline")]
    EmptyStage,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;

impl ShellError {
    /// Status seen by `&&` / `||` after this error.
    pub fn status(&self) -> ExitCode {
        match self {
            ShellError::CommandNotFound(_) => NOT_FOUND,
            _ => FAILURE,
        }
    }
}

/// Print `err` to stderr so it stands out from command output.
pub fn report(err: &ShellError) {
    let color = match err {
        ShellError::CommandNotFound(_) => BOLD_RED,
        _ => RED,
    };
    log::debug!("reporting {:?}", err);
    eprintln!("{color}{err}{RESET}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ShellError::CommandNotFound("x".into()).status(), 127);
        assert_eq!(ShellError::BuiltinInPipeline("cd".into()).status(), 1);
        assert_eq!(ShellError::EmptyStage.status(), 1);
        assert_eq!(ShellError::from(LexingError::UnfinishedEscape).status(), 1);
    }

    #[test]
    fn messages_name_the_culprit() {
        let err = ShellError::Builtin {
            name: "cd",
            cause: anyhow::anyhow!("no such directory"),
        };
        assert_eq!(
            err.to_string(),
            "Error in internal command 'cd': no such directory"
        );
        assert_eq!(
            ShellError::CommandNotFound("false_cmd_xyz".into()).to_string(),
            "Command not found: 'false_cmd_xyz'"
        );
        assert_eq!(
            ShellError::from(LexingError::UnfinishedQuote('"')).to_string(),
            "Syntax error: unterminated \" quote"
        );
    }
}
