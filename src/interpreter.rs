use crate::builtin::Builtin;
use crate::command::{ExitCode, Outcome, Output, SUCCESS};
use crate::env::{Environment, is_identifier};
use crate::error::{self, ShellError, ShellResult};
use crate::evaluator;
use crate::expand::expand_vars;
use crate::external::ExternalCommand;
use crate::parser::{self, Segment};
use crate::pipeline;
use std::io::Write;

/// A minimal shell-like interpreter that runs command lines.
///
/// The interpreter owns the [`Environment`] (shell variables and working
/// directory) and the [`Output`] that builtins and the last stage of every
/// command write to.
///
/// Example
/// ```
/// use trash_shell::{Interpreter, Outcome, Output};
/// let mut sh = Interpreter::with_output(Output::Captured(Vec::new()));
/// let outcome = sh.execute_line("GREETING=hello ; echo hi && echo bye").unwrap();
/// assert_eq!(outcome, Outcome::Status(0));
/// assert_eq!(sh.take_output(), b"hi\nbye\n");
/// assert_eq!(sh.env().get_var("GREETING").as_deref(), Some("hello"));
/// ```
pub struct Interpreter {
    env: Environment,
    output: Output,
    last_status: ExitCode,
}

impl Interpreter {
    /// Interpreter writing to the real standard output.
    pub fn new() -> Self {
        Self::with_output(Output::Terminal)
    }

    pub fn with_output(output: Output) -> Self {
        Self {
            env: Environment::new(),
            output,
            last_status: SUCCESS,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Status of the last line that got past parsing.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    /// Bytes captured so far when running with [`Output::Captured`].
    pub fn take_output(&mut self) -> Vec<u8> {
        self.output.take_captured()
    }

    /// Expand, parse and run one line of input.
    ///
    /// Errors from individual commands are reported and become statuses; the
    /// only error returned here is a syntax error, in which case nothing ran
    /// and [`Interpreter::last_status`] is left as it was.
    pub fn execute_line(&mut self, line: &str) -> ShellResult<Outcome> {
        let expanded = expand_vars(line, &self.env);
        let parsed = parser::parse_line(&expanded)?;

        let outcome = evaluator::evaluate(&parsed, SUCCESS, |segment| self.run_segment(segment));
        self.last_status = outcome.code();
        self.output.flush()?;
        Ok(outcome)
    }

    fn run_segment(&mut self, segment: &Segment) -> Outcome {
        let result = if segment.is_pipeline() {
            pipeline::run_pipeline(segment.stages(), &self.env, &mut self.output)
                .map(Outcome::Status)
        } else {
            self.run_command(segment.words())
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error::report(&err);
                Outcome::Status(err.status())
            }
        }
    }

    /// Dispatch a single command: assignment, builtin, or external program.
    fn run_command(&mut self, words: &[String]) -> ShellResult<Outcome> {
        if let Some((name, value)) = parse_assignment(words) {
            log::debug!("assigning {}={:?}", name, value);
            self.env.set_var(name, value);
            return Ok(Outcome::Status(SUCCESS));
        }

        let Some((name, args)) = words.split_first() else {
            return Ok(Outcome::Status(SUCCESS));
        };

        if let Some(builtin) = Builtin::from_name(name) {
            return builtin
                .invoke(args, &mut self.output, &mut self.env)
                .map_err(|cause| ShellError::Builtin {
                    name: builtin.name(),
                    cause,
                });
        }

        match ExternalCommand::resolve(&self.env, name, args) {
            Some(cmd) => cmd.run(&self.env, &mut self.output).map(Outcome::Status),
            None => Err(ShellError::CommandNotFound(name.clone())),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognize `NAME=VALUE` filling a whole command.
///
/// The words are joined by single spaces and split at the first `=`; both
/// sides are trimmed, so `X = 5` binds too. Anything that is not an identifier
/// on the left, such as `export X` or `echo a`, is not an assignment.
fn parse_assignment(words: &[String]) -> Option<(String, String)> {
    let line = words.join(" ");
    let (name, value) = line.split_once('=')?;
    let name = name.trim();
    if !is_identifier(name) {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Interpreter {
        Interpreter::with_output(Output::Captured(Vec::new()))
    }

    fn run(sh: &mut Interpreter, line: &str) -> (Outcome, String) {
        let outcome = sh.execute_line(line).unwrap();
        (outcome, String::from_utf8(sh.take_output()).unwrap())
    }

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn assigned(line: &str) -> Option<(String, String)> {
        parse_assignment(&words(line))
    }

    fn binding(name: &str, value: &str) -> Option<(String, String)> {
        Some((name.to_string(), value.to_string()))
    }

    #[test]
    fn assignment_patterns() {
        assert_eq!(assigned("X=5"), binding("X", "5"));
        assert_eq!(assigned("X=hello big world"), binding("X", "hello big world"));
        assert_eq!(assigned("X="), binding("X", ""));
        assert_eq!(assigned("X=a=b"), binding("X", "a=b"));
        assert_eq!(assigned("export X=5"), None);
        assert_eq!(assigned("1X=5"), None);
        assert_eq!(assigned("ls -la"), None);
        assert_eq!(assigned("--opt=5"), None);
        assert_eq!(assigned("echo a=b"), None);
    }

    #[test]
    fn assignment_tolerates_spaces_around_equals() {
        assert_eq!(assigned("X = 5"), binding("X", "5"));
        assert_eq!(assigned("X =5"), binding("X", "5"));
        assert_eq!(assigned("X= 5"), binding("X", "5"));

        let mut sh = shell();
        let (outcome, _) = run(&mut sh, "SPACED = out");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(sh.env().get_var("SPACED").as_deref(), Some("out"));
    }

    #[test]
    fn echo_and_echo() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "echo hi && echo bye");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "hi\nbye\n");
    }

    #[test]
    fn not_found_then_fallback() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "false_cmd_xyz || echo fallback");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "fallback\n");

        let (outcome, out) = run(&mut sh, "false_cmd_xyz && echo never");
        assert_eq!(outcome, Outcome::Status(127));
        assert!(out.is_empty());
        assert_eq!(sh.last_status(), 127);
    }

    #[test]
    fn not_found_does_not_stop_a_sequence() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "false_cmd_xyz ; echo still");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "still\n");
    }

    #[test]
    fn pipeline_output_reaches_the_shell_output() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "printf a | tr a b");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "b");
    }

    #[test]
    fn unknown_stage_does_not_replace_the_last_status() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "false_cmd_xyz | printf last");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "last");
    }

    #[test]
    fn builtin_in_pipeline_fails_the_segment() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "cd | wc -l || echo recovered");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "recovered\n");

        let (outcome, _) = run(&mut sh, "cd | wc -l");
        assert_eq!(outcome, Outcome::Status(1));
    }

    #[test]
    fn assignment_is_visible_on_the_next_line() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "X=5");
        assert_eq!(outcome, Outcome::Status(0));
        assert!(out.is_empty());

        let (_, out) = run(&mut sh, "echo $X");
        assert_eq!(out, "5\n");
    }

    #[test]
    fn expansion_happens_before_the_line_runs() {
        let mut sh = shell();
        let (_, out) = run(&mut sh, "Y=late ; echo [$Y]");
        assert_eq!(out, "[]\n");
        let (_, out) = run(&mut sh, "echo [$Y]");
        assert_eq!(out, "[late]\n");
    }

    #[test]
    fn assignment_never_resolves_a_command() {
        let mut sh = shell();
        // Even with an empty PATH the assignment succeeds.
        sh.env_mut().set_var("PATH", "/nonexistent");
        let (outcome, _) = run(&mut sh, "ls=1");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(sh.env().get_var("ls").as_deref(), Some("1"));
    }

    #[test]
    fn quoted_assignment_keeps_spaces() {
        let mut sh = shell();
        run(&mut sh, "MSG=\"a  b\"");
        assert_eq!(sh.env().get_var("MSG").as_deref(), Some("a  b"));
    }

    #[test]
    fn set_builtin_feeds_expansion() {
        let mut sh = shell();
        run(&mut sh, "set NAME trash shell");
        let (_, out) = run(&mut sh, "echo hello $NAME");
        assert_eq!(out, "hello trash shell\n");
    }

    #[test]
    fn builtin_fault_becomes_status_one() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "cd /definitely/not/here || echo handled");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "handled\n");

        let (outcome, _) = run(&mut sh, "set bad-name x");
        assert_eq!(outcome, Outcome::Status(1));
    }

    #[test]
    fn syntax_error_runs_nothing_and_keeps_status() {
        let mut sh = shell();
        run(&mut sh, "false_cmd_xyz");
        assert_eq!(sh.last_status(), 127);

        let err = sh.execute_line("echo ok ; echo \"unterminated").unwrap_err();
        assert!(matches!(err, ShellError::Syntax(_)));
        assert!(sh.take_output().is_empty());
        assert_eq!(sh.last_status(), 127);
    }

    #[test]
    fn blank_line_is_success() {
        let mut sh = shell();
        run(&mut sh, "false_cmd_xyz");
        let (outcome, out) = run(&mut sh, "   ");
        assert_eq!(outcome, Outcome::Status(0));
        assert!(out.is_empty());
        assert_eq!(sh.last_status(), 0);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "; echo a ; ; echo b ;");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn external_status_drives_operators() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "false && echo no || echo yes ; true");
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, "yes\n");

        let (outcome, _) = run(&mut sh, "true ; false");
        assert_eq!(outcome, Outcome::Status(1));
    }

    #[test]
    fn exit_stops_the_rest_of_the_line() {
        let mut sh = shell();
        let (outcome, out) = run(&mut sh, "echo before ; exit 4 ; echo after");
        assert_eq!(outcome, Outcome::Exit(4));
        assert_eq!(out, "before\nExiting TrashShell...\n");
    }

    #[test]
    fn cd_changes_where_commands_run() {
        let temp = tempfile::tempdir().unwrap();
        let dir = std::fs::canonicalize(temp.path()).unwrap();
        std::fs::write(dir.join("seen.txt"), "").unwrap();

        let mut sh = shell();
        let line = format!("cd {} && ls && pwd", dir.display());
        let (outcome, out) = run(&mut sh, &line);
        assert_eq!(outcome, Outcome::Status(0));
        assert_eq!(out, format!("seen.txt\n{}\n", dir.display()));
    }
}
