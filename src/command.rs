use std::io::{self, Read, Write};
use std::process::{ChildStdout, Stdio};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Status of a command that finished without problems.
pub const SUCCESS: ExitCode = 0;

/// Generic failure status, also used for builtin faults and pipeline errors.
pub const FAILURE: ExitCode = 1;

/// Status reported when a command name resolves to nothing.
pub const NOT_FOUND: ExitCode = 127;

/// Result of running a segment, a builtin or a whole line.
///
/// `Exit` is a control action rather than a status: it asks the engine to
/// stop reading input. The carried code becomes the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Status(ExitCode),
    Exit(ExitCode),
}

impl Outcome {
    /// Status observed by the next `&&` / `||`.
    pub fn code(self) -> ExitCode {
        match self {
            Outcome::Status(code) | Outcome::Exit(code) => code,
        }
    }
}

/// Where the shell's own standard output goes.
///
/// `Terminal` is the real stdout, inherited by child processes. `Captured`
/// keeps everything in memory: builtins write into the buffer and children get
/// a pipe that is drained into it, which is how the engine is driven in tests.
#[derive(Debug)]
pub enum Output {
    Terminal,
    Captured(Vec<u8>),
}

impl Output {
    /// Stdio handle for a child process writing to this output.
    pub fn stdio(&self) -> Stdio {
        match self {
            Output::Terminal => Stdio::inherit(),
            Output::Captured(_) => Stdio::piped(),
        }
    }

    /// Drain a child's piped stdout into the capture buffer.
    ///
    /// Does nothing for `Terminal`, where the child wrote directly.
    pub fn collect(&mut self, child_stdout: Option<ChildStdout>) -> io::Result<()> {
        if let (Output::Captured(buf), Some(mut stdout)) = (self, child_stdout) {
            stdout.read_to_end(buf)?;
        }
        Ok(())
    }

    /// Take the captured bytes, leaving an empty buffer behind.
    pub fn take_captured(&mut self) -> Vec<u8> {
        match self {
            Output::Terminal => Vec::new(),
            Output::Captured(buf) => std::mem::take(buf),
        }
    }
}

impl Write for Output {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            Output::Terminal => io::stdout().write(data),
            Output::Captured(buf) => buf.write(data),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Terminal => io::stdout().flush(),
            Output::Captured(_) => Ok(()),
        }
    }
}
