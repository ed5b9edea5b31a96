//! The interactive loop: prompt, line editing, history and the fault barrier
//! around each executed line.

use crate::command::{ExitCode, FAILURE, Outcome, SUCCESS};
use crate::env::Environment;
use crate::error;
use crate::interpreter::Interpreter;
use crate::signals;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::any::Any;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// History entries kept on disk.
pub const HISTORY_LIMIT: usize = 1000;

/// History file used when none is given.
pub const HISTORY_FILE: &str = ".shistory";

const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Default)]
pub struct ReplOptions {
    /// Where history is loaded from and saved to; `None` disables history.
    pub history_file: Option<PathBuf>,
}

/// `~/.shistory`, if the home directory is known.
pub fn default_history_file(env: &Environment) -> Option<PathBuf> {
    env.get_var("HOME")
        .map(|home| Path::new(&home).join(HISTORY_FILE))
}

/// Run lines until `exit` or end of input.
///
/// Returns the code the process should exit with.
pub fn run(interp: &mut Interpreter, options: &ReplOptions) -> rustyline::Result<ExitCode> {
    let config = Config::builder()
        .max_history_size(HISTORY_LIMIT)?
        .auto_add_history(false)
        .build();
    let mut rl = DefaultEditor::with_config(config)?;

    if let Some(path) = &options.history_file {
        match rl.load_history(path) {
            Ok(()) => log::debug!("loaded history from {}", path.display()),
            Err(ReadlineError::Io(err)) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => log::warn!("cannot load history from {}: {}", path.display(), err),
        }
    }

    println!("{GREEN}TrashShell v1.5 - type 'help' for commands{RESET}");

    let mut exit_code = SUCCESS;
    loop {
        match rl.readline(&prompt(interp.env())) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = rl.add_history_entry(line.as_str()) {
                        log::warn!("cannot record history entry: {}", err);
                    }
                }
                if let Outcome::Exit(code) = run_line(interp, &line) {
                    exit_code = code;
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{YELLOW}\n(To exit, type 'exit'){RESET}");
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye.");
                break;
            }
            Err(err) => {
                log::error!("reading input failed: {}", err);
                eprintln!("{RED}Unexpected error: {err}{RESET}");
                exit_code = FAILURE;
                break;
            }
        }
    }

    if let Some(path) = &options.history_file {
        if let Err(err) = rl.save_history(path) {
            log::warn!("cannot save history to {}: {}", path.display(), err);
        }
    }

    Ok(exit_code)
}

/// Execute one line behind the fault barrier.
///
/// Errors and panics are reported and turned into a failure status; the
/// caller only has to look for [`Outcome::Exit`]. An interrupt received while
/// the line ran is acknowledged with the usual notice.
pub fn run_line(interp: &mut Interpreter, line: &str) -> Outcome {
    signals::take_interrupt();
    let outcome = run_guarded(interp, line);
    if signals::take_interrupt() {
        println!("{YELLOW}\n(To exit, type 'exit'){RESET}");
    }
    outcome
}

fn run_guarded(interp: &mut Interpreter, line: &str) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| interp.execute_line(line))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            error::report(&err);
            Outcome::Status(err.status())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("panic while running {:?}: {}", line, message);
            eprintln!("{RED}Unexpected error: {message}{RESET}");
            Outcome::Status(FAILURE)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// `user@host:cwd >>> ` in blue.
pub fn prompt(env: &Environment) -> String {
    let user = env
        .get_var("USER")
        .or_else(|| env.get_var("LOGNAME"))
        .unwrap_or_else(|| "user".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().split('.').next().unwrap_or_default().to_string())
        .unwrap_or_else(|_| "localhost".to_string());
    let home = env.get_var("HOME").map(PathBuf::from);
    let cwd = shorten_cwd(&env.current_dir, home.as_deref());
    format!("{BLUE}{user}@{host}:{cwd} >>> {RESET}")
}

/// `~` for home and paths below it, the last component elsewhere.
pub fn shorten_cwd(path: &Path, home: Option<&Path>) -> String {
    if let Some(home) = home {
        if let Ok(rest) = path.strip_prefix(home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => "/".to_string(),
    }
}
