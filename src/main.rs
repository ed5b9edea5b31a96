use anyhow::{Context, Result};
use argh::FromArgs;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use trash_shell::Interpreter;
use trash_shell::repl::{self, ReplOptions};
use trash_shell::signals;

/// Environment variable consulted when `--log-level` is absent.
const LOG_ENV: &str = "TRASH_SHELL_LOG";

#[derive(FromArgs)]
/// TrashShell: a small interactive shell with variables, `;`, `&&`, `||` and pipes.
struct Options {
    #[argh(option, short = 'c')]
    /// execute a single command line and exit with its status
    command: Option<String>,

    #[argh(option)]
    /// history file; defaults to ~/.shistory
    history_file: Option<PathBuf>,

    #[argh(switch)]
    /// neither load nor save history
    no_history: bool,

    #[argh(option)]
    /// log level: off, error, warn, info, debug or trace (default warn)
    log_level: Option<LevelFilter>,

    #[argh(option)]
    /// append logs to this file instead of stderr
    log_file: Option<PathBuf>,
}

fn init_logging(options: &Options) -> Result<()> {
    let level = options
        .log_level
        .or_else(|| std::env::var(LOG_ENV).ok()?.parse().ok())
        .unwrap_or(LevelFilter::Warn);
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .build();

    match &options.log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            WriteLogger::init(level, config, file)?;
        }
        None => TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

fn process_exit(code: i32) -> ExitCode {
    ExitCode::from((code & 0xff) as u8)
}

fn main() -> ExitCode {
    let options: Options = argh::from_env();
    if let Err(err) = init_logging(&options) {
        eprintln!("trash_shell: logging disabled: {err:#}");
    }

    if let Err(err) = signals::setup_signal_handlers() {
        log::warn!("cannot install interrupt handler: {}", err);
    }

    let mut interp = Interpreter::new();

    if let Some(line) = &options.command {
        let outcome = repl::run_line(&mut interp, line);
        return process_exit(outcome.code());
    }

    let history_file = if options.no_history {
        None
    } else {
        options
            .history_file
            .clone()
            .or_else(|| repl::default_history_file(interp.env()))
    };

    match repl::run(&mut interp, &ReplOptions { history_file }) {
        Ok(code) => process_exit(code),
        Err(err) => {
            log::error!("cannot start line editor: {}", err);
            eprintln!("trash_shell: {err}");
            ExitCode::FAILURE
        }
    }
}
