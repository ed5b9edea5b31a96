//! Running a segment whose stages are joined by `|`.
//!
//! Every stage must be an external command. Empty stages and builtins are
//! rejected before anything starts. The stages are then launched left to right
//! with each stage's stdout moved into the next stage's stdin. A stage whose
//! name resolves to nothing is reported and counts as having exited with 127;
//! the stage after it reads from an empty stdin. The pipeline's status is the
//! status of its last stage.

use crate::builtin::Builtin;
use crate::command::{ExitCode, NOT_FOUND, Output, SUCCESS};
use crate::env::Environment;
use crate::error::{self, ShellError, ShellResult};
use crate::external::{ExternalCommand, exit_code};
use std::io::{self, Write};
use std::process::{Child, ChildStdout, Stdio};

/// A stage after name resolution.
#[derive(Debug)]
enum Stage {
    Command(ExternalCommand),
    Missing(String),
}

/// A stage after launch.
#[derive(Debug)]
enum Running {
    Child(Child),
    Missing,
}

/// Check, resolve, launch and wait for all `stages`.
pub fn run_pipeline(
    stages: &[Vec<String>],
    env: &Environment,
    output: &mut Output,
) -> ShellResult<ExitCode> {
    let stages = resolve_stages(stages, env)?;
    output.flush()?;
    let running = launch(&stages, env, output)?;
    wait_all(running, output)
}

/// Reject empty and builtin stages, then resolve the rest on the search path.
fn resolve_stages(stages: &[Vec<String>], env: &Environment) -> ShellResult<Vec<Stage>> {
    for stage in stages {
        match stage.first() {
            None => return Err(ShellError::EmptyStage),
            Some(name) if Builtin::from_name(name).is_some() => {
                return Err(ShellError::BuiltinInPipeline(name.clone()));
            }
            Some(_) => {}
        }
    }

    let mut resolved = Vec::with_capacity(stages.len());
    for stage in stages {
        let Some((name, args)) = stage.split_first() else {
            return Err(ShellError::EmptyStage);
        };
        resolved.push(match ExternalCommand::resolve(env, name, args) {
            Some(cmd) => Stage::Command(cmd),
            None => Stage::Missing(name.clone()),
        });
    }
    Ok(resolved)
}

/// Start the stages left to right, chaining their standard streams.
///
/// On a spawn failure the stages already running are killed and reaped, and
/// the rest are never started.
fn launch(stages: &[Stage], env: &Environment, output: &Output) -> ShellResult<Vec<Running>> {
    let mut running: Vec<Running> = Vec::with_capacity(stages.len());
    let mut upstream: Option<ChildStdout> = None;

    for (i, stage) in stages.iter().enumerate() {
        let is_last = i + 1 == stages.len();

        let cmd = match stage {
            Stage::Command(cmd) => cmd,
            Stage::Missing(name) => {
                error::report(&ShellError::CommandNotFound(name.clone()));
                // Closing the read end lets the previous stage see a broken pipe.
                upstream = None;
                running.push(Running::Missing);
                continue;
            }
        };

        // Moving the read end into the child leaves no copy behind, so the
        // stage sees EOF as soon as its predecessor exits.
        let stdin = match upstream.take() {
            Some(pipe) => Stdio::from(pipe),
            None if i == 0 => Stdio::inherit(),
            None => Stdio::null(),
        };
        let stdout = if is_last {
            output.stdio()
        } else {
            Stdio::piped()
        };

        match cmd.spawn(env, stdin, stdout) {
            Ok(mut child) => {
                if !is_last {
                    upstream = child.stdout.take();
                }
                running.push(Running::Child(child));
            }
            Err(source) => {
                kill_all(&mut running);
                return Err(ShellError::Spawn {
                    command: cmd.name().to_string(),
                    source,
                });
            }
        }
    }

    Ok(running)
}

/// Wait for every stage in launch order; the last one decides the status.
fn wait_all(mut running: Vec<Running>, output: &mut Output) -> ShellResult<ExitCode> {
    let last_stdout = match running.last_mut() {
        Some(Running::Child(last)) => last.stdout.take(),
        _ => None,
    };
    if let Err(err) = output.collect(last_stdout) {
        kill_all(&mut running);
        return Err(err.into());
    }

    // Collected first, so every stage is reaped before any error surfaces.
    let statuses: Vec<io::Result<ExitCode>> = running
        .into_iter()
        .map(|stage| match stage {
            Running::Child(mut child) => child.wait().map(exit_code).inspect_err(|err| {
                log::warn!("cannot wait for pipeline stage pid {}: {}", child.id(), err);
            }),
            Running::Missing => Ok(NOT_FOUND),
        })
        .collect();
    last_status(statuses)
}

/// Status of the last stage, or the first error met while waiting.
fn last_status(statuses: Vec<io::Result<ExitCode>>) -> ShellResult<ExitCode> {
    let mut status = SUCCESS;
    let mut first_error = None;
    for result in statuses {
        match result {
            Ok(code) => status = code,
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err.into()),
        None => Ok(status),
    }
}

fn kill_all(running: &mut [Running]) {
    for stage in running.iter_mut() {
        if let Running::Child(child) = stage {
            log::debug!("killing pipeline stage pid {}", child.id());
            // Already-exited children make kill fail; reaping is what matters.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
