use crate::command::{ExitCode, Output};
use crate::env::Environment;
use crate::error::{ShellError, ShellResult};
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

/// Command that is not a builtin, already resolved to an executable.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    name: String,
    path: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, path: PathBuf, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
            args,
        }
    }

    /// Resolve `name` against `$PATH` and the shell's working directory.
    ///
    /// `None` means there is no such command.
    pub fn resolve(env: &Environment, name: &str, args: &[String]) -> Option<Self> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let path = find_command_path(
            OsStr::new(&search_paths),
            &env.current_dir,
            Path::new(name),
        )?;
        Some(Self::new(name, path, args.to_vec()))
    }

    /// Name as typed by the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the process with the given standard streams.
    ///
    /// Stderr is always inherited. The child runs in the shell's working
    /// directory and sees the process environment only.
    pub fn spawn(&self, env: &Environment, stdin: Stdio, stdout: Stdio) -> io::Result<Child> {
        let child = Command::new(&self.path)
            .args(&self.args)
            .stdin(stdin)
            .stdout(stdout)
            .current_dir(&env.current_dir)
            .spawn()?;
        log::debug!("spawned {} as pid {}", self.path.display(), child.id());
        Ok(child)
    }

    /// Run in the foreground: inherit stdin, write to `output`, wait for exit.
    pub fn run(self, env: &Environment, output: &mut Output) -> ShellResult<ExitCode> {
        output.flush()?;
        let mut child = self
            .spawn(env, Stdio::inherit(), output.stdio())
            .map_err(|source| ShellError::Spawn {
                command: self.name.clone(),
                source,
            })?;
        let collected = output.collect(child.stdout.take());
        let status = child.wait()?;
        collected?;
        Ok(exit_code(status))
    }
}

/// Status of a finished child, `128 + signal` when it was killed.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    let code = match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    };
    log::debug!("child exited with status {}", code);
    code
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way `which` would.
///
/// Behavior:
/// - Absolute path: returns it if it is executable.
/// - Relative with several components (`bin/tool`, `./tool`): looked up under `cwd`.
/// - Single path component (no separators): search each directory in `search_paths`
///   (PATH) and return the first executable match. Relative PATH entries are
///   taken relative to `cwd`.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, cwd: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) if !path.starts_with(".") => find_in_path(search_paths, cwd, x.as_os_str()),
        _ => find_by_path(&cwd.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cwd: &Path, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| find_by_path(&cwd.join(dir).join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if is_executable(path) {
        Some(path.to_path_buf())
    } else {
        None
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
