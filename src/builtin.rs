use crate::command::{ExitCode, FAILURE, Outcome, SUCCESS};
use crate::env::{Environment, is_identifier};
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed through [`FromArgs`] and executed in-process. Usage
/// errors and `--help` never reach [`BuiltinCommand::execute`]; they are
/// printed and turned into a status by [`Builtin::invoke`].
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command.
    ///
    /// An `Err` is a fault: the dispatcher reports it with the builtin's name
    /// and maps it to status 1.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome>;
}

/// The closed set of builtins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Clear,
    Echo,
    Env,
    Exit,
    Help,
    Ls,
    Set,
}

impl Builtin {
    /// Every builtin, in the order `help` lists them.
    pub const ALL: [Builtin; 8] = [
        Builtin::Help,
        Builtin::Exit,
        Builtin::Clear,
        Builtin::Env,
        Builtin::Set,
        Builtin::Cd,
        Builtin::Ls,
        Builtin::Echo,
    ];

    /// Look up a builtin by the name typed on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => Cd::name(),
            Builtin::Clear => Clear::name(),
            Builtin::Echo => Echo::name(),
            Builtin::Env => Env::name(),
            Builtin::Exit => Exit::name(),
            Builtin::Help => Help::name(),
            Builtin::Ls => Ls::name(),
            Builtin::Set => Set::name(),
        }
    }

    /// Run the builtin with `args` (not including its own name).
    pub fn invoke(
        self,
        args: &[String],
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Outcome> {
        match self {
            Builtin::Cd => invoke::<Cd>(args, stdout, env),
            Builtin::Clear => invoke::<Clear>(args, stdout, env),
            Builtin::Echo => invoke::<Echo>(args, stdout, env),
            Builtin::Env => invoke::<Env>(args, stdout, env),
            Builtin::Exit => invoke::<Exit>(args, stdout, env),
            Builtin::Help => invoke::<Help>(args, stdout, env),
            Builtin::Ls => invoke::<Ls>(args, stdout, env),
            Builtin::Set => invoke::<Set>(args, stdout, env),
        }
    }
}

fn invoke<T: BuiltinCommand>(
    args: &[String],
    stdout: &mut dyn Write,
    env: &mut Environment,
) -> Result<Outcome> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd.execute(stdout, env),
        Err(EarlyExit { output, status }) => {
            stdout.write_all(output.as_bytes())?;
            if !output.ends_with('\n') {
                writeln!(stdout)?;
            }
            let code: ExitCode = if status.is_err() { FAILURE } else { SUCCESS };
            Ok(Outcome::Status(code))
        }
    }
}

fn usage_error(usage: &str) -> EarlyExit {
    EarlyExit {
        output: format!("Usage: {usage}"),
        status: Err(()),
    }
}

/// Change the current working directory.
///
/// The target is absolute or relative to the current directory, `-` for the
/// previous one, and `$HOME` when omitted. Only the shell's own notion of the
/// directory changes; children are started there.
pub struct Cd {
    pub target: Option<String>,
}

impl FromArgs for Cd {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        match args {
            [] => Ok(Cd { target: None }),
            [target] => Ok(Cd {
                target: Some(target.to_string()),
            }),
            _ => Err(usage_error("cd [DIR | -]")),
        }
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        let (target, announce) = match self.target.as_deref() {
            Some("-") => match env.get_var("OLDPWD") {
                Some(old) => (PathBuf::from(old), true),
                None => bail!("OLDPWD not set"),
            },
            Some(t) if !t.is_empty() => (PathBuf::from(t), false),
            _ => match env.get_var("HOME") {
                Some(home) => (PathBuf::from(home), false),
                None => bail!("no target and HOME not set"),
            },
        };

        let new_dir = env.current_dir.join(target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("can't access {}", new_dir.display()))?;
        if !canonical.is_dir() {
            bail!("not a directory: {}", canonical.display());
        }

        let old = std::mem::replace(&mut env.current_dir, canonical);
        env.set_var("OLDPWD", old.to_string_lossy());
        env.set_var("PWD", env.current_dir.to_string_lossy().into_owned());
        if announce {
            writeln!(stdout, "{}", env.current_dir.display())?;
        }
        Ok(Outcome::Status(SUCCESS))
    }
}

#[derive(FromArgs)]
/// Clear the terminal screen.
pub struct Clear {}

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        write!(stdout, "\x1b[2J\x1b[3J\x1b[H")?;
        stdout.flush()?;
        Ok(Outcome::Status(SUCCESS))
    }
}

/// Write the arguments to standard output, separated by spaces.
/// By default, a trailing newline is printed; `-n` suppresses it.
///
/// Arguments are taken literally, so `echo help` or `echo -5` print as-is.
pub struct Echo {
    pub no_newline: bool,
    pub args: Vec<String>,
}

impl FromArgs for Echo {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let (no_newline, rest) = match args.split_first() {
            Some((&"-n", rest)) => (true, rest),
            _ => (false, args),
        };
        Ok(Echo {
            no_newline,
            args: rest.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(Outcome::Status(SUCCESS))
    }
}

#[derive(FromArgs)]
/// Print the process environment together with shell variables.
pub struct Env {}

impl BuiltinCommand for Env {
    fn name() -> &'static str {
        "env"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        for (key, value) in env.merged() {
            writeln!(stdout, "{key}={value}")?;
        }
        Ok(Outcome::Status(SUCCESS))
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional)]
    /// status the shell process exits with; 0 when omitted.
    pub code: Option<ExitCode>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        writeln!(stdout, "Exiting TrashShell...")?;
        Ok(Outcome::Exit(self.code.unwrap_or(SUCCESS)))
    }
}

#[derive(FromArgs)]
/// List the internal commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        writeln!(stdout, "Internal commands:")?;
        for builtin in Builtin::ALL {
            if builtin != Builtin::Set {
                writeln!(stdout, " - {}", builtin.name())?;
            }
        }
        writeln!(
            stdout,
            "Supports variable expansion ($VAR), assignments VAR=val, \
             command chaining with ';', '&&', '||', and pipes '|'"
        )?;
        Ok(Outcome::Status(SUCCESS))
    }
}

#[derive(FromArgs)]
/// List directory contents.
pub struct Ls {
    #[argh(switch, short = 'a')]
    /// include entries whose names start with `.`
    pub all: bool,

    #[argh(positional, greedy)]
    /// files or directories to list; the current directory when omitted.
    pub paths: Vec<String>,
}

impl Ls {
    fn list_dir(&self, dir: &Path, stdout: &mut dyn Write) -> Result<()> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("cannot open {}", dir.display()))? {
            let entry = entry?;
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if !self.all && name.starts_with('.') {
                continue;
            }
            if entry.path().is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();
        for name in names {
            writeln!(stdout, "{name}")?;
        }
        Ok(())
    }
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        if self.paths.is_empty() {
            self.list_dir(&env.current_dir, stdout)?;
            return Ok(Outcome::Status(SUCCESS));
        }

        let with_headers = self.paths.len() > 1;
        for (i, arg) in self.paths.iter().enumerate() {
            let path = env.current_dir.join(arg);
            let meta = fs::metadata(&path).with_context(|| format!("cannot access '{arg}'"))?;
            if !meta.is_dir() {
                writeln!(stdout, "{arg}")?;
                continue;
            }
            if with_headers {
                if i > 0 {
                    writeln!(stdout)?;
                }
                writeln!(stdout, "{arg}:")?;
            }
            self.list_dir(&path, stdout)?;
        }
        Ok(Outcome::Status(SUCCESS))
    }
}

/// Bind a shell variable: `set NAME VALUE...`.
///
/// The value is the remaining words joined by single spaces.
pub struct Set {
    pub name: String,
    pub value: Vec<String>,
}

impl FromArgs for Set {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        match args {
            [name, value @ ..] if !value.is_empty() => Ok(Set {
                name: name.to_string(),
                value: value.iter().map(|s| s.to_string()).collect(),
            }),
            _ => Err(usage_error("set NAME VALUE...")),
        }
    }
}

impl BuiltinCommand for Set {
    fn name() -> &'static str {
        "set"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        if !is_identifier(&self.name) {
            bail!("invalid variable name '{}'", self.name);
        }
        env.set_var(self.name, self.value.join(" "));
        Ok(Outcome::Status(SUCCESS))
    }
}
