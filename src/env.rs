use std::collections::{BTreeMap, HashMap};
use std::env as stdenv;
use std::path::PathBuf;

/// Shell-level state that builtins and the engine read and write.
///
/// The environment contains:
/// - `vars`: variables bound with `NAME=VALUE` or `set`. They live as long as the
///   shell and are never removed implicitly.
/// - `current_dir`: the working directory for command execution.
///
/// The process environment is never modified; it is only consulted as a fallback
/// when a shell variable is missing or empty.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Start with no shell variables and the process's working directory.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            current_dir,
        }
    }

    /// Value of `$key` as seen by expansion.
    ///
    /// A non-empty shell variable wins, then the process environment. `None`
    /// means neither has a value.
    pub fn get_var(&self, key: &str) -> Option<String> {
        match self.vars.get(key) {
            Some(value) if !value.is_empty() => Some(value.clone()),
            _ => stdenv::var(key).ok(),
        }
    }

    /// Set or override a shell variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Shell variables only, without the process environment.
    pub fn shell_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Process environment overlaid with shell variables, sorted by name.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = stdenv::vars().collect();
        merged.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` for names usable on the left of `NAME=VALUE` or with `set`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
