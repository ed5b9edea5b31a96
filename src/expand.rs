use crate::env::Environment;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    // Literal pattern, always valid.
    Regex::new(r"\$(\w+)").unwrap()
});

/// Replace every `$NAME` in `line` with its value.
///
/// Lookup goes through [`Environment::get_var`]; unknown names expand to the
/// empty string. This is a single textual pass run before tokenizing, so quotes
/// do not protect a reference and substituted text is never expanded again.
pub fn expand_vars(line: &str, env: &Environment) -> String {
    VAR_REF
        .replace_all(line, |caps: &Captures| {
            env.get_var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_shell_vars() {
        let mut env = Environment::new();
        env.set_var("X", "5");
        assert_eq!(expand_vars("echo $X", &env), "echo 5");
        assert_eq!(expand_vars("a$X-b", &env), "a5-b");
    }

    #[test]
    fn unknown_names_become_empty() {
        let env = Environment::new();
        assert_eq!(
            expand_vars("echo [$NO_SUCH_VARIABLE_XYZ_42]", &env),
            "echo []"
        );
    }

    #[test]
    fn falls_back_to_process_env() {
        let env = Environment::new();
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_vars("$PATH", &env), path);
    }

    #[test]
    fn name_stops_at_non_word_character() {
        let mut env = Environment::new();
        env.set_var("A", "1");
        env.set_var("AB", "2");
        assert_eq!(expand_vars("$A.$AB $A_", &env), "1.2 ");
    }

    #[test]
    fn lone_dollar_is_literal() {
        let env = Environment::new();
        assert_eq!(expand_vars("cost: $ 5 $", &env), "cost: $ 5 $");
    }

    #[test]
    fn substituted_text_is_not_expanded_again() {
        let mut env = Environment::new();
        env.set_var("OUTER", "$INNER");
        env.set_var("INNER", "deep");
        let once = expand_vars("echo $OUTER", &env);
        assert_eq!(once, "echo $INNER");
    }

    #[test]
    fn quotes_do_not_protect_references() {
        let mut env = Environment::new();
        env.set_var("X", "v");
        assert_eq!(expand_vars("echo '$X' \"$X\"", &env), "echo 'v' \"v\"");
    }
}
