//! Process environment access and variable substitution.
//!
//! The process environment is global mutable state; this crate assumes a single
//! control thread, so callers invoking [`setenv`]/[`unsetenv`] from multiple threads
//! must serialize access themselves.

use std::env;

/// A single `name=value` environment entry.
///
/// Substitution applies entries in sequence order (see [`expand_env_vars`]), so a
/// collection of these is an ordered list rather than a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    /// Create a new `name=value` pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Get the value of a process environment variable.
///
/// # Returns
/// The value, or the empty string when the variable is unset or not valid UTF-8.
/// Never fails.
///
/// # Examples
/// ```rust
/// use rstudio_core::os::env::getenv;
///
/// assert!(getenv("SOME_UNSET_VARIABLE_NAME").is_empty());
/// ```
pub fn getenv(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

/// Add `name=value` to the process environment.
///
/// The change is visible to all subsequent [`getenv`] calls in-process and is
/// inherited by child processes spawned afterwards.
pub fn setenv(name: &str, value: &str) {
    // SAFETY: the crate's concurrency model is a single control thread; no other
    // thread reads or writes the environment concurrently.
    unsafe { env::set_var(name, value) }
}

/// Remove a variable from the process environment.
pub fn unsetenv(name: &str) {
    // SAFETY: see `setenv`.
    unsafe { env::remove_var(name) }
}

/// Get a value from an ordered variable list.
///
/// # Returns
/// The value of the first entry named `name`, or the empty string when absent.
pub fn get_var(vars: &[EnvVar], name: &str) -> String {
    vars.iter()
        .find(|var| var.name == name)
        .map(|var| var.value.clone())
        .unwrap_or_default()
}

/// Set `name=value` in an ordered variable list.
///
/// An existing entry is updated in place, keeping its position; otherwise the pair
/// is appended.
pub fn set_var(vars: &mut Vec<EnvVar>, name: &str, value: &str) {
    match vars.iter_mut().find(|var| var.name == name) {
        Some(var) => value.clone_into(&mut var.value),
        None => vars.push(EnvVar::new(name, value)),
    }
}

/// A run of output text: either original input or the result of a substitution.
/// Substituted runs are never scanned again for later variable names.
enum Segment {
    Literal(String),
    Substituted(String),
}

impl Segment {
    fn into_inner(self) -> String {
        match self {
            Segment::Literal(text) | Segment::Substituted(text) => text,
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace every `$NAME` and `${NAME}` occurrence of a single variable within one
/// literal run, splitting it into literal and substituted segments.
fn substitute(text: &str, var: &EnvVar) -> Vec<Segment> {
    let bare = format!("${}", var.name);
    let braced = format!("${{{}}}", var.name);

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;
    while let Some(dollar) = rest.find('$') {
        literal.push_str(&rest[..dollar]);
        rest = &rest[dollar..];

        let matched = if rest.starts_with(&braced) {
            braced.len()
        } else if rest.starts_with(&bare)
            && !rest[bare.len()..].chars().next().is_some_and(is_name_char)
        {
            // The bare form only matches on a name boundary: `$VAR` must not
            // swallow the front of `$VARIABLE`.
            bare.len()
        } else {
            0
        };

        if matched == 0 {
            literal.push('$');
            rest = &rest[1..];
            continue;
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Substituted(var.value.clone()));
        rest = &rest[matched..];
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Expand environment variables in a string; for example `/$USER/foo` becomes
/// `/bob/foo` when `vars` contains `USER=bob`.
///
/// Variables are applied one at a time in sequence order, each replacing every
/// `$NAME` (on a name boundary) and `${NAME}` occurrence with its value. Text
/// inserted by an earlier variable's substitution is not re-scanned for later
/// variable names, so a value cannot inject further substitutions. Placeholders
/// matching no variable are left untouched.
///
/// # Examples
/// ```rust
/// use rstudio_core::os::env::{expand_env_vars, EnvVar};
///
/// let vars = vec![EnvVar::new("USER", "bob")];
/// assert_eq!(expand_env_vars(&vars, "/home/$USER"), "/home/bob");
/// assert_eq!(expand_env_vars(&vars, "/home/$USERNAME"), "/home/$USERNAME");
/// ```
pub fn expand_env_vars(vars: &[EnvVar], input: &str) -> String {
    let mut segments = vec![Segment::Literal(input.to_string())];
    for var in vars {
        if var.name.is_empty() {
            continue;
        }
        segments = segments
            .into_iter()
            .flat_map(|segment| match segment {
                Segment::Literal(text) => substitute(&text, var),
                substituted @ Segment::Substituted(_) => vec![substituted],
            })
            .collect();
    }
    segments.into_iter().map(Segment::into_inner).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const TEST_VAR: &str = "BOGUS_FAKE_ENVIRONMENT_VARIABLE_FOR_ENV_TESTS";

    #[test]
    fn getenv_missing_variable_is_empty() {
        assert_eq!(getenv("BOGUS_FAKE_VARIABLE_THAT_IS_NEVER_SET"), "");
    }

    #[test]
    #[serial]
    fn getenv_existing_variable_has_value() {
        assert!(!getenv("PATH").is_empty());
    }

    #[test]
    #[serial]
    fn set_get_unset_roundtrip() {
        assert_eq!(getenv(TEST_VAR), "");
        setenv(TEST_VAR, "value used for testing");
        assert_eq!(getenv(TEST_VAR), "value used for testing");
        unsetenv(TEST_VAR);
        assert_eq!(getenv(TEST_VAR), "");
    }

    #[test]
    fn get_var_absent_is_empty() {
        let vars = vec![EnvVar::new("FOO", "bar")];
        assert_eq!(get_var(&vars, "BAZ"), "");
        assert_eq!(get_var(&vars, "FOO"), "bar");
    }

    #[test]
    fn set_var_updates_in_place_or_appends() {
        let mut vars = vec![EnvVar::new("FOO", "bar"), EnvVar::new("ZOOM", "car")];
        set_var(&mut vars, "FOO", "baz");
        assert_eq!(vars[0], EnvVar::new("FOO", "baz"));
        set_var(&mut vars, "NEW", "value");
        assert_eq!(vars.len(), 3);
        assert_eq!(vars[2], EnvVar::new("NEW", "value"));
    }

    #[test]
    fn expand_with_no_vars_is_identity() {
        assert_eq!(expand_env_vars(&[], "$HOME/.local/share"), "$HOME/.local/share");
    }

    #[test]
    fn expand_without_matching_vars_is_identity() {
        let vars = vec![EnvVar::new("FOO", "bar"), EnvVar::new("ZOOM", "car")];
        assert_eq!(expand_env_vars(&vars, "~/.local/share"), "~/.local/share");
        assert_eq!(expand_env_vars(&vars, "$HOME/.local/share"), "$HOME/.local/share");
    }

    #[test]
    fn expand_bare_form() {
        let vars = vec![EnvVar::new("FOO", "bar"), EnvVar::new("ZOOM", "car")];
        assert_eq!(expand_env_vars(&vars, "C:\\HELLO\\$FOO"), "C:\\HELLO\\bar");
        assert_eq!(
            expand_env_vars(&vars, "/usr/HELLO/$ZOOM/misc/$FOO/etc/"),
            "/usr/HELLO/car/misc/bar/etc/"
        );
    }

    #[test]
    fn expand_brace_form() {
        let vars = vec![EnvVar::new("FOO", "bar")];
        assert_eq!(expand_env_vars(&vars, "C:\\HELLO\\${FOO}"), "C:\\HELLO\\bar");
    }

    #[test]
    fn expand_replaces_all_occurrences() {
        let vars = vec![
            EnvVar::new("VAR1", "foo"),
            EnvVar::new("VAR2", "bar"),
            EnvVar::new("VAR3", "baz"),
        ];
        assert_eq!(
            expand_env_vars(&vars, "$VAR1, $VAR2, and $VAR1"),
            "foo, bar, and foo"
        );
        assert_eq!(
            expand_env_vars(&vars, "variables include $VAR1, ${VAR2}, and $VAR3"),
            "variables include foo, bar, and baz"
        );
    }

    #[test]
    fn expand_is_boundary_exact() {
        let vars = vec![EnvVar::new("VAR", "foo")];
        assert_eq!(
            expand_env_vars(&vars, "I think $VAR is a nice name for a $VARIABLE."),
            "I think foo is a nice name for a $VARIABLE."
        );
    }

    #[test]
    fn expand_does_not_rescan_substituted_values() {
        let vars = vec![EnvVar::new("FIRST", "$SECOND"), EnvVar::new("SECOND", "oops")];
        assert_eq!(expand_env_vars(&vars, "value: $FIRST"), "value: $SECOND");
        // A placeholder already present in the input still expands normally.
        assert_eq!(
            expand_env_vars(&vars, "$FIRST and $SECOND"),
            "$SECOND and oops"
        );
    }

    #[test]
    fn expand_leaves_trailing_dollar_alone() {
        let vars = vec![EnvVar::new("VAR", "foo")];
        assert_eq!(expand_env_vars(&vars, "cost: 5$"), "cost: 5$");
        assert_eq!(expand_env_vars(&vars, "$"), "$");
    }
}
