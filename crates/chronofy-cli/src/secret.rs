//! Secret references in `config.toml`.
//!
//! The client secret and access token do not have to be stored inline.
//! A credential value of the form `pass::cronofy/client-secret` is looked up
//! in the `pass` store (first line of `pass show`), and `env::CRONOFY_TOKEN`
//! is read from the environment. Any other value is the secret itself.

use std::fmt;

/// Prefix for secrets kept in the `pass` password store.
pub const PASS_PREFIX: &str = "pass::";

/// Prefix for secrets read from the environment.
pub const ENV_PREFIX: &str = "env::";

/// Placeholder shown instead of inline secrets.
pub const REDACTED: &str = "<redacted>";

/// A credential value as written in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    /// Entry in the `pass` store.
    Pass(&'a str),
    /// Environment variable name.
    Env(&'a str),
    /// Inline secret.
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(entry) = value.strip_prefix(PASS_PREFIX) {
            Self::Pass(entry)
        } else if let Some(var) = value.strip_prefix(ENV_PREFIX) {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }

    /// Fetches the secret this value refers to.
    pub fn resolve(&self) -> Result<String, String> {
        match *self {
            Self::Pass(entry) => pass_show(entry),
            Self::Env(var) => read_env(var),
            Self::Plain(value) => Ok(value.to_string()),
        }
    }

    /// The value as it may be shown to a user: references verbatim,
    /// inline secrets replaced by [`REDACTED`].
    pub fn redacted(&self) -> String {
        match self {
            Self::Plain(_) => REDACTED.to_string(),
            reference => reference.to_string(),
        }
    }
}

impl fmt::Display for SecretRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(entry) => write!(f, "{}{}", PASS_PREFIX, entry),
            Self::Env(var) => write!(f, "{}{}", ENV_PREFIX, var),
            Self::Plain(value) => f.write_str(value),
        }
    }
}

/// Resolves a credential value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

/// Returns true if `value` names a secret instead of holding it.
pub fn is_reference(value: &str) -> bool {
    SecretRef::parse(value).is_reference()
}

fn pass_show(entry: &str) -> Result<String, String> {
    if entry.is_empty() {
        return Err("`pass::` reference has no entry name".to_string());
    }

    let output = std::process::Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| format!("could not run pass for `{}`: {}", entry, e))?;
    if !output.status.success() {
        return Err(format!(
            "pass has no usable entry `{}` ({}): {}",
            entry,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.lines().next().map(str::trim_end) {
        Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
        _ => Err(format!("pass entry `{}` starts with an empty line", entry)),
    }
}

fn read_env(var: &str) -> Result<String, String> {
    if var.is_empty() {
        return Err("`env::` reference has no variable name".to_string());
    }
    std::env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("environment variable `{}` is unset or empty", var))
}
