use std::fmt;

use thiserror::Error;

/// A single schema violation, located by a JSON-path-like string
/// (e.g. `sections[0].fields[2].type`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Why a remote configuration could not be retrieved.
#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("server answered with HTTP {code}")]
    Status { code: u16 },

    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
}

/// Coarse classification of [`ConfigError`], handy for UI branching.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Schema,
    Transport,
}

/// Failure to load a configuration. A store operation returning this error
/// has left the current configuration and values untouched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Input is not valid JSON.
    #[error("configuration is not valid JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON that does not describe a form.
    #[error("configuration failed validation with {} violation(s):\n{}", .violations.len(), render(.violations))]
    Schema { violations: Vec<Violation> },

    /// Remote fetch failed before any body could be validated.
    #[error("could not fetch configuration from {url}: {failure}")]
    Transport {
        url: String,
        #[source]
        failure: TransportFailure,
    },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Parse { .. } => ErrorKind::Parse,
            ConfigError::Schema { .. } => ErrorKind::Schema,
            ConfigError::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Schema violations, empty for other kinds.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ConfigError::Schema { violations } => violations,
            _ => &[],
        }
    }
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_violation() {
        let err = ConfigError::Schema {
            violations: vec![
                Violation::new("title", "is required"),
                Violation::new("sections", "expected an array, found a string"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 violation(s)"));
        assert!(msg.contains("  - title: is required"));
        assert!(msg.contains("  - sections: expected an array"));
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.violations().len(), 2);
    }
}
