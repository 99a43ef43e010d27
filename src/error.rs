use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors. Any of these stops a run before the first class
/// executes; failures inside tests end up in the report instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot load test class from {origin}: {reason}")]
    Discovery { origin: String, reason: String },

    #[error(
        "class '{class}' receives method '{method}' from roles {} with different tags and does not override it",
        .roles.join(", ")
    )]
    CompositionConflict {
        class: String,
        method: String,
        roles: Vec<String>,
    },

    #[error("class '{class}' refers to unknown {kind} '{name}'")]
    UnresolvedReference {
        class: String,
        kind: &'static str,
        name: String,
    },

    #[error("inheritance cycle detected through '{0}'")]
    InheritanceCycle(String),

    #[error("unknown test class: {}", .0.join(", "))]
    UnknownClass(Vec<String>),

    #[error("invalid settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn discovery(origin: impl Display, reason: impl Display) -> Self {
        Error::Discovery {
            origin: origin.to_string(),
            reason: reason.to_string(),
        }
    }
}
