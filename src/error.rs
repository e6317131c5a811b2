//! Request-scoped error kinds.

use std::time::Duration;

use thiserror::Error;

use crate::reply::Reply;

/// Prefix of every reply produced from an unexpected failure.
pub const FAILURE_PREFIX: &str = "Ups, error: ";

#[derive(Error, Debug)]
pub enum CommandError {
    /// Wrong arity or value; carries the usage text and optional corrections.
    #[error("{message}")]
    Usage {
        message: String,
        suggestions: Vec<String>,
    },

    #[error("Incorrect verb")]
    IncorrectVerb(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect output of {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs} seconds", secs = .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

impl CommandError {
    pub fn usage(message: impl Into<String>) -> Self {
        CommandError::Usage {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn usage_with<I, S>(message: impl Into<String>, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandError::Usage {
            message: message.into(),
            suggestions: suggestions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn into_reply(self) -> Reply {
        match self {
            CommandError::Usage {
                message,
                suggestions,
            } => Reply::suggested(message, suggestions),
            err @ CommandError::IncorrectVerb(_) => Reply::plain(err.to_string()),
            other => failure_reply(other),
        }
    }
}

pub fn failure_reply(message: impl std::fmt::Display) -> Reply {
    Reply::plain(format!("{}{}", FAILURE_PREFIX, message))
}
