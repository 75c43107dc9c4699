// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 Waddle Social

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    /// No separator after the key, or nothing but whitespace after it.
    MissingValue,
    /// The key is not one of the recognized options.
    BadOption,
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxKind::MissingValue => f.write_str("missing value"),
            SyntaxKind::BadOption => f.write_str("bad option"),
        }
    }
}

/// Failure to read the credentials file or to turn it into usable
/// credentials. The first error aborts the load.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: error {kind} for {text}")]
    Syntax {
        file: String,
        line: usize,
        kind: SyntaxKind,
        text: String,
    },

    #[error("{file}: no {key} configured")]
    MissingKey { file: String, key: &'static str },

    #[error("invalid JID {jid:?}: {reason}")]
    InvalidJid { jid: String, reason: String },
}

impl ConfigError {
    /// Line number of a syntax error, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ConfigError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Kind of a syntax error, if this is one.
    pub fn syntax_kind(&self) -> Option<SyntaxKind> {
        match self {
            ConfigError::Syntax { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood: {token:?}")]
pub struct InvalidMoodError {
    pub token: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("disconnected before the server answered: {0}")]
    Disconnected(String),

    #[error("XMPP stream ended unexpectedly")]
    StreamEnded,

    #[error("failed to send stanza: {0}")]
    Send(String),

    #[error("no answer from the server after {0:?}")]
    Timeout(std::time::Duration),

    #[error("publish cancelled")]
    Cancelled,
}

impl SessionError {
    /// Whether the connection never reached the online state.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, SessionError::Connection(_))
    }
}
