// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 Waddle Social

//! Credentials file parsing.
//!
//! The file is line oriented: one `key value` directive per logical line,
//! `#` comment lines, and backslash continuation. Recognized keys are
//! `username` and `password` (case-insensitive). The first bad line aborts
//! the whole load.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;
use xmpp_parsers::jid::Jid;

use crate::error::{ConfigError, SyntaxKind};

/// Default credentials file, relative to the user's home directory.
pub const DEFAULT_CONFIG_PATH: &str = "~/.xmppcfg";

/// Recognized configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Username,
    Password,
}

impl Keyword {
    const ALL: [(&'static str, Keyword); 2] = [
        ("username", Keyword::Username),
        ("password", Keyword::Password),
    ];

    fn lookup(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, keyword)| *keyword)
    }

    fn name(self) -> &'static str {
        match self {
            Keyword::Username => "username",
            Keyword::Password => "password",
        }
    }
}

/// Credentials read from the configuration file.
///
/// Both fields stay `None` until a matching line is seen; a repeated key
/// overwrites the earlier value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Credentials {
    /// Check that both keys were set and that the username is a JID.
    ///
    /// `source` names the file in error messages.
    pub fn require(&self, source: &str) -> Result<ResolvedCredentials, ConfigError> {
        let username = self.username.as_deref().ok_or_else(|| ConfigError::MissingKey {
            file: source.to_string(),
            key: Keyword::Username.name(),
        })?;
        let password = self.password.clone().ok_or_else(|| ConfigError::MissingKey {
            file: source.to_string(),
            key: Keyword::Password.name(),
        })?;

        let jid = Jid::from_str(username).map_err(|e| ConfigError::InvalidJid {
            jid: username.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ResolvedCredentials { jid, password })
    }

    fn assign(&mut self, keyword: Keyword, value: &str) {
        let slot = match keyword {
            Keyword::Username => &mut self.username,
            Keyword::Password => &mut self.password,
        };
        *slot = Some(value.to_string());
    }
}

/// Credentials ready to hand to a session.
#[derive(Clone)]
pub struct ResolvedCredentials {
    pub jid: Jid,
    pub password: String,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("jid", &self.jid)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One `key value` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConfigLine<'a> {
    key: &'a str,
    value: &'a str,
}

/// A line after continuation joining, numbered by its last physical line.
#[derive(Debug, PartialEq, Eq)]
struct LogicalLine {
    number: usize,
    text: String,
}

/// Whitespace as the C locale's `isspace` sees it.
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Strip one continuation backslash, if the line ends in an odd run of them.
fn strip_continuation(line: &str) -> Option<&str> {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        Some(&line[..line.len() - 1])
    } else {
        None
    }
}

fn logical_lines(contents: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for (idx, raw) in contents.split('\n').enumerate() {
        let number = idx + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        let (piece, continues) = if raw.trim_start_matches(is_space).starts_with('#') {
            ("", false)
        } else {
            match strip_continuation(raw) {
                Some(head) => (head, true),
                None => (raw, false),
            }
        };

        let mut text = pending.take().unwrap_or_default();
        text.push_str(piece);

        if continues {
            pending = Some(text);
        } else {
            lines.push(LogicalLine { number, text });
        }
    }

    if let Some(text) = pending {
        // A continuation on the final line still counts as that line.
        let number = contents.split('\n').count();
        lines.push(LogicalLine { number, text });
    }

    lines
}

/// Split a directive into key and value. `Ok(None)` for blank lines.
fn tokenize(text: &str) -> Result<Option<ConfigLine<'_>>, SyntaxKind> {
    let rest = text.trim_start_matches(is_space);
    if rest.trim_end_matches(is_space).is_empty() {
        return Ok(None);
    }

    let sep = rest.find([' ', '\t']).ok_or(SyntaxKind::MissingValue)?;
    let (key, value) = rest.split_at(sep);
    let value = value.trim_matches(is_space);
    if value.is_empty() {
        return Err(SyntaxKind::MissingValue);
    }

    Ok(Some(ConfigLine { key, value }))
}

/// Parse configuration text. `source` names the input in error messages.
pub fn parse(source: &str, contents: &str) -> Result<Credentials, ConfigError> {
    let mut credentials = Credentials::default();

    for line in logical_lines(contents) {
        let syntax_error = |kind: SyntaxKind| {
            let text = line.text.trim_matches(is_space);
            ConfigError::Syntax {
                file: source.to_string(),
                line: line.number,
                kind,
                // Quote only the key so a mistyped directive never echoes a secret.
                text: text
                    .split([' ', '\t'])
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            }
        };

        let Some(directive) = tokenize(&line.text).map_err(syntax_error)? else {
            continue;
        };
        let keyword =
            Keyword::lookup(directive.key).ok_or_else(|| syntax_error(SyntaxKind::BadOption))?;

        debug!(line = line.number, key = keyword.name(), "config directive");
        credentials.assign(keyword, directive.value);
    }

    Ok(credentials)
}

/// Read and parse the configuration file at `path`.
///
/// The file is read as bytes; invalid UTF-8 sequences become U+FFFD rather
/// than failing the load.
pub fn load(path: impl AsRef<Path>) -> Result<Credentials, ConfigError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let contents = String::from_utf8_lossy(&bytes);

    let credentials = parse(&path.display().to_string(), &contents)?;
    debug!("Loaded configuration from {}", path.display());
    Ok(credentials)
}

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// `~user` forms are not looked up and are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let expanded = if path == "~" {
        dirs::home_dir()
    } else {
        path.strip_prefix("~/")
            .and_then(|rest| dirs::home_dir().map(|home| home.join(rest)))
    };
    expanded.unwrap_or_else(|| PathBuf::from(path))
}
