// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 Waddle Social

//! Publish an XEP-0107 user mood over XMPP PubSub.
//!
//! - [`config`]: credentials file parsing
//! - [`mood`]: the mood vocabulary and validated [`mood::MoodPublication`]s
//! - [`stanza`]: the publish IQ and classification of the server's answer
//! - [`session`]: a single-use tokio-xmpp session

pub mod config;
pub mod error;
pub mod mood;
pub mod session;
pub mod stanza;

pub use config::{Credentials, ResolvedCredentials};
pub use error::{ConfigError, InvalidMoodError, SessionError, SyntaxKind};
pub use mood::{Mood, MoodCatalog, MoodPublication};
pub use session::{Session, SessionOptions};
pub use stanza::PublishStatus;
