// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 Waddle Social

//! waddle-mood - publish your XMPP mood from the command line.

use std::ffi::OsString;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use waddle_mood::config::{self, DEFAULT_CONFIG_PATH};
use waddle_mood::session::DEFAULT_PORT;
use waddle_mood::stanza;
use waddle_mood::{Mood, MoodCatalog, MoodPublication, PublishStatus, Session, SessionOptions};

/// Publish an XEP-0107 user mood to your XMPP account
#[derive(Parser)]
#[command(name = "waddle-mood")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Credentials file (`username` and `password` lines)
    #[arg(short = 'f', long = "file", default_value = DEFAULT_CONFIG_PATH)]
    file: String,

    /// List the recognized moods and exit
    #[arg(short = 'l', long)]
    list: bool,

    /// Free-form text to publish alongside the mood
    #[arg(short = 't', long)]
    text: Option<String>,

    /// XMPP server host (defaults to SRV lookup on the JID domain)
    #[arg(long)]
    server: Option<String>,

    /// XMPP server port, used with --server
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait for the whole publish
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print the stanza instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Mood to publish (see --list)
    #[arg(required_unless_present = "list")]
    mood: Option<String>,
}

/// Parse the command line and validate the mood.
///
/// `--list` wins over the positional argument, so the mood is only checked
/// when it is going to be published. An unknown mood is reported as a clap
/// usage error.
fn parse_args<I, T>(args: I) -> Result<(Cli, Option<Mood>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    if cli.list {
        return Ok((cli, None));
    }

    let mood = cli
        .mood
        .as_deref()
        .map(Mood::parse)
        .transpose()
        .map_err(|e| Cli::command().error(ErrorKind::ValueValidation, e))?;
    Ok((cli, mood))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let (cli, mood) = parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());
    init_logging(cli.verbose);

    if cli.list {
        for mood in MoodCatalog::list() {
            println!("{mood}");
        }
        return Ok(());
    }

    let mood = mood.context("no mood given")?;
    let mut publication = MoodPublication::new(mood);
    if let Some(text) = cli.text {
        publication = publication.with_text(text);
    }

    let path = config::expand_tilde(&cli.file);
    let source = path.display().to_string();
    let credentials = config::load(&path)?;
    let credentials = credentials.require(&source)?;

    if cli.dry_run {
        println!("{}", String::from(&stanza::build(&publication)));
        return Ok(());
    }

    let options = SessionOptions {
        server: cli.server,
        port: cli.port,
        timeout: Duration::from_secs(cli.timeout),
        ..Default::default()
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut session = Session::new(&credentials, &options);
    let result = session.publish(&publication, cancel).await;
    session.close().await;

    let status = result.map_err(|e| {
        let what = if e.is_connection_failure() {
            "Can't connect to XMPP server"
        } else {
            "Can't publish mood"
        };
        anyhow::Error::new(e).context(format!("{what} as {}", session.jid()))
    })?;
    match status {
        PublishStatus::Success => info!("Mood set to {}", publication.mood),
        PublishStatus::ProtocolError { condition } => warn!(
            "Server rejected the mood: {}",
            condition.as_deref().unwrap_or("no condition given")
        ),
        PublishStatus::Unknown { type_ } => warn!(
            "Unexpected answer to the mood request (type {})",
            type_.as_deref().unwrap_or("missing")
        ),
    }

    Ok(())
}
