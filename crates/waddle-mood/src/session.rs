// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 Waddle Social

//! XMPP session for a single publish.
//!
//! Uses `tokio-xmpp::AsyncClient` directly so the raw IQ answer can be
//! matched by id and classified with [`stanza::classify_response`]. The
//! event loop is folded into one async call that ends with exactly one
//! terminal result.

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tokio_xmpp::AsyncClient;
use tokio_xmpp::Event as TokioXmppEvent;
use tracing::{debug, info, warn};
use xmpp_parsers::jid::Jid;

use crate::config::ResolvedCredentials;
use crate::error::SessionError;
use crate::mood::MoodPublication;
use crate::stanza::{self, PublishStatus, MOOD_REQUEST_ID};

/// Default client-to-server port.
pub const DEFAULT_PORT: u16 = 5222;

/// Connection settings that do not come from the credentials file.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// XMPP server host (if different from the JID domain).
    pub server: Option<String>,
    /// Port used with `server`.
    pub port: u16,
    /// Upper bound for connecting, publishing and waiting for the answer.
    pub timeout: Duration,
    /// Id given to the publish IQ.
    pub request_id: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(30),
            request_id: MOOD_REQUEST_ID.to_string(),
        }
    }
}

/// One authenticated XMPP connection, owned by the invocation.
pub struct Session {
    client: AsyncClient<tokio_xmpp::starttls::ServerConfig>,
    jid: Jid,
    timeout: Duration,
    request_id: String,
}

impl Session {
    /// Create the client. Connecting starts on the first poll.
    pub fn new(credentials: &ResolvedCredentials, options: &SessionOptions) -> Self {
        let server_config = if let Some(ref host) = options.server {
            tokio_xmpp::starttls::ServerConfig::Manual {
                host: host.clone(),
                port: options.port,
            }
        } else {
            tokio_xmpp::starttls::ServerConfig::UseSrv
        };

        info!("Creating XMPP client for {}", credentials.jid);

        let client_config = tokio_xmpp::AsyncConfig {
            jid: credentials.jid.clone(),
            password: credentials.password.clone(),
            server: server_config,
        };

        let mut client = AsyncClient::new_with_config(client_config);
        // One attempt per invocation.
        client.set_reconnect(false);

        Self {
            client,
            jid: credentials.jid.clone(),
            timeout: options.timeout,
            request_id: options.request_id.clone(),
        }
    }

    pub fn jid(&self) -> &Jid {
        &self.jid
    }

    /// Connect, publish `publication` and wait for the server's answer.
    ///
    /// Resolves once: with the classified answer, or with a transport error
    /// when the connection fails, the stream ends, the timeout expires or
    /// `cancel` fires.
    pub async fn publish(
        &mut self,
        publication: &MoodPublication,
        cancel: CancellationToken,
    ) -> Result<PublishStatus, SessionError> {
        let timeout = self.timeout;

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Publish cancelled");
                Err(SessionError::Cancelled)
            }

            result = tokio::time::timeout(timeout, self.drive(publication)) => {
                result.unwrap_or(Err(SessionError::Timeout(timeout)))
            }
        }
    }

    async fn drive(&mut self, publication: &MoodPublication) -> Result<PublishStatus, SessionError> {
        let mut sent = false;

        loop {
            match self.client.next().await {
                Some(TokioXmppEvent::Online { .. }) => {
                    if sent {
                        continue;
                    }
                    info!("XMPP connected as {}", self.jid);

                    let request = stanza::build_with_id(publication, &self.request_id);
                    self.client
                        .send_stanza(request)
                        .await
                        .map_err(|e| SessionError::Send(e.to_string()))?;
                    sent = true;
                    info!(
                        "Published mood {} (id={}), waiting for answer",
                        publication.mood, self.request_id
                    );
                }
                Some(TokioXmppEvent::Disconnected(err)) => {
                    warn!("XMPP disconnected: {err}");
                    return Err(if sent {
                        SessionError::Disconnected(err.to_string())
                    } else {
                        SessionError::Connection(err.to_string())
                    });
                }
                Some(TokioXmppEvent::Stanza(elem)) => {
                    if sent && stanza::is_response_to(&elem, &self.request_id) {
                        let status = stanza::classify_response(&elem);
                        debug!("Publish answer: {:?}", status);
                        return Ok(status);
                    }
                    debug!("Ignoring stanza: {}", elem.name());
                }
                None => return Err(SessionError::StreamEnded),
            }
        }
    }

    /// Close the stream, waiting at most two seconds.
    pub async fn close(&mut self) {
        info!("Disconnecting XMPP client");
        match tokio::time::timeout(Duration::from_secs(2), self.client.send_end()).await {
            Ok(Ok(())) => debug!("Stream closed"),
            Ok(Err(e)) => debug!("Stream close failed: {e}"),
            Err(_) => debug!("Stream close timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;
    use std::str::FromStr;
    use tracing_test::traced_test;

    fn credentials() -> ResolvedCredentials {
        ResolvedCredentials {
            jid: Jid::from_str("alice@localhost").unwrap(),
            password: "s3cret".into(),
        }
    }

    fn unreachable_options(timeout: Duration) -> SessionOptions {
        SessionOptions {
            server: Some("127.0.0.1".into()),
            port: 1,
            timeout,
            ..Default::default()
        }
    }

    #[test]
    fn default_options() {
        let options = SessionOptions::default();
        assert_eq!(options.port, 5222);
        assert_eq!(options.request_id, "mood1");
        assert!(options.server.is_none());
    }

    #[tokio::test]
    async fn publish_honours_cancellation() {
        let mut session = Session::new(&credentials(), &unreachable_options(Duration::from_secs(5)));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let publication = MoodPublication::new(Mood::parse("happy").unwrap());
        let result = session.publish(&publication, cancel).await;
        assert!(matches!(result, Err(SessionError::Cancelled)));
    }

    #[tokio::test]
    #[traced_test]
    async fn close_logs_its_outcome() {
        let mut session = Session::new(&credentials(), &unreachable_options(Duration::from_secs(5)));
        session.close().await;
        assert!(logs_contain("Stream close"));
    }

    #[tokio::test]
    async fn publish_fails_without_server() {
        let mut session = Session::new(&credentials(), &unreachable_options(Duration::from_secs(5)));
        assert_eq!(session.jid().to_string(), "alice@localhost");

        let publication = MoodPublication::new(Mood::parse("happy").unwrap());
        let result = session.publish(&publication, CancellationToken::new()).await;
        assert!(result.is_err());
    }
}
