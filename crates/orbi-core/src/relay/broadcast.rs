//! Concurrent publish of one event to many relays.
//!
//! One attempt runs per configured relay (duplicates included). Each attempt
//! connects, publishes under the per-relay timeout, and always closes the
//! connection it opened. Every attempt also runs under one shared deadline
//! sized so that all relays could time out back to back:
//!
//! ```text
//! deadline = relays × per_relay_timeout + slack
//! ```
//!
//! Attempts are joined, never cancelled early on the first success. The
//! result is the collected outcome of each attempt, so there is no shared
//! mutable state between them.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use super::{AckPolicy, RelayClient, RelayConnection, RelayError};
use crate::error::ErrorCode;
use crate::event::SignedEvent;

/// Fallback for deadlines that overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Relay set and timing for one broadcaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    pub relays: Vec<String>,
    pub per_relay_timeout: Duration,
    pub deadline_slack: Duration,
    pub ack: AckPolicy,
}

impl BroadcastConfig {
    /// Shared deadline for one broadcast.
    #[must_use]
    pub fn overall_deadline(&self) -> Duration {
        let count = u32::try_from(self.relays.len()).unwrap_or(u32::MAX);
        self.per_relay_timeout
            .checked_mul(count)
            .unwrap_or(Duration::MAX)
            .saturating_add(self.deadline_slack)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            relays: crate::config::default_relays(),
            per_relay_timeout: Duration::from_secs(crate::config::DEFAULT_RELAY_TIMEOUT_SECS),
            deadline_slack: Duration::from_secs(crate::config::DEFAULT_DEADLINE_SLACK_SECS),
            ack: AckPolicy::default(),
        }
    }
}

/// One relay that did not accept the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayFailure {
    pub relay: String,
    pub reason: String,
}

/// Outcome of a broadcast where at least one relay accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub event_id: String,
    pub accepted: Vec<String>,
    pub failed: Vec<RelayFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("no relay accepted the event ({attempted} attempted)")]
    NoRelayAccepted {
        attempted: usize,
        failures: Vec<RelayFailure>,
    },
}

impl BroadcastError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NoRelayAccepted { .. } => ErrorCode::NoRelayAccepted,
        }
    }
}

/// Publishes signed events to every configured relay.
#[derive(Debug, Clone)]
pub struct Broadcaster<C> {
    client: C,
    config: BroadcastConfig,
}

impl<C: RelayClient> Broadcaster<C> {
    pub const fn new(client: C, config: BroadcastConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub const fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Publish `event` to all relays and wait for every attempt to finish.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::NoRelayAccepted`] when zero relays accepted,
    /// including when the relay list is empty.
    pub async fn publish(&self, event: &SignedEvent) -> Result<BroadcastReport, BroadcastError> {
        let overall = self.config.overall_deadline();
        let now = Instant::now();
        let deadline = now.checked_add(overall).unwrap_or(now + FAR_FUTURE);

        info!(
            event_id = event.id(),
            relays = self.config.relays.len(),
            ?overall,
            "broadcasting event"
        );

        let attempts = self.config.relays.iter().map(|url| async move {
            let result = self.attempt(url, event, deadline, overall).await;
            (url, result)
        });
        let outcomes = join_all(attempts).await;

        let mut report = BroadcastReport {
            event_id: event.id().to_string(),
            accepted: Vec::new(),
            failed: Vec::new(),
        };
        for (url, result) in outcomes {
            match result {
                Ok(()) => {
                    debug!(relay = %url, "relay accepted event");
                    report.accepted.push(url.clone());
                }
                Err(e) => {
                    warn!(relay = %url, error = %e, "relay did not accept event");
                    report.failed.push(RelayFailure {
                        relay: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.accepted.is_empty() {
            return Err(BroadcastError::NoRelayAccepted {
                attempted: self.config.relays.len(),
                failures: report.failed,
            });
        }

        info!(
            event_id = event.id(),
            accepted = report.accepted.len(),
            failed = report.failed.len(),
            "broadcast complete"
        );
        Ok(report)
    }

    /// One relay: connect, publish, close. The shared deadline bounds connect
    /// and publish; close runs whenever a connection was opened.
    async fn attempt(
        &self,
        url: &str,
        event: &SignedEvent,
        deadline: Instant,
        overall: Duration,
    ) -> Result<(), RelayError> {
        let per_relay = self.config.per_relay_timeout;
        let mut conn = timeout_at(deadline, self.client.connect(url))
            .await
            .unwrap_or(Err(RelayError::Timeout(overall)))?;

        let publish = timeout(per_relay, conn.publish(event, self.config.ack));
        let result = match timeout_at(deadline, publish).await {
            Ok(Ok(published)) => published,
            Ok(Err(_)) => Err(RelayError::Timeout(per_relay)),
            Err(_) => Err(RelayError::Timeout(overall)),
        };

        if timeout(per_relay, conn.close()).await.is_err() {
            debug!(relay = url, "close timed out");
        }
        result
    }
}
