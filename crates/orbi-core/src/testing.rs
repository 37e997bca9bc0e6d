//! In-memory relay client with per-URL scripted behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::event::SignedEvent;
use crate::relay::{AckPolicy, RelayClient, RelayConnection, RelayError};

/// How a scripted relay behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Accept,
    RefuseConnect,
    Reject,
    HangConnect,
    HangPublish,
    /// Connects after the delay, then hangs on publish.
    LateConnect(Duration),
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    scripts: Arc<HashMap<String, Script>>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    published: Arc<Mutex<Vec<(String, SignedEvent)>>>,
}

impl ScriptedClient {
    /// Relays not listed behave as [`Script::Accept`].
    pub fn new(scripts: &[(&str, Script)]) -> Self {
        Self {
            scripts: Arc::new(
                scripts
                    .iter()
                    .map(|(url, script)| ((*url).to_string(), *script))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Events accepted so far, with the relay that accepted them.
    pub fn published(&self) -> Vec<(String, SignedEvent)> {
        self.published.lock().expect("published lock").clone()
    }

    fn script(&self, url: &str) -> Script {
        self.scripts.get(url).copied().unwrap_or(Script::Accept)
    }
}

pub struct ScriptedConnection {
    url: String,
    script: Script,
    closes: Arc<AtomicUsize>,
    published: Arc<Mutex<Vec<(String, SignedEvent)>>>,
}

#[async_trait::async_trait]
impl RelayClient for ScriptedClient {
    type Connection = ScriptedConnection;

    async fn connect(&self, url: &str) -> Result<Self::Connection, RelayError> {
        let script = self.script(url);
        match script {
            Script::RefuseConnect => return Err(RelayError::Connect("connection refused".into())),
            Script::HangConnect => std::future::pending::<()>().await,
            Script::LateConnect(delay) => tokio::time::sleep(delay).await,
            _ => {}
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedConnection {
            url: url.to_string(),
            script,
            closes: Arc::clone(&self.closes),
            published: Arc::clone(&self.published),
        })
    }
}

#[async_trait::async_trait]
impl RelayConnection for ScriptedConnection {
    async fn publish(&mut self, event: &SignedEvent, _ack: AckPolicy) -> Result<(), RelayError> {
        match self.script {
            Script::Reject => Err(RelayError::Rejected("blocked: test relay".into())),
            Script::HangPublish | Script::LateConnect(_) => {
                std::future::pending::<()>().await;
                Ok(())
            }
            _ => {
                self.published
                    .lock()
                    .expect("published lock")
                    .push((self.url.clone(), event.clone()));
                Ok(())
            }
        }
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
