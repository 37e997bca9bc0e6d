//! Local relay stub shared by the e2e tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TEST_KEY_HEX: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

/// A relay on 127.0.0.1 that records every `EVENT` and answers with `OK`.
pub struct RelayStub {
    pub url: String,
    events: Arc<Mutex<Vec<Value>>>,
}

impl RelayStub {
    /// Relay that accepts every event.
    pub fn accepting() -> Self {
        Self::start(true)
    }

    /// Relay that rejects every event.
    pub fn rejecting() -> Self {
        Self::start(false)
    }

    fn start(accept: bool) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&events);
        let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("relay runtime");
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
                tx.send(listener.local_addr().expect("addr"))
                    .expect("report address");
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(stream, accept, Arc::clone(&recorded)));
                }
            });
        });

        let addr = rx.recv().expect("relay address");
        Self {
            url: format!("ws://{addr}"),
            events,
        }
    }

    /// Events received so far, in arrival order.
    pub fn events(&self) -> Vec<Value> {
        self.events.lock().expect("events lock").clone()
    }
}

async fn serve(stream: TcpStream, accept: bool, events: Arc<Mutex<Vec<Value>>>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    while let Some(Ok(msg)) = ws.next().await {
        let Message::Text(text) = msg else { continue };
        let Ok(frame) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        if frame[0] != "EVENT" {
            continue;
        }
        let event = frame[1].clone();
        let id = event["id"].as_str().unwrap_or_default().to_string();
        events.lock().expect("events lock").push(event);

        let reason = if accept { "" } else { "blocked: test relay" };
        let ok = json!(["OK", id, accept, reason]);
        if ws.send(Message::Text(ok.to_string())).await.is_err() {
            return;
        }
    }
}

/// `orbi` pointed at `dir` with an isolated config dir and the test key.
pub fn orbi_cmd(dir: &Path, relay: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orbi"));
    cmd.current_dir(dir);
    cmd.env("NOSTR_SECRET_PATH", dir.join("secret.key"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"));
    cmd.env("ORBI_LOG", "error");
    cmd.env_remove("ORBI_RELAYS");
    cmd.env_remove("FORMAT");
    cmd.args(["--relay", relay, "--timeout", "5"]);
    cmd
}

/// Write the test key where [`orbi_cmd`] expects it.
pub fn write_key(dir: &Path) {
    std::fs::write(dir.join("secret.key"), format!("{TEST_KEY_HEX}\n")).expect("write key");
}

/// Run with `--json` and parse stdout, asserting success.
pub fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().expect("orbi should not crash");
    assert!(
        output.status.success(),
        "orbi failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

/// Whether an event carries exactly this tag.
pub fn has_tag(event: &Value, tag: &[&str]) -> bool {
    event["tags"]
        .as_array()
        .is_some_and(|tags| tags.iter().any(|t| *t == json!(tag)))
}
