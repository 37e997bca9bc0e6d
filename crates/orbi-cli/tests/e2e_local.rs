//! E2E tests for commands that only touch local state: key loading,
//! status, head pointers, completions.

mod support;

use predicates::prelude::*;
use std::fs;
use support::{RelayStub, orbi_cmd, run_json, write_key};
use tempfile::TempDir;

/// A relay URL nothing listens on. Commands under test must not need it.
const NO_RELAY: &str = "ws://127.0.0.1:9";

#[test]
fn missing_key_fails_before_network() {
    let dir = TempDir::new().unwrap();
    let relay = RelayStub::accepting();
    fs::write(dir.path().join("draft.md"), "v1").unwrap();

    orbi_cmd(dir.path(), &relay.url)
        .args(["publish", "draft.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));

    assert!(relay.events().is_empty());
    assert!(!dir.path().join(".orbi").exists());
}

#[test]
fn malformed_key_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("secret.key"), "not-a-key\n").unwrap();

    orbi_cmd(dir.path(), NO_RELAY)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn whoami_prints_hex_pubkey() {
    let dir = TempDir::new().unwrap();
    write_key(dir.path());

    let out = run_json(orbi_cmd(dir.path(), NO_RELAY).arg("whoami"));
    let pubkey = out["pubkey"].as_str().expect("pubkey");
    assert_eq!(pubkey.len(), 64);
    assert!(pubkey.bytes().all(|b| b.is_ascii_hexdigit()));

    orbi_cmd(dir.path(), NO_RELAY)
        .arg("whoami")
        .assert()
        .success()
        .stdout(format!("{pubkey}\n"));
}

#[test]
#[cfg(target_os = "linux")]
fn user_config_file_supplies_secret_path() {
    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("elsewhere.key");
    fs::write(&key_path, format!("{}\n", support::TEST_KEY_HEX)).unwrap();
    let config_dir = dir.path().join("config/orbi");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!("secret_path = {:?}\n", key_path.display().to_string()),
    )
    .unwrap();

    orbi_cmd(dir.path(), NO_RELAY)
        .env_remove("NOSTR_SECRET_PATH")
        .arg("whoami")
        .assert()
        .success();
}

#[test]
fn status_is_empty_before_publishing() {
    let dir = TempDir::new().unwrap();

    let out = run_json(orbi_cmd(dir.path(), NO_RELAY).arg("status"));
    assert_eq!(out, serde_json::json!([]));
}

#[test]
fn status_and_head_after_publish() {
    let dir = TempDir::new().unwrap();
    write_key(dir.path());
    let relay = RelayStub::accepting();
    fs::write(dir.path().join("draft.md"), "v1").unwrap();

    let root = run_json(orbi_cmd(dir.path(), &relay.url).args(["publish", "draft.md"]))["root"]
        .as_str()
        .unwrap()
        .to_string();

    let status = run_json(orbi_cmd(dir.path(), NO_RELAY).arg("status"));
    assert_eq!(status[0]["file"], "draft.md");
    assert_eq!(status[0]["root"], root.as_str());
    assert!(status[0]["head"].is_null());

    let head = "cd".repeat(32);
    let moved = run_json(orbi_cmd(dir.path(), NO_RELAY).args(["head", "draft.md", head.as_str()]));
    assert_eq!(moved["head"], head.as_str());
    assert_eq!(
        fs::read_to_string(dir.path().join(".orbi/draft.md/HEAD")).unwrap(),
        format!("{head}\n")
    );

    let shown = run_json(orbi_cmd(dir.path(), NO_RELAY).args(["head", "draft.md"]));
    assert_eq!(shown["root"], root.as_str());
    assert_eq!(shown["head"], head.as_str());
}

#[test]
fn head_rejects_bad_ids_and_unpublished_files() {
    let dir = TempDir::new().unwrap();
    let id = "ab".repeat(32);

    orbi_cmd(dir.path(), NO_RELAY)
        .args(["head", "draft.md", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));

    orbi_cmd(dir.path(), NO_RELAY)
        .args(["head", "draft.md", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2004"));
}

#[test]
fn completions_generate_for_bash() {
    let dir = TempDir::new().unwrap();

    orbi_cmd(dir.path(), NO_RELAY)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("orbi"));
}
