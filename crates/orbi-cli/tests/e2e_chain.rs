//! E2E tests for the publish → commit → confluence flow against a local relay.

mod support;

use predicates::prelude::*;
use std::fs;
use support::{RelayStub, has_tag, orbi_cmd, run_json, write_key};
use tempfile::TempDir;

fn setup() -> (TempDir, RelayStub) {
    let dir = TempDir::new().unwrap();
    write_key(dir.path());
    (dir, RelayStub::accepting())
}

#[test]
fn publish_records_root_equal_to_broadcast_id() {
    let (dir, relay) = setup();
    fs::write(dir.path().join("draft.md"), "# Draft\n").unwrap();

    let published = run_json(orbi_cmd(dir.path(), &relay.url).args(["publish", "draft.md"]));
    let root = published["root"].as_str().expect("root in output").to_string();

    assert_eq!(root.len(), 64);
    assert!(root.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(
        fs::read_to_string(dir.path().join(".orbi/draft.md/root_event_id")).unwrap(),
        format!("{root}\n")
    );
    assert_eq!(
        fs::read_to_string(dir.path().join(".orbi/tracked_files")).unwrap(),
        "draft.md\n"
    );

    let events = relay.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], root.as_str());
    assert_eq!(events[0]["kind"], 4444);
    assert_eq!(events[0]["content"], "# Draft\n");
    assert!(has_tag(&events[0], &["f", "draft.md"]));
    assert_eq!(published["report"]["accepted"][0], relay.url.as_str());
}

#[test]
fn commit_replies_to_root_and_leaves_pointers() {
    let (dir, relay) = setup();
    let path = dir.path().join("draft.md");
    fs::write(&path, "v1").unwrap();

    let root = run_json(orbi_cmd(dir.path(), &relay.url).args(["publish", "draft.md"]))["root"]
        .as_str()
        .unwrap()
        .to_string();
    let root_file = dir.path().join(".orbi/draft.md/root_event_id");
    let root_before = fs::read(&root_file).unwrap();

    fs::write(&path, "v2").unwrap();
    let committed = run_json(
        orbi_cmd(dir.path(), &relay.url).args(["commit", "draft.md", "fix typo"]),
    );

    assert_eq!(committed["root"], root.as_str());
    assert_eq!(committed["parent"], root.as_str());
    assert!(committed["head"].is_null());

    let events = relay.events();
    assert_eq!(events.len(), 2);
    let commit = &events[1];
    assert_eq!(commit["id"], committed["event_id"]);
    assert_eq!(commit["content"], "v2");
    assert!(has_tag(commit, &["e", root.as_str(), "", "root"]));
    assert!(has_tag(commit, &["e", root.as_str(), "", "reply"]));
    assert!(has_tag(commit, &["m", "fix typo"]));

    assert_eq!(fs::read(&root_file).unwrap(), root_before);
    assert!(!dir.path().join(".orbi/draft.md/HEAD").exists());
}

#[test]
fn publish_twice_is_refused_without_network() {
    let (dir, relay) = setup();
    fs::write(dir.path().join("draft.md"), "v1").unwrap();

    orbi_cmd(dir.path(), &relay.url)
        .args(["publish", "draft.md"])
        .assert()
        .success();

    orbi_cmd(dir.path(), &relay.url)
        .args(["publish", "draft.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"))
        .stderr(predicate::str::contains("already published"));

    assert_eq!(relay.events().len(), 1);
}

#[test]
fn commit_before_publish_fails_without_network() {
    let (dir, relay) = setup();
    fs::write(dir.path().join("draft.md"), "v1").unwrap();

    orbi_cmd(dir.path(), &relay.url)
        .args(["commit", "draft.md", "-m", "early"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"))
        .stderr(predicate::str::contains("orbi publish"));

    assert!(relay.events().is_empty());
    assert!(!dir.path().join(".orbi").exists());
}

#[test]
fn rejecting_relay_fails_publish_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_key(dir.path());
    let relay = RelayStub::rejecting();
    fs::write(dir.path().join("draft.md"), "v1").unwrap();

    let output = orbi_cmd(dir.path(), &relay.url)
        .args(["publish", "draft.md", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let err: serde_json::Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E4001");
    assert_eq!(err["error"]["summary"], "No relay accepted the event");
    assert_eq!(relay.events().len(), 1);
    assert!(!dir.path().join(".orbi/draft.md/root_event_id").exists());
}

#[test]
fn one_live_relay_among_failures_is_enough() {
    let (dir, relay) = setup();
    let rejecting = RelayStub::rejecting();
    fs::write(dir.path().join("draft.md"), "v1").unwrap();

    let published = run_json(orbi_cmd(dir.path(), &relay.url).args([
        "--relay",
        rejecting.url.as_str(),
        "publish",
        "draft.md",
    ]));

    assert_eq!(published["report"]["accepted"].as_array().unwrap().len(), 1);
    assert_eq!(published["report"]["failed"][0]["relay"], rejecting.url.as_str());
    assert!(dir.path().join(".orbi/draft.md/root_event_id").exists());
}

#[test]
fn confluence_defaults_to_tracked_files() {
    let (dir, relay) = setup();
    for name in ["a.md", "b.md"] {
        fs::write(dir.path().join(name), name).unwrap();
        orbi_cmd(dir.path(), &relay.url)
            .args(["publish", name])
            .assert()
            .success();
    }

    let out = run_json(orbi_cmd(dir.path(), &relay.url).args(["confluence", "-m", "merge"]));
    assert_eq!(out["references"], serde_json::json!(["a.md", "b.md"]));

    let events = relay.events();
    let confluence = events.last().unwrap();
    assert_eq!(confluence["kind"], 4445);
    assert_eq!(confluence["content"], "merge");
    assert!(has_tag(confluence, &["f", "a.md"]));
    assert!(has_tag(confluence, &["f", "b.md"]));
}

#[test]
fn confluence_classifies_explicit_references() {
    let (dir, relay) = setup();
    let id = "a1".repeat(32);

    orbi_cmd(dir.path(), &relay.url)
        .args(["confluence", id.as_str(), "notes.md", "-m", "merge"])
        .assert()
        .success();

    let events = relay.events();
    assert!(has_tag(&events[0], &["e", id.as_str()]));
    assert!(has_tag(&events[0], &["f", "notes.md"]));
}

#[test]
fn confluence_with_nothing_tracked_fails() {
    let (dir, relay) = setup();

    orbi_cmd(dir.path(), &relay.url)
        .args(["confluence", "-m", "merge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));

    assert!(relay.events().is_empty());
}
