//! CLI integration tests for scholar
//!
//! Runs the binary with an isolated config directory and no API key, so no
//! test ever reaches the network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with its own config directory and no credentials
#[allow(deprecated)]
fn scholar_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scholar").unwrap();
    cmd.current_dir(config_dir.path());
    cmd.env("SCHOLAR_CONFIG_DIR", config_dir.path());
    cmd.env_remove("SCHOLAR_API_KEY");
    cmd.env_remove("OPENROUTER_API_KEY");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    scholar_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_uses_override_dir() {
    let dir = TempDir::new().unwrap();
    scholar_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(dir.path().to_string_lossy().as_ref()));
}

#[test]
fn test_config_set_get_and_reset() {
    let dir = TempDir::new().unwrap();

    scholar_cmd(&dir)
        .args(["config", "set", "cache.ttl_secs", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set cache.ttl_secs = 120"));
    assert!(dir.path().join("config.toml").exists());

    scholar_cmd(&dir)
        .args(["config", "get", "cache.ttl_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("120\n"));

    scholar_cmd(&dir)
        .args(["config", "reset"])
        .assert()
        .success();

    scholar_cmd(&dir)
        .args(["config", "get", "cache.ttl_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("3600\n"));
}

#[test]
fn test_config_list_shows_defaults() {
    let dir = TempDir::new().unwrap();
    scholar_cmd(&dir)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retry.max_retries = 3"))
        .stdout(predicate::str::contains("conversation.history_window = 5"))
        .stdout(predicate::str::contains("server.port = 8000"));
}

#[test]
fn test_config_rejects_api_key_and_unknown_keys() {
    let dir = TempDir::new().unwrap();

    scholar_cmd(&dir)
        .args(["config", "set", "llm.api_key", "sk-secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SCHOLAR_API_KEY"));

    scholar_cmd(&dir)
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_ask_without_api_key_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    scholar_cmd(&dir)
        .args(["ask", "what is 2 + 2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key configured"));
}
