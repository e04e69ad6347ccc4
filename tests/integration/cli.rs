//! Runs the `focus` binary against a sandboxed config.

use super::helpers::{Sandbox, ETC_HOSTS};
use focus::hosts::render_block;
use std::fs;
use std::process::{Command, Output};

fn focus(sandbox: &Sandbox, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_focus"))
        .args(args)
        .arg("--config")
        .arg(&sandbox.config_path)
        .env_remove("FOCUS_CONFIG")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run focus")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_add_list_remove_round() {
    let sandbox = Sandbox::new(&[]);

    let output = focus(&sandbox, &["add", "https://www.YouTube.com/feed", "reddit.com"]);
    assert!(output.status.success());
    assert_eq!(
        sandbox.config().blocked_sites,
        vec!["www.youtube.com".to_string(), "reddit.com".to_string()]
    );

    let output = focus(&sandbox, &["list"]);
    assert!(output.status.success());
    let listed = stdout(&output);
    assert!(listed.contains("www.youtube.com"));
    assert!(listed.contains("reddit.com"));

    let output = focus(&sandbox, &["remove", "reddit.com"]);
    assert!(output.status.success());
    assert_eq!(
        sandbox.config().blocked_sites,
        vec!["www.youtube.com".to_string()]
    );
}

#[test]
fn test_status_when_idle() {
    let sandbox = Sandbox::new(&["x.com"]);

    let output = focus(&sandbox, &["status"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Focus is not running"));
    assert!(text.contains("Sites are not blocked"));
}

#[test]
fn test_stop_cleans_leftover_block() {
    let sandbox = Sandbox::new(&["x.com"]);
    let block = render_block("127.0.0.1", &["x.com".to_string()]);
    fs::write(&sandbox.hosts, format!("{ETC_HOSTS}{block}")).unwrap();

    let output = focus(&sandbox, &["stop"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No active focus session found"));
    assert_eq!(sandbox.hosts_content(), ETC_HOSTS);
}

#[test]
fn test_start_with_missing_config_fails() {
    let sandbox = Sandbox::new(&["x.com"]);
    fs::remove_file(&sandbox.config_path).unwrap();

    let output = focus(&sandbox, &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config.toml"));
}

#[test]
fn test_start_when_already_blocked_is_a_noop() {
    let sandbox = Sandbox::new(&["x.com"]);
    let blocked = format!("{ETC_HOSTS}{}", render_block("127.0.0.1", &[]));
    fs::write(&sandbox.hosts, &blocked).unwrap();

    let output = focus(&sandbox, &["start", "-d", "1"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Blocking is already active"));
    assert_eq!(sandbox.hosts_content(), blocked);
}

#[test]
fn test_completions_for_bash() {
    let sandbox = Sandbox::new(&[]);
    let output = focus(&sandbox, &["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("focus"));
}

#[test]
fn test_completions_unknown_shell() {
    let sandbox = Sandbox::new(&[]);
    let output = focus(&sandbox, &["completions", "powershell"]);

    assert_eq!(output.status.code(), Some(1));
}
