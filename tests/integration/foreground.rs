//! A foreground session served over the control socket.
//!
//! `run_foreground` installs the process signal handler, which can only
//! happen once per test binary, so this file holds a single session test.

use super::helpers::{Sandbox, ETC_HOSTS};
use focus::daemon::{DaemonStatus, FocusDaemon, Request, Response};
use focus::hosts::{is_blocked, BLOCK_BEGIN};
use focus::session::{Session, SessionOutcome, SessionPlan};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_foreground_session_status_and_stop() {
    let sandbox = Sandbox::new(&["youtube.com", "reddit.com"]);
    let config = sandbox.config();

    let mut plan = SessionPlan::from_config(&config, false, false);
    plan.flush_dns = false;
    plan.check_interval = Duration::from_millis(50);
    let session = Session::new(plan);

    let run_dir = sandbox.run_dir.clone();
    let daemon = FocusDaemon::new(&run_dir);
    let handle = thread::spawn(move || daemon.run_foreground(&session));

    let deadline = Instant::now() + Duration::from_secs(5);
    while FocusDaemon::check_status(&run_dir) != DaemonStatus::Running {
        assert!(Instant::now() < deadline, "session never came up");
        thread::sleep(Duration::from_millis(20));
    }

    let content = sandbox.hosts_content();
    assert!(is_blocked(&content));
    assert!(content.starts_with(ETC_HOSTS));
    assert!(content.contains("127.0.0.1\tyoutube.com\n"));
    assert_eq!(FocusDaemon::read_pid(&run_dir), Some(std::process::id()));

    let info = FocusDaemon::query_status(&run_dir).expect("status query failed");
    assert_eq!(info.sites.len(), 2);
    let ends_at = info.ends_at.expect("default duration is timed");
    assert_eq!(ends_at - info.started_at, chrono::Duration::minutes(25));

    match FocusDaemon::request(&run_dir, &Request::Stop).expect("stop failed") {
        Response::Ok => {}
        other => panic!("Expected Ok, got {other:?}"),
    }

    let outcome = handle.join().unwrap().expect("session failed");
    assert_eq!(outcome, SessionOutcome::Interrupted);
    assert_eq!(sandbox.hosts_content(), ETC_HOSTS);
    assert!(!sandbox.hosts_content().contains(BLOCK_BEGIN));
    assert_eq!(FocusDaemon::check_status(&run_dir), DaemonStatus::NotRunning);
}
