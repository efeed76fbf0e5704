use std::time::{Duration, Instant};

use serlink::session::SessionPhase;
use serlink::{BridgeConfig, BridgeError, Session};
use tokio::net::TcpListener;

fn alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

/// Find a port with nothing listening on it.
async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn failed_connect_still_tears_down_the_emulator() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("emulator.pid");

    // The shell writes its own pid before exec, so the pid survives into the
    // long-running process and can be checked after the session ends.
    let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());
    let config = BridgeConfig {
        host: "127.0.0.1".to_string(),
        port: refused_port().await,
        emulator_command: vec!["sh".to_string(), "-c".to_string(), script],
        connect_attempts: 1,
        retry_interval_ms: 10,
        startup_delay_ms: 200,
        shutdown_grace_ms: 1000,
        ..BridgeConfig::default()
    };

    let mut session = Session::new(config);
    let err = session.run().await.unwrap_err();

    match err {
        BridgeError::ConnectionFailure { attempts } => assert_eq!(attempts, 1),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.phase(), SessionPhase::Closed);

    let pid: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(!alive(pid));
}

#[tokio::test]
async fn zero_startup_delay_skips_the_wait() {
    let config = BridgeConfig {
        host: "127.0.0.1".to_string(),
        port: refused_port().await,
        emulator_command: vec!["sleep".to_string(), "30".to_string()],
        connect_attempts: 1,
        retry_interval_ms: 10,
        startup_delay_ms: 0,
        shutdown_grace_ms: 1000,
        ..BridgeConfig::default()
    };

    let mut session = Session::new(config);
    let start = Instant::now();
    let err = session.run().await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, BridgeError::ConnectionFailure { .. }));
    assert_eq!(session.phase(), SessionPhase::Closed);
    // Spawn, one refused connect, and SIGTERM teardown of a cooperative
    // process all finish well under the old minimum startup tick.
    assert!(
        elapsed < Duration::from_millis(400),
        "session took {elapsed:?}"
    );
}
