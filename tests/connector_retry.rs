use std::time::{Duration, Instant};

use serlink::connector;
use serlink::BridgeError;
use tokio::net::TcpListener;

/// Find a port with nothing listening on it.
async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn refusal_exhausts_exact_attempt_count() {
    let port = refused_port().await;
    let retry = Duration::from_millis(50);

    let start = Instant::now();
    let err = connector::connect("127.0.0.1", port, 3, retry)
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    match err {
        BridgeError::ConnectionFailure { attempts } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
    // Two retry waits between three attempts.
    assert!(elapsed >= Duration::from_millis(100));
}

#[tokio::test]
async fn single_attempt_reports_one() {
    let port = refused_port().await;

    let err = connector::connect("127.0.0.1", port, 1, Duration::from_millis(10))
        .await
        .unwrap_err();
    match err {
        BridgeError::ConnectionFailure { attempts } => assert_eq!(attempts, 1),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn connects_when_listener_is_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let accept = tokio::spawn(async move {
        let _ = listener.accept().await.unwrap();
    });

    let stream = connector::connect("127.0.0.1", port, 3, Duration::from_millis(50))
        .await
        .unwrap();
    assert!(stream.peer_addr().is_ok());
    accept.await.unwrap();
}
