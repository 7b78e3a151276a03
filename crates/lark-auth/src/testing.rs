//! Helpers for tests in this crate and its dependents
//!
//! Enabled by the `test-util` feature.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

/// Bind `127.0.0.1:0` and accept connections without ever answering.
///
/// Each socket is held open for 30 seconds, long enough for any client
/// timeout under test to fire first.
pub async fn start_silent_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent listener");
    let addr = listener.local_addr().expect("silent listener address");
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });
    addr
}
