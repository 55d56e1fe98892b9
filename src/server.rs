//! Clock server responsibilities:
//! - accept TCP connections
//! - give every connection its own task writing one `HH:MM:SS\n` line per second
//! - stop accepting and writing once the shutdown token is cancelled
//!
//! Connection tasks share nothing but the clock; each owns its stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::clock::{format_stamp, LocalClock, WallClock};
use crate::error::{Error, Result};

const TICK: Duration = Duration::from_secs(1);

/// Bind `host:port` and serve the local time until `shutdown` is cancelled.
pub async fn run_server(host: &str, port: u16, shutdown: CancellationToken) -> Result<()> {
    let listener = bind(&format!("{}:{}", host, port)).await?;
    serve(listener, Arc::new(LocalClock), shutdown).await;
    Ok(())
}

/// Bind the listening socket. There is no retry: a server that cannot get its
/// port has nothing else to do.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
        addr: addr.to_string(),
        source,
    })?;
    match listener.local_addr() {
        Ok(local) => info!(addr = %local, "clock server listening"),
        Err(_) => info!(addr, "clock server listening"),
    }
    Ok(listener)
}

/// Accept loop. A failed accept is logged and skipped.
pub async fn serve(listener: TcpListener, clock: Arc<dyn WallClock>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("clock server shutting down");
                break;
            }
            res = listener.accept() => {
                match res {
                    Ok((stream, peer)) => {
                        info!(%peer, "client connected");
                        tokio::spawn(handle_connection(stream, clock.clone(), shutdown.child_token()));
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                }
            }
        }
    }
}

/// Write the current time to `stream` once per second until a write fails
/// or `shutdown` fires.
pub async fn handle_connection(mut stream: TcpStream, clock: Arc<dyn WallClock>, shutdown: CancellationToken) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    loop {
        let line = format_stamp(clock.now());
        if let Err(e) = stream.write_all(line.as_bytes()).await {
            // e.g. client disconnected
            debug!(%peer, error = %e, "write failed");
            break;
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(TICK) => {}
        }
    }
    info!(%peer, "connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{parse_stamp, FixedClock, STAMP_LEN};
    use chrono::Timelike;
    use std::net::SocketAddr;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
    use tokio::time::{timeout, Instant};

    async fn start(clock: Arc<dyn WallClock>) -> (SocketAddr, CancellationToken, tokio::task::JoinHandle<()>) {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, clock, shutdown.clone()));
        (addr, shutdown, handle)
    }

    async fn next_line(reader: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(3), reader.read_line(&mut line))
            .await
            .expect("no line within 3s")
            .unwrap();
        assert!(n > 0, "server closed the connection");
        line
    }

    #[tokio::test]
    async fn emits_one_fixed_width_line_per_second() {
        let (addr, shutdown, _) = start(Arc::new(LocalClock)).await;
        let mut reader = BufReader::new(TcpStream::connect(addr).await.unwrap());

        let started = Instant::now();
        let mut stamps = Vec::new();
        for _ in 0..3 {
            let line = next_line(&mut reader).await;
            assert_eq!(line.len(), STAMP_LEN, "{line:?}");
            stamps.push(parse_stamp(&line).expect("HH:MM:SS line"));
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1800), "lines came too fast: {elapsed:?}");

        // a fourth line is not due for another second
        let mut extra = String::new();
        assert!(timeout(Duration::from_millis(500), reader.read_line(&mut extra)).await.is_err());

        for pair in stamps.windows(2) {
            let wrapped = pair[0].hour() == 23 && pair[1].hour() == 0;
            assert!(pair[0] <= pair[1] || wrapped, "{:?} then {:?}", pair[0], pair[1]);
        }
        shutdown.cancel();
    }

    #[tokio::test]
    async fn clients_are_independent() {
        let (addr, shutdown, _) = start(Arc::new(FixedClock::at(8, 30, 0))).await;
        let mut a = BufReader::new(TcpStream::connect(addr).await.unwrap());
        let mut b = BufReader::new(TcpStream::connect(addr).await.unwrap());

        assert_eq!(next_line(&mut a).await, "08:30:00\n");
        assert_eq!(next_line(&mut b).await, "08:30:00\n");
        drop(a);

        let started = Instant::now();
        assert_eq!(next_line(&mut b).await, "08:30:00\n");
        assert_eq!(next_line(&mut b).await, "08:30:00\n");
        assert!(started.elapsed() < Duration::from_millis(2500));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn shutdown_closes_connections_and_stops_accepting() {
        let (addr, shutdown, handle) = start(Arc::new(FixedClock::at(1, 2, 3))).await;
        let mut reader = BufReader::new(TcpStream::connect(addr).await.unwrap());
        assert_eq!(next_line(&mut reader).await, "01:02:03\n");

        shutdown.cancel();
        timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();

        let mut rest = Vec::new();
        let n = timeout(Duration::from_secs(2), reader.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(n <= STAMP_LEN);
    }

    #[tokio::test]
    async fn bind_reports_a_taken_port() {
        let taken = bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        match bind(&addr).await {
            Err(Error::Bind { addr: failed, .. }) => assert_eq!(failed, addr),
            other => panic!("expected bind error, got {other:?}"),
        }
    }
}
