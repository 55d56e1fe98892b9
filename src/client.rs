//! Clock wall: dial several clock servers, keep each one's latest reading in a
//! shared [`ReadingTable`] and print the table, ordered by reading, once per
//! second.
//!
//! Every source gets its own poller task. A source that cannot be reached at
//! startup is left out; a source that hangs up later keeps its last reading.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::{parse_stamp, STAMP_LEN};
use crate::error::{Error, Result};
use crate::mapsort::{sort_entries, SortBy};
use crate::types::ReadingTable;

const TICK: Duration = Duration::from_secs(1);

/// Printed after every refresh of the wall.
pub const SEPARATOR: &str = "---------------";

/// One `name=endpoint` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub endpoint: String,
}

impl Source {
    /// Address to dial. A bare port number means a server on this host.
    pub fn address(&self) -> String {
        if self.endpoint.bytes().all(|b| b.is_ascii_digit()) {
            format!("localhost:{}", self.endpoint)
        } else {
            self.endpoint.clone()
        }
    }
}

impl FromStr for Source {
    type Err = Error;

    /// Splits on the first `=`; both halves must be non-empty.
    fn from_str(arg: &str) -> Result<Self> {
        match arg.split_once('=') {
            Some((name, endpoint)) if !name.is_empty() && !endpoint.is_empty() => Ok(Source {
                name: name.to_string(),
                endpoint: endpoint.to_string(),
            }),
            _ => Err(Error::InvalidSource(arg.to_string())),
        }
    }
}

/// Dial every source once, concurrently.
///
/// Returns the open connections and the sources that could not be reached.
/// Unreachable sources are not retried.
pub async fn connect_all(sources: &[Source]) -> (Vec<(Source, TcpStream)>, Vec<Source>) {
    let mut attempts = JoinSet::new();
    for source in sources {
        let source = source.clone();
        attempts.spawn(async move {
            let result = TcpStream::connect(source.address()).await;
            (source, result)
        });
    }

    let mut connected = Vec::new();
    let mut failed = Vec::new();
    while let Some(joined) = attempts.join_next().await {
        match joined {
            Ok((source, Ok(stream))) => {
                info!(source = %source.name, endpoint = %source.endpoint, "connected");
                connected.push((source, stream));
            }
            Ok((source, Err(e))) => {
                error!(source = %source.name, endpoint = %source.endpoint, error = %e, "cannot reach source");
                failed.push(source);
            }
            Err(e) => error!(error = %e, "connect task failed"),
        }
    }
    (connected, failed)
}

/// Copy readings from `stream` into `table` under `name` until the server
/// hangs up, a read fails, or `shutdown` fires.
///
/// Reads at most one line's worth of bytes at a time, then waits a second.
pub async fn poll_source(name: String, mut stream: TcpStream, table: ReadingTable, shutdown: CancellationToken) {
    let mut buf = [0u8; STAMP_LEN];
    loop {
        let n = tokio::select! {
            _ = shutdown.cancelled() => break,
            res = stream.read(&mut buf) => match res {
                Ok(0) => {
                    info!(source = %name, "source closed its stream");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!(source = %name, error = %e, "read failed");
                    break;
                }
            },
        };

        let payload = String::from_utf8_lossy(&buf[..n]);
        let reading = payload.trim_end_matches('\n');
        if parse_stamp(reading).is_none() {
            debug!(source = %name, reading, "reading is not HH:MM:SS");
        }
        table.record(&name, reading.to_string());

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(TICK) => {}
        }
    }
    debug!(source = %name, "poller stopped");
}

/// Render one refresh of the wall: a line per source ordered by reading, then
/// the separator. Sources with equal readings are ordered by name.
pub fn render(table: &ReadingTable) -> Result<String> {
    let mut entries = table.snapshot();
    sort_entries(&mut entries, SortBy::Key)?;
    sort_entries(&mut entries, SortBy::Value)?;

    let mut out = String::new();
    for entry in &entries {
        out.push_str(&format!("{} local time: {}\n", entry.key, entry.value));
    }
    out.push_str(SEPARATOR);
    out.push('\n');
    Ok(out)
}

/// Write [`render`] to `out` once per second until `shutdown` fires.
pub async fn run_renderer<W>(table: ReadingTable, out: &mut W, shutdown: CancellationToken) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = render(&table)?;
        out.write_all(frame.as_bytes()).await?;
        out.flush().await?;
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(TICK) => {}
        }
    }
    Ok(())
}

/// Connect to `sources`, poll every reachable one and print the wall to
/// stdout until `shutdown` fires.
pub async fn run_wall(sources: Vec<Source>, shutdown: CancellationToken) -> Result<()> {
    let mut seen = HashSet::new();
    if let Some(dup) = sources.iter().find(|s| !seen.insert(s.name.as_str())) {
        return Err(Error::DuplicateSource(dup.name.clone()));
    }

    let (connected, failed) = connect_all(&sources).await;
    let failed: Vec<String> = failed.into_iter().map(|s| s.name).collect();
    if connected.is_empty() {
        return Err(Error::NoReachableSources(failed));
    }
    if !failed.is_empty() {
        warn!(failed = %failed.join(", "), "continuing without unreachable sources");
    }

    let table = ReadingTable::new();
    let mut pollers = JoinSet::new();
    for (source, stream) in connected {
        pollers.spawn(poll_source(source.name, stream, table.clone(), shutdown.child_token()));
    }

    let mut stdout = tokio::io::stdout();
    let result = run_renderer(table, &mut stdout, shutdown.clone()).await;
    // a renderer that failed (e.g. closed stdout) takes the pollers down with it
    shutdown.cancel();
    while pollers.join_next().await.is_some() {}
    result
}
