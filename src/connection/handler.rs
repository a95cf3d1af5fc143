//! Connection Handler
//!
//! Serves exactly one request on one connection, then closes it.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. ReadRequestLine ── EOF / error ──> Abandoned (no response)
//!        │
//!        ▼
//! 2. ParseRequest      (method, uri, version captured for logs)
//!        │
//!        ▼
//! 3. DrainHeaders      (read and discard until a bare CRLF or EOF)
//!        │
//!        ▼
//! 4. Dispatch          (router + body generator on the blocking pool)
//!        │
//!        ▼
//! 5. Respond ─────────> Served (connection closed either way)
//! ```
//!
//! There are no retries and no keep-alive. Every read is bounded by
//! [`MAX_LINE_LENGTH`] per line, but a peer that never finishes its headers
//! can hold its own handler open indefinitely; it cannot hold up anyone else.

use crate::http::{send_response, RequestLine, Response, Status};
use crate::io::read_line;
use crate::probes::BodySource;
use crate::routing::route;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinError;
use tracing::{debug, info, trace, warn};

/// Maximum length of a single request or header line (8 KB)
pub const MAX_LINE_LENGTH: usize = 8192;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active handlers
    pub active_connections: AtomicU64,
    /// Requests answered with a response
    pub requests_served: AtomicU64,
    /// Connections closed without a response
    pub connections_abandoned: AtomicU64,
    /// Connections turned away with a 503 while in maintenance
    pub maintenance_rejections: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handler_started(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handler_finished(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_served(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_abandoned(&self) {
        self.connections_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn maintenance_rejected(&self) {
        self.maintenance_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Counts one active handler for as long as it lives, including when the
/// handler task is cancelled or unwinds.
struct ActiveGuard {
    stats: Arc<ConnectionStats>,
}

impl ActiveGuard {
    fn new(stats: Arc<ConnectionStats>) -> Self {
        stats.handler_started();
        Self { stats }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.stats.handler_finished();
    }
}

/// How a handler finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A response with this status was written.
    Served(Status),
    /// The peer closed before sending a request line.
    Abandoned,
}

/// Errors that end a connection without a response.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The body generator task panicked or was cancelled
    #[error("body generator failed: {0}")]
    Generator(#[from] JoinError),
}

/// Handles a single client connection.
pub struct ConnectionHandler<T, S> {
    /// The client stream; reads go through the buffer, writes bypass it
    stream: BufReader<T>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Where route bodies come from (shared across connections)
    source: Arc<S>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,

    /// Reused line buffer
    line: BytesMut,

    /// Keeps `active_connections` raised until the handler is dropped
    _active: ActiveGuard,
}

impl<T, S> ConnectionHandler<T, S>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: BodySource,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream, owned by this handler until it ends
    /// * `addr` - The client's socket address
    /// * `source` - Body generators for the known routes
    /// * `stats` - Shared connection statistics
    pub fn new(stream: T, addr: SocketAddr, source: Arc<S>, stats: Arc<ConnectionStats>) -> Self {
        Self {
            stream: BufReader::new(stream),
            addr,
            source,
            _active: ActiveGuard::new(Arc::clone(&stats)),
            stats,
            line: BytesMut::with_capacity(256),
        }
    }

    /// Runs the handler to completion and closes the stream.
    pub async fn run(mut self) -> Result<Outcome, ConnectionError> {
        debug!(client = %self.addr, "Handling connection");

        let result = self.serve().await;

        match &result {
            Ok(Outcome::Served(status)) => {
                self.stats.request_served();
                trace!(client = %self.addr, status = status.code(), "Connection served");
            }
            Ok(Outcome::Abandoned) => {
                self.stats.connection_abandoned();
                debug!(client = %self.addr, "Client disconnected before sending a request");
            }
            Err(e) => {
                self.stats.connection_abandoned();
                match e {
                    ConnectionError::IoError(io_err)
                        if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                    {
                        debug!(client = %self.addr, "Connection reset by client")
                    }
                    _ => warn!(client = %self.addr, error = %e, "Connection abandoned"),
                }
            }
        }

        // Best effort: the peer may already be gone.
        let _ = self.stream.get_mut().shutdown().await;
        result
    }

    /// The linear read-route-respond sequence.
    async fn serve(&mut self) -> Result<Outcome, ConnectionError> {
        let request = match self.read_request_line().await? {
            Some(request) => request,
            None => return Ok(Outcome::Abandoned),
        };

        debug!(
            client = %self.addr,
            method = %request.method,
            uri = %request.uri,
            version = %request.version,
            "Received request"
        );
        if !request.is_well_formed() {
            debug!(client = %self.addr, line = %request, "Malformed request line, routing best-effort");
        }

        self.drain_headers().await;

        let uri = request.uri.clone();
        let response = dispatch(Arc::clone(&self.source), request).await?;

        let written = send_response(self.stream.get_mut(), &response).await?;
        self.stats.bytes_written(written);

        info!(
            client = %self.addr,
            status = response.status.code(),
            uri = %uri,
            bytes = written,
            "Sent response"
        );

        Ok(Outcome::Served(response.status))
    }

    /// Reads the request line. `None` means the peer closed first.
    async fn read_request_line(&mut self) -> Result<Option<RequestLine>, ConnectionError> {
        let n = read_line(&mut self.stream, &mut self.line, MAX_LINE_LENGTH).await?;
        if n == 0 {
            return Ok(None);
        }
        self.stats.bytes_read(n);
        Ok(Some(RequestLine::from_bytes(&self.line)))
    }

    /// Discards header lines up to and including the blank line.
    ///
    /// A read error or early EOF just ends the drain; the request line is
    /// already in hand, so the response is still attempted.
    async fn drain_headers(&mut self) {
        let mut discarded = 0usize;
        loop {
            match read_line(&mut self.stream, &mut self.line, MAX_LINE_LENGTH).await {
                Ok(0) => break,
                Ok(n) => {
                    self.stats.bytes_read(n);
                    if is_blank_line(&self.line) {
                        break;
                    }
                    discarded += 1;
                }
                Err(e) => {
                    debug!(client = %self.addr, error = %e, "Header read failed, responding anyway");
                    break;
                }
            }
        }
        trace!(client = %self.addr, headers = discarded, "Drained headers");
    }
}

/// Routes the request on the blocking pool, since generators read files and
/// run commands.
async fn dispatch<S: BodySource>(source: Arc<S>, request: RequestLine) -> Result<Response, ConnectionError> {
    let response = tokio::task::spawn_blocking(move || route(&request, &*source)).await?;
    Ok(response)
}

fn is_blank_line(line: &[u8]) -> bool {
    line == b"\r\n" || line == b"\n"
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
pub async fn handle_connection<T, S>(
    stream: T,
    addr: SocketAddr,
    source: Arc<S>,
    stats: Arc<ConnectionStats>,
) -> Option<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: BodySource,
{
    let handler = ConnectionHandler::new(stream, addr, source, stats);
    handler.run().await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedBodies;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn spawn_handler(
        source: Arc<FixedBodies>,
        stats: Arc<ConnectionStats>,
    ) -> (DuplexStream, tokio::task::JoinHandle<Option<Outcome>>) {
        let (client, server) = tokio::io::duplex(16 * 1024);
        let task = tokio::spawn(handle_connection(server, peer(), source, stats));
        (client, task)
    }

    async fn exchange(client: &mut DuplexStream, request: &[u8]) -> String {
        client.write_all(request).await.unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_known_route() {
        let source = Arc::new(FixedBodies::default());
        let stats = Arc::new(ConnectionStats::new());
        let (mut client, task) = spawn_handler(Arc::clone(&source), Arc::clone(&stats));

        let response = exchange(
            &mut client,
            b"GET /raminfo HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n",
        )
        .await;

        let body = "MemTotal:       1024 kB\nMemFree:         512 kB\n";
        assert_eq!(
            response,
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
        );
        assert_eq!(task.await.unwrap(), Some(Outcome::Served(Status::Ok)));
        assert_eq!(source.calls(), 1);
        assert_eq!(stats.requests_served.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
        assert!(stats.bytes_written.load(Ordering::Relaxed) as usize >= response.len());
    }

    #[tokio::test]
    async fn test_unknown_route_gets_404() {
        let source = Arc::new(FixedBodies::default());
        let (mut client, task) = spawn_handler(Arc::clone(&source), Arc::new(ConnectionStats::new()));

        let response = exchange(&mut client, b"GET /nope HTTP/1.1\r\n\r\n").await;

        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.ends_with(
            "\r\n\r\n404 Not Found: URI '/nope' is not recognized. Try /raminfo or /sysinfo."
        ));
        assert_eq!(task.await.unwrap(), Some(Outcome::Served(Status::NotFound)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_silent_close_is_abandoned_without_response() {
        let stats = Arc::new(ConnectionStats::new());
        let (mut client, task) = spawn_handler(Arc::new(FixedBodies::default()), Arc::clone(&stats));

        client.shutdown().await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();

        assert!(response.is_empty());
        assert_eq!(task.await.unwrap(), Some(Outcome::Abandoned));
        assert_eq!(stats.connections_abandoned.load(Ordering::Relaxed), 1);
        assert_eq!(stats.requests_served.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_responds_when_peer_closes_during_headers() {
        let (mut client, task) = spawn_handler(Arc::new(FixedBodies::default()), Arc::new(ConnectionStats::new()));

        client
            .write_all(b"GET /time HTTP/1.1\r\nHost: localhost\r\n")
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("2024-01-01 00:00:00 (UTC)"));
        assert_eq!(task.await.unwrap(), Some(Outcome::Served(Status::Ok)));
    }

    #[tokio::test]
    async fn test_bare_newline_ends_headers() {
        let (mut client, task) = spawn_handler(Arc::new(FixedBodies::default()), Arc::new(ConnectionStats::new()));

        let response = exchange(&mut client, b"GET /loadavg HTTP/1.0\nHost: x\n\n").await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Server Load Average:"));
        assert!(task.await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_non_get_method_is_routed_the_same() {
        let source = Arc::new(FixedBodies::default());
        let (mut client, task) = spawn_handler(Arc::clone(&source), Arc::new(ConnectionStats::new()));

        let response = exchange(&mut client, b"DELETE /sysinfo HTTP/1.1\r\n\r\n").await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("Linux testhost 6.1.0 x86_64 GNU/Linux\n"));
        assert_eq!(task.await.unwrap(), Some(Outcome::Served(Status::Ok)));
    }

    #[tokio::test]
    async fn test_content_length_matches_body() {
        let (mut client, _task) = spawn_handler(Arc::new(FixedBodies::default()), Arc::new(ConnectionStats::new()));

        let response = exchange(&mut client, b"GET /diskusage HTTP/1.1\r\n\r\n").await;

        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        let declared: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(declared, body.len());
    }

    /// A source whose data is gone, reporting it the way the host probes do.
    struct Unavailable;

    impl BodySource for Unavailable {
        fn fetch(&self, _route: crate::routing::Route) -> String {
            "Error: Could not open /proc/meminfo: No such file or directory (os error 2)".to_string()
        }
    }

    #[tokio::test]
    async fn test_failing_source_is_still_200() {
        let stats = Arc::new(ConnectionStats::new());
        let (mut client, server) = tokio::io::duplex(16 * 1024);
        let task = tokio::spawn(handle_connection(
            server,
            peer(),
            Arc::new(Unavailable),
            Arc::clone(&stats),
        ));

        let response = exchange(&mut client, b"GET /raminfo HTTP/1.1\r\n\r\n").await;

        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(
            body,
            "Error: Could not open /proc/meminfo: No such file or directory (os error 2)"
        );
        assert_eq!(task.await.unwrap(), Some(Outcome::Served(Status::Ok)));
        assert_eq!(stats.requests_served.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_cancelled_handler_is_no_longer_active() {
        let stats = Arc::new(ConnectionStats::new());
        let (client, task) = spawn_handler(Arc::new(FixedBodies::default()), Arc::clone(&stats));

        // The handler is parked waiting for a request line.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
        drop(client);
    }

    #[test]
    fn test_dropped_handler_is_no_longer_active() {
        let stats = Arc::new(ConnectionStats::new());
        let (_client, server) = tokio::io::duplex(64);

        let handler = ConnectionHandler::new(server, peer(), Arc::new(FixedBodies::default()), Arc::clone(&stats));
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);

        drop(handler);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(b"\r\n"));
        assert!(is_blank_line(b"\n"));
        assert!(!is_blank_line(b"Host: x\r\n"));
        assert!(!is_blank_line(b""));
    }
}
