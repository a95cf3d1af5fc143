//! Request-issuing client.
//!
//! Connects, sends one `GET` with `Connection: close`, and collects every
//! response line until the server closes the connection. Uses the same
//! robust I/O primitives as the server.

use crate::connection::MAX_LINE_LENGTH;
use crate::io::{read_line, write_all};
use bytes::BytesMut;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// URI requested when none is given
pub const DEFAULT_URI: &str = "/raminfo";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to {addr} failed: {source}")]
    Connect { addr: SocketAddr, source: io::Error },

    #[error("sending request failed: {0}")]
    Send(#[source] io::Error),

    #[error("reading response failed: {0}")]
    Receive(#[source] io::Error),
}

/// The request text sent for `uri`.
pub fn build_request(uri: &str, host: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        uri, host
    )
}

/// Requests `uri` from the server at `addr` and returns the raw response,
/// one entry per line with line terminators kept.
pub async fn request(addr: SocketAddr, uri: &str) -> Result<Vec<String>, ClientError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect { addr, source })?;
    info!(server = %addr, "Connected to server");

    debug!(uri, "Sending request");
    let request = build_request(uri, &addr.ip().to_string());
    write_all(&mut stream, request.as_bytes())
        .await
        .map_err(ClientError::Send)?;

    let mut reader = BufReader::new(stream);
    let mut line = BytesMut::with_capacity(256);
    let mut lines = Vec::new();
    loop {
        let n = read_line(&mut reader, &mut line, MAX_LINE_LENGTH)
            .await
            .map_err(ClientError::Receive)?;
        if n == 0 {
            break;
        }
        lines.push(String::from_utf8_lossy(&line).into_owned());
    }

    info!(server = %addr, lines = lines.len(), "Connection closed");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        assert_eq!(
            build_request("/sysinfo", "127.0.0.1"),
            "GET /sysinfo HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        match request(addr, DEFAULT_URI).await {
            Err(ClientError::Connect { addr: failed, .. }) => assert_eq!(failed, addr),
            other => panic!("expected connect failure, got {:?}", other),
        }
    }
}
