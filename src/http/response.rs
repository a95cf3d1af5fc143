//! Response assembly and the response writer.

use crate::io::write_all;
use std::fmt;
use std::io;
use tokio::io::AsyncWrite;

/// The only content type hostprobe produces.
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Body sent to every connection while maintenance mode is on.
pub const MAINTENANCE_BODY: &str = "503 Service Unavailable: Server is in maintenance mode.";

/// Response status codes used by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    ServiceUnavailable,
}

impl Status {
    /// Numeric code.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NotFound => 404,
            Status::ServiceUnavailable => 503,
        }
    }

    /// Code and reason phrase as they appear on the status line.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::NotFound => "404 Not Found",
            Status::ServiceUnavailable => "503 Service Unavailable",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete response, built once and written once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    /// A 200 carrying a generator body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            content_type: CONTENT_TYPE_TEXT,
            body: body.into(),
        }
    }

    /// A 404 echoing the URI that failed to match.
    pub fn not_found(uri: &str) -> Self {
        Self {
            status: Status::NotFound,
            content_type: CONTENT_TYPE_TEXT,
            body: format!(
                "404 Not Found: URI '{}' is not recognized. Try /raminfo or /sysinfo.",
                uri
            ),
        }
    }

    /// The fixed maintenance-mode 503.
    pub fn maintenance() -> Self {
        Self {
            status: Status::ServiceUnavailable,
            content_type: CONTENT_TYPE_TEXT,
            body: MAINTENANCE_BODY.to_string(),
        }
    }

    /// Status line plus headers, terminated by the blank line.
    ///
    /// `Content-Length` is the byte length of the body, not its char count.
    pub fn header_block(&self) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.content_type,
            self.body.len()
        )
    }
}

/// Writes `response` to `writer` as two complete writes: the header block,
/// then the body.
///
/// Returns the total number of bytes written.
pub async fn send_response<W>(writer: &mut W, response: &Response) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let header = response.header_block();
    write_all(writer, header.as_bytes()).await?;
    write_all(writer, response.body.as_bytes()).await?;
    Ok(header.len() + response.body.len())
}
