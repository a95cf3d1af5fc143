//! Minimal HTTP/1.1 Framing
//!
//! hostprobe speaks just enough HTTP for `curl` and browsers to be happy:
//!
//! ```text
//! Request:   METHOD SP URI SP VERSION CRLF
//!            *( header-line CRLF )          <- read and discarded
//!            CRLF
//!
//! Response:  HTTP/1.1 SP STATUS CRLF
//!            Content-Type: text/plain CRLF
//!            Content-Length: <exact body bytes> CRLF
//!            Connection: close CRLF
//!            CRLF
//!            <body>
//! ```
//!
//! Only the request line is ever inspected. Every response closes the
//! connection.

pub mod request;
pub mod response;

pub use request::RequestLine;
pub use response::{send_response, Response, Status, CONTENT_TYPE_TEXT};
