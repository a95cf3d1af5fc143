//! Request line parsing.

use std::fmt;

/// The three fields of an HTTP request line.
///
/// Parsing is best-effort: missing tokens come back as empty strings and
/// anything after the third token is ignored. An empty or garbled URI simply
/// fails to match a route later on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub uri: String,
    pub version: String,
    token_count: usize,
}

impl RequestLine {
    /// Splits `line` on ASCII whitespace into method, URI and version.
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        let mut next = || tokens.next().map(str::to_owned).unwrap_or_default();

        let method = next();
        let uri = next();
        let version = next();
        let token_count = line.split_whitespace().count();

        Self {
            method,
            uri,
            version,
            token_count,
        }
    }

    /// Parses raw bytes from the wire, replacing invalid UTF-8.
    pub fn from_bytes(line: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(line))
    }

    /// True when the line held exactly three tokens.
    pub fn is_well_formed(&self) -> bool {
        self.token_count == 3
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.uri, self.version)
    }
}
