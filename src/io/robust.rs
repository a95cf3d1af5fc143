//! Guaranteed-complete line reads and buffer writes.
//!
//! Both primitives work over any tokio `AsyncRead` / `AsyncWrite`, so the
//! connection handler uses them on a `TcpStream` while the tests drive them
//! with scripted mock streams that split data and inject interruptions.

use bytes::{BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, trace};

/// Reads one line from `reader` into `line`.
///
/// Reading stops after a `\n` has been stored or once `max_len - 1` bytes are
/// held, whichever comes first. `line` is cleared on entry and afterwards
/// holds exactly the bytes that were read.
///
/// # Returns
///
/// - `Ok(n)` with `n > 0` - number of bytes stored, including the newline
///   when one was seen. A peer that closes mid-line yields the partial line.
/// - `Ok(0)` - the stream ended before a single byte arrived
/// - `Err(e)` - an unrecoverable read error (`Interrupted` is retried)
pub async fn read_line<R>(reader: &mut R, line: &mut BytesMut, max_len: usize) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    line.clear();
    let limit = max_len.saturating_sub(1);
    let mut byte = [0u8; 1];

    while line.len() < limit {
        match reader.read(&mut byte).await {
            Ok(1) => {
                line.put_u8(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Ok(_) => {
                // End of stream: report whatever arrived, possibly nothing.
                trace!(partial = line.len(), "read_line hit end of stream");
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(line.len())
}

/// Writes the whole of `data` to `writer`.
///
/// Short writes are continued from where they stopped and `Interrupted` is
/// retried. Any other error (including a broken pipe) is logged and returned
/// immediately; bytes already accepted by the stream stay sent.
pub async fn write_all<W>(writer: &mut W, data: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;

    while written < data.len() {
        match writer.write(&data[written..]).await {
            Ok(0) => {
                let e = io::Error::new(io::ErrorKind::WriteZero, "stream accepted zero bytes");
                error!(written, total = data.len(), error = %e, "write_all failed");
                return Err(e);
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(written, total = data.len(), error = %e, "write_all failed");
                return Err(e);
            }
        }
    }

    if let Err(e) = writer.flush().await {
        error!(error = %e, "write_all flush failed");
        return Err(e);
    }

    Ok(())
}
