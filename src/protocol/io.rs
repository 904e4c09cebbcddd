//! Reading and writing single protocol lines.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::MAX_LINE_BYTES;

/// Read one line, without its terminator.
///
/// Returns `Ok(None)` if the peer closed before sending anything.
pub async fn read_line<R>(reader: R) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader.take(MAX_LINE_BYTES));
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    let line = buf.trim_end_matches(|c| c == '\r' || c == '\n');
    Ok(Some(line.to_string()))
}

/// Write `line` plus a newline and flush.
pub async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    writer.write_all(&buf).await?;
    writer.flush().await
}
