//! Reading exact byte counts from a stream.
//!
//! These are the only places the framings touch a socket for input. A
//! connection reads exactly as many bytes as its parser asks for, so nothing
//! belonging to the next frame is ever consumed early.

use super::*;
use core::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Peer closed the connection")]
    Hangup,

    #[error("Timed out waiting for data from peer")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fills `buf` from `reader`, failing if the stream ends first or if
/// `timeout` elapses.
pub async fn read_exact_timeout<R>(
    reader: &mut R,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> Result<(), Error>
where
    R: AsyncRead + Unpin,
{
    let read = reader.read_exact(buf);
    let r = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| Error::Timeout)?,
        None => read.await,
    };
    match r {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::Hangup),
        Err(e) => Err(e.into()),
    }
}

/// Drives `parse` to completion, reading exactly the bytes it asks for.
///
/// `parse` is called with everything read so far; each
/// [`Parsed::Incomplete`] grows the buffer to the requested total.
pub async fn read_parsed<R, T, E, F>(
    reader: &mut R,
    timeout: Option<Duration>,
    mut parse: F,
) -> Result<T, E>
where
    R: AsyncRead + Unpin,
    E: From<Error>,
    F: FnMut(&[u8]) -> Result<Parsed<T>, E>,
{
    let mut buf = Vec::new();
    loop {
        match parse(&buf)? {
            Parsed::Complete(t, _) => return Ok(t),
            Parsed::Incomplete(needed) => {
                let start = buf.len();
                buf.resize(needed.max(start + 1), 0);
                trace!("Reading {} more bytes", buf.len() - start);
                read_exact_timeout(reader, &mut buf[start..], timeout).await?;
            }
        }
    }
}

/// Runs `f`, giving up with [`Error::Cancelled`] when `cancel_token` fires.
pub async fn cancellable<F, T, E>(
    f: F,
    cancel_token: &bpwire_async::CancellationToken,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<Error>,
{
    tokio::select! {
        r = f => r,
        _ = cancel_token.cancelled() => Err(Error::Cancelled.into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn hangup() {
        let (mut a, mut b) = tokio::io::duplex(16);
        a.write_all(b"ab").await.unwrap();
        drop(a);

        let mut buf = [0u8; 3];
        assert!(matches!(
            read_exact_timeout(&mut b, &mut buf, None).await,
            Err(Error::Hangup)
        ));
    }

    #[tokio::test]
    async fn timeout() {
        let (_a, mut b) = tokio::io::duplex(16);
        let mut buf = [0u8; 1];
        assert!(matches!(
            read_exact_timeout(&mut b, &mut buf, Some(Duration::from_millis(10))).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn reads_only_what_is_asked() {
        let (mut a, mut b) = tokio::io::duplex(16);
        a.write_all(b"\x03abcNEXT").await.unwrap();

        // A length byte followed by that many bytes
        let frame = read_parsed(&mut b, None, |data: &[u8]| -> Result<_, Error> {
            Ok(match data.first() {
                None => Parsed::Incomplete(1),
                Some(&len) if data.len() < 1 + len as usize => {
                    Parsed::Incomplete(1 + len as usize)
                }
                Some(&len) => Parsed::Complete(data[1..].to_vec(), 1 + len as usize),
            })
        })
        .await
        .unwrap();
        assert_eq!(frame, b"abc");

        let mut rest = [0u8; 4];
        read_exact_timeout(&mut b, &mut rest, None).await.unwrap();
        assert_eq!(&rest, b"NEXT");
    }

    #[tokio::test]
    async fn cancelled() {
        let (_a, mut b) = tokio::io::duplex(16);
        let cancel_token = bpwire_async::CancellationToken::new();
        cancel_token.cancel();

        let mut buf = [0u8; 1];
        assert!(matches!(
            cancellable(read_exact_timeout(&mut b, &mut buf, None), &cancel_token).await,
            Err(Error::Cancelled)
        ));
    }
}
