use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::sync::OwnedRwLockReadGuard;

use crate::error::{StoreError, StoreResult};

/// Streaming handle on one committed object.
///
/// Holds the shared side of the object's lock until dropped, so the object
/// cannot be replaced mid-read. The size is taken from the open handle when
/// the reader is created; reading fewer or more bytes than that is an error.
pub struct ObjectReader {
    name: String,
    file: File,
    len: u64,
    read: u64,
    buffer_size: usize,
    _guard: OwnedRwLockReadGuard<()>,
}

impl ObjectReader {
    pub(crate) fn new(
        name: String,
        file: File,
        len: u64,
        buffer_size: usize,
        guard: OwnedRwLockReadGuard<()>,
    ) -> Self {
        Self {
            name,
            file,
            len,
            read: 0,
            buffer_size,
            _guard: guard,
        }
    }

    /// Name of the object being read.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object size observed when the reader was opened.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` for a zero-byte object.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Stream the remaining object into `sink` through a bounded buffer.
    ///
    /// Returns the total bytes copied, which always equals [`len`](Self::len)
    /// on success.
    pub async fn copy_to<W>(mut self, sink: &mut W) -> StoreResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            let n = self.file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.read += n as u64;
            if self.read > self.len {
                break;
            }
            sink.write_all(&buf[..n]).await?;
        }
        sink.flush().await?;

        if self.read != self.len {
            return Err(StoreError::LengthMismatch {
                expected: self.len,
                actual: self.read,
            });
        }
        Ok(self.read)
    }
}

impl AsyncRead for ObjectReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.file).poll_read(cx, buf))?;
        let n = (buf.filled().len() - before) as u64;

        if n == 0 && this.read < this.len {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} shrank while being read: expected {} bytes, got {}",
                    this.name, this.len, this.read
                ),
            )));
        }

        this.read += n;
        if this.read > this.len {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} grew while being read past {} bytes", this.name, this.len),
            )));
        }
        Poll::Ready(Ok(()))
    }
}

impl std::fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectReader")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("read", &self.read)
            .finish()
    }
}
