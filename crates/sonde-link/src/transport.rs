//! Raw read/write surface over an open link
//!
//! Inbound bytes accumulate in a growable buffer until the caller clears
//! it. Reads never block longer than one poll interval.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{trace, warn};

use crate::connection::Link;
use crate::error::TransportError;

/// Size of a single read from the link
const READ_CHUNK: usize = 256;

/// Buffered transport for one link at a time
pub struct Transport {
    buffer: Vec<u8>,
    chunk: Vec<u8>,
    poll_interval: Duration,
}

impl Transport {
    /// Create a transport polling at the given interval
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            buffer: Vec::with_capacity(64),
            chunk: vec![0u8; READ_CHUNK],
            poll_interval,
        }
    }

    /// Write bytes to the link in a single attempt
    pub async fn write_raw<T>(&mut self, link: &mut Link<T>, bytes: &[u8]) -> Result<(), TransportError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let port = link.port_name().to_string();
        let Some(io) = link.io_mut() else {
            warn!("Write to {} failed: link not open", port);
            return Err(TransportError::WriteFailed("link not open".into()));
        };

        trace!("Writing {} bytes to {}: {:?}", bytes.len(), port, String::from_utf8_lossy(bytes));
        io.write_all(bytes)
            .await
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        io.flush()
            .await
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Append whatever the link has available to the buffer
    ///
    /// Waits at most one poll interval for data. Returns the full buffer
    /// content. On a closed link the buffer is left unchanged and a read
    /// failure is returned; callers can still inspect [`Transport::buffer`].
    pub async fn read_available<T>(&mut self, link: &mut Link<T>) -> Result<&[u8], TransportError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let Some(io) = link.io_mut() else {
            return Err(TransportError::ReadFailed("link not open".into()));
        };

        match timeout(self.poll_interval, io.read(&mut self.chunk)).await {
            Ok(Ok(0)) => {
                // End of stream: nothing will arrive, but keep the polling cadence
                trace!("End of stream on {}", link.port_name());
                tokio::time::sleep(self.poll_interval).await;
            }
            Ok(Ok(n)) => {
                trace!(
                    "Read {} bytes from {}: {:?}",
                    n,
                    link.port_name(),
                    String::from_utf8_lossy(&self.chunk[..n])
                );
                self.buffer.extend_from_slice(&self.chunk[..n]);
            }
            Ok(Err(e)) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Ok(Err(e)) => return Err(TransportError::ReadFailed(e.to_string())),
            Err(_) => {} // Nothing arrived this interval
        }

        Ok(&self.buffer)
    }

    /// Empty the buffer and throw away bytes already waiting on the link
    ///
    /// Reads until `settle` passes with nothing arriving. A zero `settle`
    /// takes only what is immediately available. Returns the number of
    /// bytes discarded from the link.
    pub async fn discard_pending<T>(&mut self, link: &mut Link<T>, settle: Duration) -> Result<usize, TransportError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        self.buffer.clear();
        let Some(io) = link.io_mut() else {
            return Err(TransportError::ReadFailed("link not open".into()));
        };

        let mut discarded = 0;
        loop {
            match timeout(settle, io.read(&mut self.chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
                Ok(Err(e)) => return Err(TransportError::ReadFailed(e.to_string())),
                Err(_) => break,
            }
        }

        if discarded > 0 {
            warn!("Discarded {} stale bytes from {}", discarded, link.port_name());
        }
        Ok(discarded)
    }

    /// Discard everything received so far
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Bytes received since the last clear
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
