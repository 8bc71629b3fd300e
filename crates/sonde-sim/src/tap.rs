//! Traffic tap
//!
//! Wraps a stream and records every write and read passing through it, in
//! the order they complete. Several taps can share one [`TrafficLog`].

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Direction and bytes of one completed I/O call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapEvent {
    /// Bytes written towards the shell
    Write(Vec<u8>),
    /// Bytes read from the shell
    Read(Vec<u8>),
}

/// Shared, ordered record of tapped traffic
#[derive(Debug, Clone, Default)]
pub struct TrafficLog {
    events: Arc<Mutex<Vec<TapEvent>>>,
}

impl TrafficLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: TapEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<TapEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// All written bytes, one entry per write
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TapEvent::Write(data) => Some(data),
                TapEvent::Read(_) => None,
            })
            .collect()
    }
}

/// Stream wrapper feeding a [`TrafficLog`]
pub struct TrafficTap<T> {
    inner: T,
    log: TrafficLog,
}

impl<T> TrafficTap<T> {
    pub fn new(inner: T, log: TrafficLog) -> Self {
        Self { inner, log }
    }

    pub fn log(&self) -> &TrafficLog {
        &self.log
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for TrafficTap<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);

        if let Poll::Ready(Ok(())) = &poll {
            let data = &buf.filled()[before..];
            if !data.is_empty() {
                this.log.record(TapEvent::Read(data.to_vec()));
            }
        }
        poll
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for TrafficTap<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);

        if let Poll::Ready(Ok(n)) = &poll {
            if *n > 0 {
                this.log.record(TapEvent::Write(buf[..*n].to_vec()));
            }
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
