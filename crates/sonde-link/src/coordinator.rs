//! Serialized end-to-end queries
//!
//! A query is clear buffer, write command, read until the line terminator,
//! decode. The link is one physical resource, so the whole cycle runs under
//! a single-slot admission gate. Opening and closing take the same gate,
//! which keeps a close from landing between a query's write and its read.
//!
//! Dropping a query future releases the gate. A query that timed out or was
//! dropped before its reply line arrived leaves the session marked as
//! awaiting a reply; the next query first drains the link for one poll
//! interval so a late reply cannot be taken as its answer.

use std::time::Duration;

use sonde_detect::PortDescriptor;
use sonde_protocol::{codec, Channel, SensorReading};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::connection::{ConnectionManager, Link, PortOpener};
use crate::error::{ConnectionError, QueryError, TransportError};
use crate::transport::Transport;

/// Timing of the read loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Overall deadline for one reply line
    pub timeout: Duration,
    /// Longest single wait for inbound bytes
    pub poll_interval: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// State guarded by the admission gate
struct Session<O: PortOpener> {
    connection: ConnectionManager<O>,
    transport: Transport,
    /// A command was written and its reply line has not been read
    reply_pending: bool,
}

/// Runs queries one at a time over the managed link
pub struct QueryCoordinator<O: PortOpener> {
    session: Mutex<Session<O>>,
    config: QueryConfig,
}

impl<O: PortOpener> QueryCoordinator<O> {
    /// Create a coordinator with default timing
    pub fn new(opener: O) -> Self {
        Self::with_config(opener, QueryConfig::default())
    }

    /// Create a coordinator with custom timing
    pub fn with_config(opener: O, config: QueryConfig) -> Self {
        Self {
            session: Mutex::new(Session {
                connection: ConnectionManager::new(opener),
                transport: Transport::new(config.poll_interval),
                reply_pending: false,
            }),
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Open the link, waiting for any in-flight query to finish first
    pub async fn open(&self, descriptor: &PortDescriptor) -> Result<(), ConnectionError> {
        let mut session = self.session.lock().await;
        session.connection.open(descriptor)?;
        session.transport.clear_buffer();
        session.reply_pending = false;
        Ok(())
    }

    /// Close the link, waiting for any in-flight query to finish first
    pub async fn close(&self) -> Result<(), ConnectionError> {
        let mut session = self.session.lock().await;
        session.connection.close().await
    }

    pub async fn is_open(&self) -> bool {
        self.session.lock().await.connection.is_open()
    }

    /// Name of the port currently held open
    pub async fn port_name(&self) -> Option<String> {
        let session = self.session.lock().await;
        session
            .connection
            .link()
            .filter(|l| l.is_open())
            .map(|l| l.port_name().to_string())
    }

    /// Query one channel and decode its reply
    pub async fn query(&self, channel: &Channel) -> Result<SensorReading, QueryError> {
        let mut guard = self.session.lock().await;
        let Session {
            connection,
            transport,
            reply_pending,
        } = &mut *guard;

        let Some(link) = connection.link_mut() else {
            warn!("Query {} failed: no open link", channel);
            return Err(QueryError::WriteFailed("link not open".into()));
        };

        let settle = if *reply_pending {
            self.config.poll_interval
        } else {
            Duration::ZERO
        };
        if let Err(e) = transport.discard_pending(link, settle).await {
            warn!("Could not drain {} before {}: {}", link.port_name(), channel, e);
        }

        *reply_pending = true;
        transport
            .write_raw(link, &codec::encode_command(channel))
            .await
            .map_err(|e| match e {
                TransportError::WriteFailed(reason) => QueryError::WriteFailed(reason),
                other => QueryError::WriteFailed(other.to_string()),
            })?;

        if timeout(self.config.timeout, read_line(transport, link))
            .await
            .is_err()
        {
            warn!(
                "No reply to {} within {:?} ({} bytes buffered)",
                channel,
                self.config.timeout,
                transport.buffer().len()
            );
            return Err(QueryError::ReadTimeout {
                channel: channel.to_string(),
                timeout_ms: self.config.timeout.as_millis() as u64,
            });
        }
        *reply_pending = false;

        let reading = codec::decode(channel, transport.buffer()).inspect_err(|e| {
            warn!(
                "Malformed reply to {}: {} ({:?})",
                channel,
                e,
                String::from_utf8_lossy(transport.buffer())
            );
        })?;

        debug!("Query {} -> {}", channel, reading);
        Ok(reading)
    }
}

/// Poll the link until the buffer ends with a line terminator
async fn read_line<T>(transport: &mut Transport, link: &mut Link<T>)
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    loop {
        match transport.read_available(link).await.map(codec::is_line_complete) {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                warn!("Read from {} failed: {}", link.port_name(), e);
                tokio::time::sleep(transport.poll_interval()).await;
            }
        }
    }
}
