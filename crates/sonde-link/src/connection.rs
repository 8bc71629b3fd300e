//! Serial link lifecycle
//!
//! The [`ConnectionManager`] owns at most one open [`Link`]. Links are
//! created through a [`PortOpener`], which lets the same manager drive a
//! real `tokio_serial` port or an in-memory stream connected to a
//! simulated shell.

use std::io;
use std::time::Duration;

use sonde_detect::PortDescriptor;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, info, warn};

use crate::error::ConnectionError;

/// Serial line settings of the sensor shell
///
/// Every link uses the same settings (9600 baud, 8N1, no flow control).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    baud_rate: u32,
    parity: Parity,
    stop_bits: StopBits,
    data_bits: DataBits,
    flow_control: FlowControl,
}

impl LinkConfig {
    /// The only configuration the shell speaks
    pub const SENSOR_SHELL: LinkConfig = LinkConfig {
        baud_rate: 9600,
        parity: Parity::None,
        stop_bits: StopBits::One,
        data_bits: DataBits::Eight,
        flow_control: FlowControl::None,
    };

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    pub fn data_bits(&self) -> DataBits {
        self.data_bits
    }

    pub fn flow_control(&self) -> FlowControl {
        self.flow_control
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::SENSOR_SHELL
    }
}

/// Opens the byte stream behind a link
pub trait PortOpener: Send + Sync {
    /// Stream type produced for an open port
    type Io: AsyncRead + AsyncWrite + Unpin + Send;

    /// Open the named port with the given line settings
    fn open(&self, port_name: &str, config: &LinkConfig) -> io::Result<Self::Io>;
}

/// Opens real serial ports through `tokio_serial`
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialOpener;

impl PortOpener for SerialOpener {
    type Io = SerialStream;

    fn open(&self, port_name: &str, config: &LinkConfig) -> io::Result<Self::Io> {
        let stream = tokio_serial::new(port_name, config.baud_rate())
            .parity(config.parity())
            .stop_bits(config.stop_bits())
            .data_bits(config.data_bits())
            .flow_control(config.flow_control())
            .timeout(Duration::from_millis(100))
            .open_native_async()?;
        Ok(stream)
    }
}

/// One serial connection bound to a port name
pub struct Link<T> {
    port_name: String,
    config: LinkConfig,
    io: Option<T>,
}

impl<T> Link<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already open stream
    pub fn new(port_name: impl Into<String>, config: LinkConfig, io: T) -> Self {
        Self {
            port_name: port_name.into(),
            config,
            io: Some(io),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.io.is_some()
    }

    /// The underlying stream, if the link is open
    pub fn io_mut(&mut self) -> Option<&mut T> {
        self.io.as_mut()
    }

    /// Shut the stream down and release it
    ///
    /// The stream is dropped even when shutdown reports an error, so the
    /// link is closed afterwards in every case.
    pub async fn close(&mut self) -> io::Result<()> {
        match self.io.take() {
            Some(mut io) => io.shutdown().await,
            None => Ok(()),
        }
    }
}

/// Owns the lifecycle of the single serial link
pub struct ConnectionManager<O: PortOpener> {
    opener: O,
    config: LinkConfig,
    link: Option<Link<O::Io>>,
}

impl<O: PortOpener> ConnectionManager<O> {
    /// Create a manager with no link
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            config: LinkConfig::SENSOR_SHELL,
            link: None,
        }
    }

    /// Open a link to the described port
    ///
    /// Fails with [`ConnectionError::AlreadyOpen`] while another link is held.
    pub fn open(&mut self, descriptor: &PortDescriptor) -> Result<&mut Link<O::Io>, ConnectionError> {
        if let Some(link) = self.link.as_ref().filter(|l| l.is_open()) {
            warn!("Refusing to open {}: {} is already open", descriptor.name, link.port_name());
            return Err(ConnectionError::AlreadyOpen(link.port_name().to_string()));
        }

        debug!(
            "Opening {} at {} baud",
            descriptor.name,
            self.config.baud_rate()
        );

        let io = self.opener.open(&descriptor.name, &self.config).map_err(|e| {
            warn!("Connection to {} failed: {}", descriptor.name, e);
            ConnectionError::PortOpenFailed {
                port: descriptor.name.clone(),
                reason: e.to_string(),
            }
        })?;

        info!("Connected to {}", descriptor.name);
        Ok(self.link.insert(Link::new(descriptor.name.clone(), self.config, io)))
    }

    /// Close the held link
    ///
    /// Closing when no link is open succeeds without doing anything.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        let Some(mut link) = self.link.take() else {
            debug!("Close requested with no open link");
            return Ok(());
        };

        let result = link.close().await;
        debug_assert!(!link.is_open());

        match result {
            Ok(()) => {
                info!("Closed {}", link.port_name());
                Ok(())
            }
            Err(e) => {
                warn!("Closing {} failed: {}", link.port_name(), e);
                Err(ConnectionError::PortCloseFailed {
                    port: link.port_name().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.link.as_ref().is_some_and(|l| l.is_open())
    }

    pub fn link(&self) -> Option<&Link<O::Io>> {
        self.link.as_ref()
    }

    pub fn link_mut(&mut self) -> Option<&mut Link<O::Io>> {
        self.link.as_mut()
    }
}
