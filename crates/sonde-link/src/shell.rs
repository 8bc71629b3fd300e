//! Sensor shell client
//!
//! The three operations a presentation layer needs: detect and open the
//! board, query a channel, close.

use sonde_detect::{DeviceDetector, PortCatalog, PortDescriptor, PortScanner};
use sonde_protocol::{Channel, SensorReading};
use tracing::{info, warn};

use crate::connection::{PortOpener, SerialOpener};
use crate::coordinator::{QueryConfig, QueryCoordinator};
use crate::error::{ConnectionError, QueryError};

/// Client for one sensor shell board
pub struct SensorShell<C, O>
where
    C: PortCatalog,
    O: PortOpener,
{
    catalog: C,
    detector: DeviceDetector,
    coordinator: QueryCoordinator<O>,
}

impl SensorShell<PortScanner, SerialOpener> {
    /// Client for boards attached to the system's serial ports
    pub fn serial(config: QueryConfig) -> Self {
        Self::new(PortScanner::new(), SerialOpener, config)
    }
}

impl<C, O> SensorShell<C, O>
where
    C: PortCatalog,
    O: PortOpener,
{
    /// Create a client over the given port catalog and opener
    pub fn new(catalog: C, opener: O, config: QueryConfig) -> Self {
        Self {
            catalog,
            detector: DeviceDetector::new(),
            coordinator: QueryCoordinator::with_config(opener, config),
        }
    }

    /// Use a different board signature
    pub fn with_detector(mut self, detector: DeviceDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn detector(&self) -> &DeviceDetector {
        &self.detector
    }

    /// Scan for the board and open a link to it
    ///
    /// Finding no board is reported as [`ConnectionError::NoDeviceFound`];
    /// callers polling for a board to appear can simply retry.
    pub async fn detect_and_open(&self) -> Result<PortDescriptor, ConnectionError> {
        let port = self
            .detector
            .scan(&self.catalog)?
            .ok_or(ConnectionError::NoDeviceFound {
                vendor_id: self.detector.vendor_id(),
            })?;

        self.open(&port).await?;
        Ok(port)
    }

    /// Open a link to a known port, bypassing detection
    pub async fn open(&self, port: &PortDescriptor) -> Result<(), ConnectionError> {
        self.coordinator.open(port).await.inspect_err(|e| {
            warn!("Could not connect to sensor shell: {}", e);
        })?;
        info!("Sensor shell ready on {}", port.name);
        Ok(())
    }

    pub async fn close(&self) -> Result<(), ConnectionError> {
        self.coordinator.close().await
    }

    pub async fn is_open(&self) -> bool {
        self.coordinator.is_open().await
    }

    pub async fn port_name(&self) -> Option<String> {
        self.coordinator.port_name().await
    }

    /// Query a channel, returning the typed reading
    pub async fn query(&self, channel: &Channel) -> Result<SensorReading, QueryError> {
        self.coordinator.query(channel).await
    }

    /// Query a channel by token, returning the integer value (`-1` for an
    /// absent I2C device)
    pub async fn query_sensor(&self, channel: &str) -> Result<i64, QueryError> {
        let channel = Channel::new(channel)?;
        self.query(&channel).await.map(|r| r.value())
    }
}
