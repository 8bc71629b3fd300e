//! Serial port scanner
//!
//! Ports are listed through the [`PortCatalog`] trait. [`PortScanner`] asks
//! the `serialport` crate; tests hand in a fixed `Vec<PortDescriptor>`.

use serde::{Deserialize, Serialize};
use serialport::{available_ports, SerialPortInfo, SerialPortType};
use tracing::{debug, trace};

use crate::error::DetectError;
use crate::usb_ids::board_name;

/// Information about a serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// Port name (e.g., /dev/ttyACM0, COM3)
    pub name: String,
    /// USB Vendor ID (if USB)
    pub vendor_id: Option<u16>,
    /// USB Product ID (if USB)
    pub product_id: Option<u16>,
    /// USB serial number (if available)
    pub serial_number: Option<String>,
    /// USB manufacturer string
    pub manufacturer: Option<String>,
    /// USB product string
    pub product: Option<String>,
}

impl PortDescriptor {
    /// Descriptor carrying only a port name and vendor id
    pub fn new(name: impl Into<String>, vendor_id: Option<u16>) -> Self {
        Self {
            name: name.into(),
            vendor_id,
            product_id: None,
            serial_number: None,
            manufacturer: None,
            product: None,
        }
    }

    /// Human-readable label: known board name, else the USB product string
    pub fn label(&self) -> Option<&str> {
        self.vendor_id
            .zip(self.product_id)
            .and_then(|(vid, pid)| board_name(vid, pid))
            .or(self.product.as_deref())
    }
}

impl From<SerialPortInfo> for PortDescriptor {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vendor_id: Some(usb.vid),
                product_id: Some(usb.pid),
                serial_number: usb.serial_number,
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            // PCI, Bluetooth and unknown ports carry no vendor id
            _ => Self::new(info.port_name, None),
        }
    }
}

/// Source of serial port snapshots
///
/// Order is whatever the underlying enumeration returns and is not
/// guaranteed stable between scans.
pub trait PortCatalog: Send + Sync {
    /// Enumerate the currently visible serial ports
    fn scan(&self) -> Result<Vec<PortDescriptor>, DetectError>;
}

/// A fixed list of ports, returned as-is on every scan
impl PortCatalog for Vec<PortDescriptor> {
    fn scan(&self) -> Result<Vec<PortDescriptor>, DetectError> {
        Ok(self.clone())
    }
}

/// Enumeration settings
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    /// Ports whose name contains any of these (case-insensitive) are hidden
    pub skip_patterns: Vec<String>,
}

/// [`PortCatalog`] over the system's serial ports
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    /// Scanner hiding macOS Bluetooth and debug console ports
    pub fn new() -> Self {
        Self::with_config(ScannerConfig {
            skip_patterns: vec!["bluetooth".to_string(), "debug".to_string()],
        })
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Snapshot of visible ports, in enumeration order
    pub fn enumerate_ports(&self) -> Result<Vec<PortDescriptor>, DetectError> {
        let ports: Vec<PortDescriptor> = available_ports()
            .map_err(|e| DetectError::EnumerationFailed(e.to_string()))?
            .into_iter()
            .map(PortDescriptor::from)
            .filter(|p| !self.is_skipped(p))
            .collect();

        debug!("Enumerated {} serial port(s)", ports.len());
        for port in &ports {
            match port.vendor_id {
                Some(vid) => trace!(
                    "  {} [{:04X}] {}",
                    port.name,
                    vid,
                    port.label().unwrap_or("")
                ),
                None => trace!("  {} (no vendor id)", port.name),
            }
        }

        Ok(ports)
    }

    fn is_skipped(&self, port: &PortDescriptor) -> bool {
        let name = port.name.to_lowercase();
        self.config
            .skip_patterns
            .iter()
            .any(|pattern| name.contains(&pattern.to_lowercase()))
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortCatalog for PortScanner {
    fn scan(&self) -> Result<Vec<PortDescriptor>, DetectError> {
        self.enumerate_ports()
    }
}
