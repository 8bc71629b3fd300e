//! Vendor-id based board detection
//!
//! The first port in enumeration order whose vendor id matches the device
//! signature wins. Several matching boards are not told apart further.

use tracing::{debug, info, warn};

use crate::error::DetectError;
use crate::scanner::{PortCatalog, PortDescriptor};
use crate::usb_ids;

/// Picks the sensor shell board out of a port list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDetector {
    vendor_id: u16,
}

impl DeviceDetector {
    /// Create a detector for the default Arduino signature
    pub fn new() -> Self {
        Self::with_vendor_id(usb_ids::arduino::VID)
    }

    /// Create a detector for an alternate board signature
    pub fn with_vendor_id(vendor_id: u16) -> Self {
        Self { vendor_id }
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// Returns true if the port carries the device signature
    pub fn matches(&self, port: &PortDescriptor) -> bool {
        port.vendor_id == Some(self.vendor_id)
    }

    /// Return the first port carrying the device signature
    pub fn detect<'a>(&self, ports: &'a [PortDescriptor]) -> Option<&'a PortDescriptor> {
        let found = ports.iter().find(|p| self.matches(p));

        match found {
            Some(port) => {
                info!("Detected {} on {}", port.label().unwrap_or("board"), port.name);

                let others = ports.iter().filter(|p| self.matches(p)).count() - 1;
                if others > 0 {
                    debug!("Ignoring {} other matching port(s)", others);
                }
            }
            None => warn!(
                "No device with vendor id 0x{:04X} detected among {} port(s)",
                self.vendor_id,
                ports.len()
            ),
        }

        found
    }

    /// Scan a catalog and return the first matching port
    pub fn scan<C>(&self, catalog: &C) -> Result<Option<PortDescriptor>, DetectError>
    where
        C: PortCatalog + ?Sized,
    {
        let ports = catalog.scan()?;
        Ok(self.detect(&ports).cloned())
    }
}

impl Default for DeviceDetector {
    fn default() -> Self {
        Self::new()
    }
}
