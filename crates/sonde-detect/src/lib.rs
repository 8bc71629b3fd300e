//! Sensor Shell Port Detection Library
//!
//! This crate provides serial port enumeration and vendor-id based
//! identification of the board running the sensor shell.
//!
//! # Example
//!
//! ```rust,no_run
//! use sonde_detect::{DeviceDetector, PortCatalog, PortScanner};
//!
//! let scanner = PortScanner::new();
//! let ports = scanner.scan().unwrap();
//!
//! match DeviceDetector::new().detect(&ports) {
//!     Some(port) => println!("Sensor shell on {}", port.name),
//!     None => println!("No board attached"),
//! }
//! ```

pub mod detector;
pub mod error;
pub mod scanner;
pub mod usb_ids;

pub use detector::DeviceDetector;
pub use error::DetectError;
pub use scanner::{PortCatalog, PortDescriptor, PortScanner, ScannerConfig};
