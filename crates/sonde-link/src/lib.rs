//! Sensor Shell Link Engine
//!
//! This crate owns the serial link to the sensor shell and runs queries
//! over it:
//!
//! - **ConnectionManager**: opens and closes the single link (9600 8N1)
//! - **Transport**: raw writes and buffered, poll-bounded reads
//! - **QueryCoordinator**: one query at a time, clear → write → read line → decode
//! - **SensorShell**: detect-and-open, query, close
//!
//! # Concurrency
//!
//! Queries from many tasks share one link. The coordinator admits a single
//! query at a time, so a command's reply is never consumed by another
//! caller. Every read loop runs under a deadline and fails with
//! [`QueryError::ReadTimeout`] instead of hanging when the board goes quiet.
//!
//! # Example
//!
//! ```rust,no_run
//! use sonde_link::{QueryConfig, SensorShell};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let shell = SensorShell::serial(QueryConfig::default());
//! let port = shell.detect_and_open().await?;
//! println!("Connected on {}", port.name);
//!
//! let light = shell.query_sensor("A0").await?;
//! let temperature = shell.query_sensor("i1").await?;
//! println!("A0 = {}, i1 = {}", light, temperature);
//!
//! shell.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod coordinator;
pub mod error;
pub mod shell;
pub mod transport;

pub use connection::{ConnectionManager, Link, LinkConfig, PortOpener, SerialOpener};
pub use coordinator::{QueryConfig, QueryCoordinator};
pub use error::{ConnectionError, QueryError, TransportError};
pub use shell::SensorShell;
pub use transport::Transport;
