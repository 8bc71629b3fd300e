//! Sensor Shell Simulation Library
//!
//! This crate provides a simulation layer for exercising the sensor shell
//! client without a board attached. It includes:
//!
//! - **VirtualShell**: answers analog and I2C channel commands with
//!   protocol-accurate reply lines, or with malformed/no replies on demand
//! - **run_virtual_shell_task**: serves a shell over any async stream
//! - **TrafficTap**: records the writes and reads crossing a stream
//!
//! # Example
//!
//! ```rust
//! use sonde_sim::VirtualShell;
//!
//! let mut shell = VirtualShell::new("Bench");
//! shell.set_analog("A0", 512);
//! shell.attach_i2c("i1", 1000);
//!
//! assert_eq!(shell.respond(b"A0"), Some(b"VALUE=512\r\n".to_vec()));
//! assert_eq!(shell.respond(b"i1"), Some(b"VALUE=3,232\r\n".to_vec()));
//! assert_eq!(shell.respond(b"i7"), Some(b"VALUE=-\r\n".to_vec()));
//! ```

pub mod shell;
pub mod shell_task;
pub mod tap;

pub use shell::{ChannelReply, VirtualShell, VirtualShellConfig};
pub use shell_task::{run_virtual_shell_task, spawn_virtual_shell};
pub use tap::{TapEvent, TrafficLog, TrafficTap};
