//! Keep a Windows wireless interface connected to one network.
//!
//! The library polls `netsh wlan show interfaces`, and when the interface has
//! dropped off the target network it checks that the network is in range and
//! issues `netsh wlan connect`. Every decision is made from freshly queried
//! command output; nothing is cached between polls.
//!
//! # Modules
//!
//! - [`config`] - Config file and merged watch settings
//! - [`connection`] - Status parsing and the connect command
//! - [`error`] - Custom error types for the library
//! - [`interface`] - Wireless interface discovery
//! - [`labels`] - Localized `netsh` output labels
//! - [`logging`] - Log subscriber setup
//! - [`monitor`] - The poll loop
//! - [`runner`] - External command execution with timeouts
//! - [`scan`] - Network visibility scanning
//!
//! # Example Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use wlan_keeper::{resolve_interface, Monitor, Netsh};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let runner = Netsh::new();
//! let interface = resolve_interface(&runner, None).await?;
//!
//! let monitor = Monitor::new(runner, "home_5G", interface);
//! monitor.run(Duration::from_secs(15)).await?;
//! # Ok(())
//! # }
//! ```

/// Configuration file handling and CLI/config merging.
pub mod config;

/// Interface status parsing and reconnection.
pub mod connection;

/// Error module defining custom error types for the library.
/// Uses `thiserror` for ergonomic error handling.
pub mod error;

/// Wireless interface discovery and resolution.
pub mod interface;

/// Localized label tables for `netsh` output.
pub mod labels;

/// `tracing` subscriber setup.
pub mod logging;

/// Periodic check-and-reconnect loop.
pub mod monitor;

/// Running `netsh` with a bounded timeout.
pub mod runner;

/// Visible network scanning.
pub mod scan;

pub use config::{Config, WatchSettings};

pub use connection::{connect, is_connected, status, Association, InterfaceStatus};

// Re-export the main error type for library users
pub use error::WlanError;

pub use interface::{detect_interface, list_interfaces, resolve_interface};

pub use monitor::{CheckOutcome, Monitor};

pub use runner::{CommandOutput, CommandRunner, Netsh};

pub use scan::{is_network_visible, scan_networks};
