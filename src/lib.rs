//! # netcommit
//!
//! Async CLI driver for network device configuration with commit semantics.
//!
//! netcommit automates the human-facing command line of Juniper JUNOS and
//! Cisco IOS XR devices over SSH: operational commands, multi-line
//! configuration applied atomically with commit semantics, and explicit
//! rollback of previously committed changes. Callers are insulated from
//! vendor prompt syntax, pager noise, and commit-failure phrasing.
//!
//! ## Architecture
//!
//! - A per-session [`CliDriver`] state machine consumes the byte stream of
//!   an interactive shell, detects vendor prompts, and sequences multi-step
//!   operations through a callback API with strict preconditions.
//! - [`VendorProfile`] supplies everything vendor-specific: init commands,
//!   prompt patterns, config/commit/abort/rollback command lists, and the
//!   commit-failure predicate.
//! - The [`Transport`](transport::Transport) seam is a single
//!   `send(bytes) -> bool`; tests drive the state machine with a recording
//!   double and direct `handle_data` calls.
//! - [`DeviceClient`] wires a driver to a system `ssh` child process and
//!   exposes the whole thing as an async API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netcommit::{AuthMethod, DeviceClient, DeviceKind, SshSettings};
//!
//! #[tokio::main]
//! async fn main() -> netcommit::Result<()> {
//!     let settings = SshSettings::new(
//!         "192.0.2.1",
//!         "admin",
//!         AuthMethod::Password("secret".into()),
//!     );
//!
//!     let client = DeviceClient::connect(&settings, DeviceKind::Junos).await?;
//!
//!     let version = client.execute("show version").await?;
//!     println!("{version}");
//!
//!     let log = client
//!         .configure(vec![
//!             "set interfaces ge-0/0/0 description uplink".to_string(),
//!         ])
//!         .await?;
//!     println!("{log}");
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod client;
pub mod driver;
pub mod error;
pub mod transport;
pub mod vendor;

// Re-export main types for convenience
pub use client::DeviceClient;
pub use driver::{is_valid_transition, CliDriver, DriverState, OperationCallback};
pub use error::{DriverError, Error, Result, TransportError};
pub use transport::{AuthMethod, SshSettings, Transport};
#[cfg(any(test, feature = "test-util"))]
pub use transport::{RecordingTransport, SentLog};
pub use vendor::{DeviceInfo, DeviceKind, VendorProfile};
