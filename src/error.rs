//! Error types for netcommit.

use std::io;
use thiserror::Error;

use crate::driver::DriverState;

/// Main error type for netcommit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Transport layer errors (ssh child process, byte plumbing).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to spawn the ssh child process
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The ssh process exited or its pipes closed
    #[error("SSH process closed")]
    Closed,

    /// The outbound byte channel could not accept data
    #[error("Send failed - transport not writable")]
    SendFailed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Driver layer errors, delivered through operation callbacks.
#[derive(Error, Debug)]
pub enum DriverError {
    /// An operation was requested while another is in flight or the
    /// session is not established.
    #[error("driver not ready - current state: {state}")]
    NotReady { state: DriverState },

    /// An operation was requested with an invalid argument.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Internal logic attempted a state move the transition table forbids.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: DriverState, to: DriverState },

    /// The device rejected the commit; the driver already ran the abort
    /// sequence. The full transcript of the attempt is attached.
    #[error("configuration commit failed but was automatically rolled back")]
    CommitFailed { session_log: String },

    /// The transport died while an operation was in flight.
    #[error("session disconnected")]
    Disconnected,

    /// The requested device family has no driver.
    #[error("unsupported device kind: '{name}'")]
    UnsupportedDevice { name: String },
}

/// Result type alias using netcommit's Error.
pub type Result<T> = std::result::Result<T, Error>;
