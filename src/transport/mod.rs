//! Transport seam between the driver and the byte stream.
//!
//! The driver only ever writes through [`Transport::send`]; inbound bytes
//! reach it through `CliDriver::handle_data`, called by whoever owns the
//! read side. Keeping the interface this small lets tests drive the state
//! machine with a recording double and direct `handle_data` calls, no
//! concurrency involved. The recording double is available to downstream
//! test suites behind the `test-util` feature.

pub mod ssh;

#[cfg(any(test, feature = "test-util"))]
use std::sync::{Arc, Mutex};

pub use ssh::{AuthMethod, SshProcessTransport, SshSettings};

/// Outbound half of a device session.
pub trait Transport: Send {
    /// Queue bytes for delivery to the device.
    ///
    /// Returns `false` iff the bytes could not be queued (the session is
    /// dead); the driver treats that as a disconnection.
    fn send(&mut self, bytes: &[u8]) -> bool;
}

/// Shared handle to the commands a [`RecordingTransport`] has captured.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Default)]
pub struct SentLog {
    inner: Arc<Mutex<Vec<String>>>,
}

#[cfg(any(test, feature = "test-util"))]
impl SentLog {
    /// Snapshot of everything sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.inner.lock().unwrap().clone()
    }

    /// Number of sends so far.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    fn push(&self, entry: String) {
        self.inner.lock().unwrap().push(entry);
    }
}

/// Capture-only transport for tests: records each sent chunk as a string.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: SentLog,
    reject_sends: bool,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingTransport {
    /// Create a recording transport and the handle to inspect it.
    pub fn new() -> (Self, SentLog) {
        let log = SentLog::default();
        (
            Self {
                log: log.clone(),
                reject_sends: false,
            },
            log,
        )
    }

    /// Create a transport whose `send` always fails, to exercise the
    /// disconnection path.
    pub fn rejecting() -> Self {
        Self {
            log: SentLog::default(),
            reject_sends: true,
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Transport for RecordingTransport {
    fn send(&mut self, bytes: &[u8]) -> bool {
        if self.reject_sends {
            return false;
        }
        self.log.push(String::from_utf8_lossy(bytes).to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_transport_captures_in_order() {
        let (mut transport, log) = RecordingTransport::new();
        assert!(transport.send(b"first\n"));
        assert!(transport.send(b"second\n"));

        assert_eq!(log.sent(), vec!["first\n", "second\n"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_rejecting_transport() {
        let mut transport = RecordingTransport::rejecting();
        assert!(!transport.send(b"anything\n"));
    }

    #[test]
    fn test_sent_log_clone_sees_updates() {
        let (mut transport, log) = RecordingTransport::new();
        let other = log.clone();
        transport.send(b"cmd\n");
        assert_eq!(other.sent(), vec!["cmd\n"]);
    }

    #[test]
    fn test_trait_object() {
        let (transport, log) = RecordingTransport::new();
        let mut boxed: Box<dyn Transport> = Box::new(transport);
        assert!(boxed.send(b"via trait\n"));
        assert_eq!(log.sent(), vec!["via trait\n"]);
    }
}
