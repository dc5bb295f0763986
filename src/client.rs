//! High-level client facade over a driver and its SSH transport.
//!
//! [`DeviceClient`] owns the session lifetime: it spawns the ssh child,
//! pumps its stdout into the driver, and adapts the driver's callback API
//! into async methods. One client per device session; operations are
//! serialized through the driver's ready-state gate, so concurrent calls on
//! one client fail fast with a not-ready error rather than interleaving.

use std::sync::Arc;

use bytes::BytesMut;
use log::{debug, info, warn};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::driver::{CliDriver, DriverState, OperationCallback};
use crate::error::{DriverError, Error, Result};
use crate::transport::{SshProcessTransport, SshSettings};
use crate::vendor::{DeviceInfo, DeviceKind};

/// A connected device session.
pub struct DeviceClient {
    driver: Arc<Mutex<CliDriver>>,
    child: Child,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl DeviceClient {
    /// Connect to a device and initialize the CLI session.
    ///
    /// Spawns the ssh child process, wires its output into the driver, and
    /// sends the vendor session-setup commands.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the ssh process cannot be spawned, or a
    /// driver error if initialization fails.
    pub async fn connect(settings: &SshSettings, kind: DeviceKind) -> Result<Self> {
        let spawned = SshProcessTransport::spawn(settings)?;

        let driver = Arc::new(Mutex::new(CliDriver::new(
            kind,
            Box::new(spawned.transport),
        )));

        let reader_task = tokio::spawn(read_pump(spawned.stdout, driver.clone()));

        driver.lock().await.initialize().map_err(Error::Driver)?;
        info!(
            "connected to {}@{}:{} ({kind})",
            settings.username, settings.host, settings.port
        );

        Ok(Self {
            driver,
            child: spawned.child,
            reader_task,
            writer_task: spawned.writer_task,
        })
    }

    /// Connect by device-kind name, e.g. from a CLI argument.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnsupportedDevice`] when `kind_name` names a
    /// device family this crate has no driver for; no process is spawned
    /// in that case.
    pub async fn connect_named(settings: &SshSettings, kind_name: &str) -> Result<Self> {
        let kind = DeviceKind::from_name(kind_name).ok_or_else(|| {
            Error::Driver(DriverError::UnsupportedDevice {
                name: kind_name.to_string(),
            })
        })?;
        Self::connect(settings, kind).await
    }

    /// Run one operational command and return its response body.
    pub async fn execute(&self, command: &str) -> Result<String> {
        let (cb, rx) = oneshot_callback();
        self.driver.lock().await.execute_command(cb, command);
        await_operation(rx).await
    }

    /// Apply a configuration change set atomically and commit it.
    ///
    /// Returns the session log of the whole exchange. A rejected commit is
    /// rolled back on the device and surfaces as
    /// [`DriverError::CommitFailed`] with the log attached.
    pub async fn configure(&self, config_lines: Vec<String>) -> Result<String> {
        let (cb, rx) = oneshot_callback();
        self.driver.lock().await.configure_and_commit(cb, config_lines);
        await_operation(rx).await
    }

    /// Revert the last `commits_back` committed configuration changes.
    pub async fn rollback(&self, commits_back: u32) -> Result<String> {
        let (cb, rx) = oneshot_callback();
        self.driver
            .lock()
            .await
            .rollback_configuration(cb, commits_back);
        await_operation(rx).await
    }

    /// Identity of the device family behind this session.
    pub async fn device_info(&self) -> DeviceInfo {
        self.driver.lock().await.device_info()
    }

    /// Whether the session is idle and accepting operations.
    pub async fn is_ready(&self) -> bool {
        self.driver.lock().await.is_ready()
    }

    /// Current driver state.
    pub async fn state(&self) -> DriverState {
        self.driver.lock().await.state()
    }

    /// Tear the session down.
    ///
    /// Kills the ssh child and fails any in-flight operation with a
    /// disconnection error. This is also the watchdog escape hatch for a
    /// device that stopped emitting prompts.
    pub async fn disconnect(mut self) -> Result<()> {
        debug!("disconnecting session");
        self.reader_task.abort();
        self.writer_task.abort();
        if let Err(e) = self.child.kill().await {
            warn!("failed to kill ssh child: {e}");
        }
        self.driver.lock().await.notify_disconnected();
        Ok(())
    }
}

/// Pump child stdout into the driver until EOF or read error.
async fn read_pump(mut stdout: ChildStdout, driver: Arc<Mutex<CliDriver>>) {
    let mut buf = BytesMut::with_capacity(8192);
    loop {
        buf.clear();
        match stdout.read_buf(&mut buf).await {
            Ok(0) | Err(_) => {
                debug!("ssh stdout closed");
                driver.lock().await.notify_disconnected();
                break;
            }
            Ok(_) => {
                driver.lock().await.handle_data(&buf);
            }
        }
    }
}

/// Adapt an [`OperationCallback`] into a oneshot receiver.
fn oneshot_callback() -> (
    OperationCallback,
    oneshot::Receiver<std::result::Result<String, DriverError>>,
) {
    let (tx, rx) = oneshot::channel();
    let cb: OperationCallback = Box::new(move |result| {
        let _ = tx.send(result);
    });
    (cb, rx)
}

async fn await_operation(
    rx: oneshot::Receiver<std::result::Result<String, DriverError>>,
) -> Result<String> {
    match rx.await {
        Ok(result) => result.map_err(Error::Driver),
        // Callback dropped without firing: the driver is gone.
        Err(_) => Err(Error::Driver(DriverError::Disconnected)),
    }
}
