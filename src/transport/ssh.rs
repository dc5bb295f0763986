//! SSH transport: a child process running the system `ssh` binary.
//!
//! The session is a long-lived interactive shell obtained by forcing PTY
//! allocation (`-tt`). Password authentication wraps the invocation in
//! `sshpass -e`, passing the password through the `SSHPASS` environment
//! variable so it never appears on a command line; key authentication
//! appends `-i <path>`.
//!
//! Outbound bytes flow through an unbounded channel drained by a writer
//! task that owns the child's stdin; the driver's [`Transport::send`] is
//! therefore synchronous and non-blocking. The read side is pumped by the
//! client facade, which feeds child stdout into `CliDriver::handle_data`.

use std::path::PathBuf;
use std::process::Stdio;

use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::TransportError;

use super::Transport;

/// Authentication method for the ssh child process.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Password via `sshpass -e` and the `SSHPASS` environment variable.
    Password(String),
    /// Private key file passed with `-i`.
    PrivateKey { path: PathBuf },
}

/// Connection settings for an SSH device session.
#[derive(Debug, Clone)]
pub struct SshSettings {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username, passed with `-l`.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connection timeout, passed as `-o ConnectTimeout=<n>`.
    pub connect_timeout_secs: u64,

    /// When `false`, host keys are not checked:
    /// `-o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null`.
    /// Lab devices regenerate keys on every boot; leave this off for them.
    pub strict_host_key_checking: bool,

    /// Optional SSH subsystem (`-s <name>`). Not used for CLI sessions.
    pub subsystem: Option<String>,
}

impl SshSettings {
    /// Settings with defaults: port 22, 30s connect timeout, host-key
    /// checking off, no subsystem.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        auth: AuthMethod,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            connect_timeout_secs: 30,
            strict_host_key_checking: false,
            subsystem: None,
        }
    }

    /// The program, arguments, and environment for this session.
    pub(crate) fn command_line(&self) -> (String, Vec<String>, Vec<(String, String)>) {
        let mut args: Vec<String> = Vec::new();
        let mut envs: Vec<(String, String)> = Vec::new();

        let program = match &self.auth {
            AuthMethod::Password(password) => {
                args.push("-e".to_string());
                args.push("ssh".to_string());
                envs.push(("SSHPASS".to_string(), password.clone()));
                "sshpass".to_string()
            }
            AuthMethod::PrivateKey { .. } => "ssh".to_string(),
        };

        args.push("-p".to_string());
        args.push(self.port.to_string());
        args.push("-tt".to_string());
        args.push("-l".to_string());
        args.push(self.username.clone());
        args.push("-o".to_string());
        args.push(format!("ConnectTimeout={}", self.connect_timeout_secs));

        if !self.strict_host_key_checking {
            args.push("-o".to_string());
            args.push("StrictHostKeyChecking=no".to_string());
            args.push("-o".to_string());
            args.push("UserKnownHostsFile=/dev/null".to_string());
        }

        if let AuthMethod::PrivateKey { path } = &self.auth {
            args.push("-i".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        if let Some(subsystem) = &self.subsystem {
            args.push("-s".to_string());
            args.push(subsystem.clone());
        }

        args.push(self.host.clone());

        (program, args, envs)
    }
}

/// Outbound half of a spawned SSH session.
///
/// Cheap handle around the writer channel; dropping it does not terminate
/// the session (the facade owns the child).
pub struct SshProcessTransport {
    tx: UnboundedSender<Vec<u8>>,
}

impl Transport for SshProcessTransport {
    fn send(&mut self, bytes: &[u8]) -> bool {
        self.tx.send(bytes.to_vec()).is_ok()
    }
}

/// A spawned ssh child with its plumbing, ready to be wired to a driver.
pub(crate) struct SpawnedSsh {
    pub transport: SshProcessTransport,
    pub child: Child,
    pub stdout: ChildStdout,
    pub writer_task: JoinHandle<()>,
}

impl SshProcessTransport {
    /// Spawn the ssh process described by `settings`.
    pub(crate) fn spawn(settings: &SshSettings) -> Result<SpawnedSsh, TransportError> {
        let (program, args, envs) = settings.command_line();
        debug!("spawning {program} for {}@{}:{}", settings.username, settings.host, settings.port);

        let mut child = Command::new(&program)
            .args(&args)
            .envs(envs)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransportError::SpawnFailed { program, source })?;

        let mut stdin = child.stdin.take().ok_or(TransportError::Closed)?;
        let stdout = child.stdout.take().ok_or(TransportError::Closed)?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let writer_task = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                if stdin.write_all(&chunk).await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        Ok(SpawnedSsh {
            transport: Self { tx },
            child,
            stdout,
            writer_task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_auth_uses_sshpass_env() {
        let settings = SshSettings::new("router1", "admin", AuthMethod::Password("s3cret".into()));
        let (program, args, envs) = settings.command_line();

        assert_eq!(program, "sshpass");
        assert_eq!(args[0], "-e");
        assert_eq!(args[1], "ssh");
        assert_eq!(envs, vec![("SSHPASS".to_string(), "s3cret".to_string())]);
        // The password must not appear among the arguments.
        assert!(!args.iter().any(|a| a.contains("s3cret")));
    }

    #[test]
    fn test_invariant_flags_present_in_order() {
        let settings = SshSettings::new("router1", "admin", AuthMethod::Password("pw".into()));
        let (_, args, _) = settings.command_line();

        let joined = args.join(" ");
        assert!(joined.contains("-p 22"));
        assert!(joined.contains("-tt"));
        assert!(joined.contains("-l admin"));
        assert!(joined.contains("-o ConnectTimeout=30"));
        // -p comes before the hostname, which is last
        assert_eq!(args.last().unwrap(), "router1");
    }

    #[test]
    fn test_host_key_checking_disabled_by_default() {
        let settings = SshSettings::new("h", "u", AuthMethod::Password("p".into()));
        let (_, args, _) = settings.command_line();
        let joined = args.join(" ");

        assert!(joined.contains("StrictHostKeyChecking=no"));
        assert!(joined.contains("UserKnownHostsFile=/dev/null"));
    }

    #[test]
    fn test_strict_host_key_checking_omits_overrides() {
        let mut settings = SshSettings::new("h", "u", AuthMethod::Password("p".into()));
        settings.strict_host_key_checking = true;
        let (_, args, _) = settings.command_line();
        let joined = args.join(" ");

        assert!(!joined.contains("StrictHostKeyChecking"));
        assert!(!joined.contains("UserKnownHostsFile"));
    }

    #[test]
    fn test_key_auth_appends_identity() {
        let settings = SshSettings::new(
            "h",
            "u",
            AuthMethod::PrivateKey {
                path: PathBuf::from("/home/op/.ssh/id_ed25519"),
            },
        );
        let (program, args, envs) = settings.command_line();

        assert_eq!(program, "ssh");
        assert!(envs.is_empty());
        let idx = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[idx + 1], "/home/op/.ssh/id_ed25519");
    }

    #[test]
    fn test_subsystem_flag() {
        let mut settings = SshSettings::new("h", "u", AuthMethod::Password("p".into()));
        settings.subsystem = Some("netconf".to_string());
        let (_, args, _) = settings.command_line();

        let idx = args.iter().position(|a| a == "-s").unwrap();
        assert_eq!(args[idx + 1], "netconf");
        // Hostname still last
        assert_eq!(args.last().unwrap(), "h");
    }

    #[test]
    fn test_custom_port_and_timeout() {
        let mut settings = SshSettings::new("h", "u", AuthMethod::Password("p".into()));
        settings.port = 2022;
        settings.connect_timeout_secs = 5;
        let (_, args, _) = settings.command_line();
        let joined = args.join(" ");

        assert!(joined.contains("-p 2022"));
        assert!(joined.contains("ConnectTimeout=5"));
    }
}
