//! Cisco IOS XR rollback walk-through
//!
//! Connects to an IOS XR device and reverts the last N committed
//! configuration changes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example iosxr_rollback -- --host 192.168.1.2 --user admin --password secret --commits 2
//! ```

use std::env;
use std::process;

use netcommit::{AuthMethod, DeviceClient, DeviceKind, Error, SshSettings};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut host = None;
    let mut port = 22;
    let mut user = None;
    let mut password = None;
    let mut commits = 1u32;

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--host" => host = iter.next(),
            "--port" => port = iter.next().and_then(|p| p.parse().ok()).unwrap_or(22),
            "--user" => user = iter.next(),
            "--password" => password = iter.next(),
            "--commits" => commits = iter.next().and_then(|n| n.parse().ok()).unwrap_or(1),
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(2);
            }
        }
    }

    let (Some(host), Some(user), Some(password)) = (host, user, password) else {
        eprintln!("Usage: iosxr_rollback --host <host> --user <user> --password <pw> [--commits <n>]");
        process::exit(2);
    };

    let mut settings = SshSettings::new(&host, &user, AuthMethod::Password(password));
    settings.port = port;

    println!("Connecting to {host}:{port}...");
    let client = DeviceClient::connect(&settings, DeviceKind::IosXr).await?;
    println!("Connected: {}\n", client.device_info().await);

    println!("Rolling back the last {commits} commit(s)...");
    let session_log = client.rollback(commits).await?;
    println!("Rollback complete. Session transcript:\n{session_log}");

    client.disconnect().await?;
    println!("Disconnected.");
    Ok(())
}
