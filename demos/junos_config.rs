//! Juniper JUNOS walk-through
//!
//! Connects to a JUNOS device, runs an operational command, then applies a
//! small configuration change set with commit semantics.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example junos_config -- --host 192.168.1.1 --user admin --password secret
//! ```
//!
//! With SSH key:
//! ```bash
//! cargo run --example junos_config -- --host router.lab --user admin --key ~/.ssh/id_ed25519
//! ```

use std::env;
use std::path::PathBuf;
use std::process;

use netcommit::{AuthMethod, DeviceClient, DeviceKind, Error, SshSettings};

struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    description: String,
}

impl Args {
    fn parse() -> Self {
        let mut host = None;
        let mut port = 22;
        let mut user = None;
        let mut password = None;
        let mut key = None;
        let mut description = "managed by netcommit".to_string();

        let mut iter = env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--host" => host = iter.next(),
                "--port" => port = iter.next().and_then(|p| p.parse().ok()).unwrap_or(22),
                "--user" => user = iter.next(),
                "--password" => password = iter.next(),
                "--key" => key = iter.next().map(PathBuf::from),
                "--description" => description = iter.next().unwrap_or(description),
                other => {
                    eprintln!("Unknown argument: {other}");
                    process::exit(2);
                }
            }
        }

        let (Some(host), Some(user)) = (host, user) else {
            eprintln!("Usage: junos_config --host <host> --user <user> (--password <pw> | --key <path>)");
            process::exit(2);
        };

        Self {
            host,
            port,
            user,
            password,
            key,
            description,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let auth = if let Some(password) = args.password {
        AuthMethod::Password(password)
    } else if let Some(path) = args.key {
        AuthMethod::PrivateKey { path }
    } else {
        eprintln!("Error: must provide either --password or --key");
        process::exit(2);
    };

    let mut settings = SshSettings::new(&args.host, &args.user, auth);
    settings.port = args.port;

    println!("Connecting to {}:{}...", args.host, args.port);
    let client = DeviceClient::connect(&settings, DeviceKind::Junos).await?;
    println!("Connected: {}\n", client.device_info().await);

    // --- Operational command ---
    println!("Executing: show version");
    let version = client.execute("show version").await?;
    println!("{version}\n");

    // --- Configuration with commit ---
    let change_set = vec![format!(
        "set interfaces ge-0/0/0 description \"{}\"",
        args.description
    )];
    println!("Applying {} configuration line(s)...", change_set.len());

    match client.configure(change_set).await {
        Ok(session_log) => {
            println!("Commit complete. Session transcript:\n{session_log}");
        }
        Err(Error::Driver(netcommit::DriverError::CommitFailed { session_log })) => {
            eprintln!("Commit rejected and rolled back. Transcript:\n{session_log}");
        }
        Err(e) => return Err(e),
    }

    client.disconnect().await?;
    println!("Disconnected.");
    Ok(())
}
