//! Lookup example: find an ONU by its description label
//!
//! This example connects to one OLT, searches the configured EPON ports and
//! prints the unit's status report.
//!
//! # Prerequisites
//!
//! - OLT CLI reachable over TCP (port 23)
//! - Valid login and enable credentials
//!
//! # Usage
//!
//! ```bash
//! cargo run --example lookup -- --host 10.0.0.2 --user admin --password secret rogersaade
//! ```
//!
//! Print the result as JSON instead:
//! ```bash
//! cargo run --example lookup -- --host 10.0.0.2 --user admin --password secret --json rogersaade
//! ```

use std::env;
use std::time::Duration;

use oltscope::{DeviceConfig, OltClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let Some(description) = args.description.clone() else {
        eprintln!("Error: missing description to search for");
        Args::print_help();
        std::process::exit(1);
    };

    let mut builder = DeviceConfig::builder(&args.host, &args.host)
        .port(args.port)
        .username(&args.user)
        .password(&args.password)
        .command_timeout(Duration::from_secs(args.timeout));
    if let Some(enable) = &args.enable_password {
        builder = builder.enable_password(enable);
    }
    if !args.ports.is_empty() {
        builder = builder.ports(args.ports.iter());
    }
    let client = OltClient::new(builder.build()?)?;

    println!("Searching {} for '{}'...", args.host, description);
    let result = client.get_unit_info(&description).await;
    client.close().await;

    match result? {
        Some(info) if args.json => println!("{}", serde_json::to_string_pretty(&info)?),
        Some(info) => println!("{}", info),
        None => println!("No unit with description '{}'", description),
    }

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    enable_password: Option<String>,
    ports: Vec<String>,
    timeout: u64,
    json: bool,
    description: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 23,
            user: "admin".to_string(),
            password: String::new(),
            enable_password: None,
            ports: Vec::new(),
            timeout: 15,
            json: false,
            description: None,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => {
                    parsed.host = value.unwrap_or(parsed.host);
                    i += 1;
                }
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(23);
                    i += 1;
                }
                "--user" | "-u" => {
                    parsed.user = value.unwrap_or(parsed.user);
                    i += 1;
                }
                "--password" | "-P" => {
                    parsed.password = value.unwrap_or_default();
                    i += 1;
                }
                "--enable" | "-e" => {
                    parsed.enable_password = value;
                    i += 1;
                }
                "--epon" => {
                    parsed.ports.extend(value);
                    i += 1;
                }
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(15);
                    i += 1;
                }
                "--json" => parsed.json = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other if !other.starts_with('-') => parsed.description = Some(other.to_string()),
                other => eprintln!("Unknown argument: {}", other),
            }
            i += 1;
        }

        parsed
    }

    fn print_help() {
        println!(
            r#"oltscope lookup example

USAGE:
    cargo run --example lookup -- [OPTIONS] <DESCRIPTION>

OPTIONS:
    -h, --host <HOST>        OLT address [default: localhost]
    -p, --port <PORT>        CLI port [default: 23]
    -u, --user <USER>        Username [default: admin]
    -P, --password <PASS>    Login password
    -e, --enable <PASS>      Enable password [default: login password]
    --epon <PORT>            EPON port to search, repeatable [default: 0/1..0/4]
    -t, --timeout <SECS>     Command timeout [default: 15]
    --json                   Print the result as JSON
    --help                   Print this help message
"#
        );
    }
}
