//! parley client binary.
//!
//! `parley-client <hostname> <port>`: connects, sends a greeting request
//! and a message, prints each response, and exits 0 on normal EOF. On I/O
//! failure the exit code is the OS errno when one is available.

use clap::Parser;
use parley::client;

/// Command-line arguments for the client.
#[derive(Parser, Debug)]
#[command(name = "parley-client")]
#[command(version = "0.1.0")]
#[command(about = "Client for the parley server", long_about = None)]
struct CliArgs {
    /// Server hostname
    hostname: String,

    /// Server port
    port: u16,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    match client::run(&args.hostname, args.port).await {
        Ok(responses) => {
            for response in responses {
                println!("Received: \"{}\"", response);
            }
        }
        Err(e) => {
            eprintln!("Error - {}", e);
            std::process::exit(e.raw_os_error().unwrap_or(1));
        }
    }
}
