//! Example: create a folder chain, reusing folders that already exist
//!
//! Usage:
//!   cargo run --example folder -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] <REMOTE_PATH>

mod cli;

use cli::{parse_options, usage_and_exit};
use std::process;

const USAGE: &str = "Usage: cargo run --example folder -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] <REMOTE_PATH>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let options = parse_options(USAGE);
    if options.positionals.len() != 1 {
        usage_and_exit(USAGE);
    }
    let remote_path = &options.positionals[0];

    let client = options.client()?;
    println!("Authorizing...");
    client.ensure_session().await?;

    println!("Resolving {}...", remote_path);
    match client.create_folder_path(remote_path).await {
        Ok(Some(id)) => println!("Folder id: {}", id),
        Ok(None) => println!("Empty path, nothing to create"),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    Ok(())
}
