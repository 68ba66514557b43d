//! Example: download a file by id
//!
//! Usage:
//!   cargo run --example download -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] [--overwrite] <FILE_ID> <LOCAL_PATH>

mod cli;

use cli::{config_from_parser, usage_and_exit, ArgParser};
use drivepath::{DriveClient, TransferProgress};
use std::process;

const USAGE: &str = "Usage: cargo run --example download -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] [--overwrite] <FILE_ID> <LOCAL_PATH>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut parser = ArgParser::new(USAGE);
    let config = config_from_parser(&mut parser);
    let overwrite = parser.take_flag(&["--overwrite", "-f"]);
    let positionals = parser.remaining();
    if positionals.len() != 2 {
        usage_and_exit(USAGE);
    }
    let file_id = &positionals[0];
    let local_path = &positionals[1];

    let client = DriveClient::from_config(config)?;

    println!("Downloading {} to {}...", file_id, local_path);
    let progress = Box::new(|p: &TransferProgress| {
        if p.total > 0 {
            print!("\r{:.1}%", p.percent());
        } else {
            print!("\r{} bytes", p.done);
        }
        true
    });
    if let Err(e) = client
        .download_file_with_progress(file_id, local_path, overwrite, progress)
        .await
    {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
    println!("\nDownload complete!");

    Ok(())
}
