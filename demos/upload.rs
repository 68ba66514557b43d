//! Example: upload a local file to a remote path
//!
//! Usage:
//!   cargo run --example upload -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] <LOCAL_FILE> <REMOTE_PATH>

mod cli;

use cli::{parse_options, usage_and_exit};
use drivepath::TransferProgress;
use std::process;

const USAGE: &str = "Usage: cargo run --example upload -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] <LOCAL_FILE> <REMOTE_PATH>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let options = parse_options(USAGE);
    if options.positionals.len() != 2 {
        usage_and_exit(USAGE);
    }
    let local_file = &options.positionals[0];
    let remote_path = &options.positionals[1];

    let client = options.client()?;

    println!("Uploading {} to {}...", local_file, remote_path);
    let progress = Box::new(|p: &TransferProgress| {
        print!("\r{}: {:.1}%", p.name, p.percent());
        true
    });
    match client
        .upload_file_with_progress(local_file, remote_path, progress)
        .await
    {
        Ok(id) => {
            println!();
            println!("Upload complete!");
            println!("File id: {}", id);
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            process::exit(1);
        }
    }

    Ok(())
}
