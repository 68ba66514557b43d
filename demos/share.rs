//! Example: make a file readable by anyone and print its link
//!
//! Uses the compatibility surface, which reports failures as empty strings.
//!
//! Usage:
//!   cargo run --example share -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] <FILE_ID>

mod cli;

use cli::{parse_options, usage_and_exit};
use std::process;

const USAGE: &str = "Usage: cargo run --example share -- [--credentials FILE] [--working-dir DIR] [--proxy PROXY] <FILE_ID>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let options = parse_options(USAGE);
    if options.positionals.len() != 1 {
        usage_and_exit(USAGE);
    }
    let file_id = &options.positionals[0];

    let client = options.compat_client()?;

    let permission = client.set_permission(file_id).await;
    if permission.is_empty() {
        eprintln!("Could not share {} (see log for details)", file_id);
        process::exit(1);
    }
    println!("Permission id: {}", permission);

    let link = client.get_share_file_link(file_id).await;
    if link.is_empty() {
        eprintln!("No view link available for {}", file_id);
        process::exit(1);
    }
    println!("{}", link);

    Ok(())
}
