//! Key pair generator.
//!
//! Generates a fresh Ed25519 key pair, writes it to a key file, and
//! prints the base64 public key for embedding in an application.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::Parser;
use latchkey::{export_key_pair, export_public_key, KeyPair};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "latchkey-keygen")]
#[command(about = "Generate an Ed25519 license key pair")]
struct Args {
    /// Output key pair file
    out: PathBuf,

    /// Also write a verification-only key file for distribution
    #[arg(long)]
    public_out: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let pair = KeyPair::generate();
    export_key_pair(&pair, &args.out)
        .with_context(|| format!("writing key pair to {}", args.out.display()))?;
    debug!("key pair written to {}", args.out.display());

    if let Some(path) = &args.public_out {
        export_public_key(&pair.verifying_key, path)
            .with_context(|| format!("writing public key to {}", path.display()))?;
        debug!("public key written to {}", path.display());
    }

    println!("Key pair written to {}", args.out.display());
    println!(
        "Public key (base64): {}",
        BASE64.encode(pair.verifying_key.to_bytes())
    );
    Ok(())
}
