//! License verifier.
//!
//! Imports a license and a key file, runs the validation suite against
//! this machine, and prints a per-test report. Floating expiration is
//! reported but not enforced unless `--enforce-float` is given, since a
//! first-use record may not exist yet on a fresh install.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use latchkey::{
    import_license, import_verifying_key, local_hardware_addresses, Validator,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "latchkey-verify")]
#[command(about = "Verify a license against a vendor public key")]
struct Args {
    /// License file to verify
    #[arg(short, long)]
    license: PathBuf,

    /// Key file holding the vendor public key
    #[arg(short, long)]
    key: PathBuf,

    /// Enforce floating expiration instead of only reporting it
    #[arg(long)]
    enforce_float: bool,

    /// First-use timestamp in ms since epoch, from the host
    /// application's first-run record
    #[arg(long, value_name = "MS")]
    first_use: Option<i64>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let license = import_license(&args.license)
        .with_context(|| format!("reading license {}", args.license.display()))?;
    let key = import_verifying_key(&args.key)
        .with_context(|| format!("reading key file {}", args.key.display()))?;

    let mut validator = Validator::new(license, key)
        .ignore_float_time(!args.enforce_float)
        .local_hardware_addresses(local_hardware_addresses());
    if let Some(millis) = args.first_use {
        let first_use = DateTime::from_timestamp_millis(millis)
            .with_context(|| format!("first-use timestamp out of range: {millis}"))?;
        validator = validator.first_use(first_use);
    }

    let now = Utc::now();
    let state = validator.validate(now);

    println!("\nValidation Test Results");
    println!("=======================\n");
    for result in state.results() {
        println!(
            "  {:<22} {}",
            result.test.name(),
            if result.passed { "Passed" } else { "Failed" }
        );
    }
    println!(
        "\nLicense state: {}",
        if state.is_valid() { "Valid" } else { "Invalid" }
    );

    let license = validator.license();
    println!("\nCreation date:    {}", license.created_at());
    if let Some(date) = license.start_date() {
        println!("Start date:       {date}");
    }
    if let Some(date) = license.expiration_date() {
        println!("Expiration date:  {date}");
    }
    if let Some(millis) = license.floating_expiry() {
        println!("Expires {} seconds after first use", millis / 1000);
    }
    if let Some(remaining) = validator.time_remaining(now) {
        println!("Time remaining:   {} seconds", remaining.num_seconds());
    }

    println!("\nLicense properties:");
    if license.properties().is_empty() {
        println!("  none");
    }
    for (key, value) in license.properties() {
        println!("  {key} = {value}");
    }

    for address in license.hardware_addresses() {
        println!("Hardware lock: {address}");
    }
    println!();

    Ok(if state.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
