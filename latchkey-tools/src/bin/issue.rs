//! License issuer.
//!
//! Builds a license from command-line terms, signs it with the vendor's
//! key pair, and writes it to a file or standard output. Dates are
//! accepted either as raw milliseconds since the epoch or as
//! `YYYY/MM/DD`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use latchkey::{export_license, export_license_to, import_key_pair, License, LicenseSigner};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "latchkey-issue")]
#[command(about = "Issue and sign a license")]
struct Args {
    /// Key pair file used to sign the license
    #[arg(short, long)]
    key: PathBuf,

    /// Output license file
    #[arg(short, long, required_unless_present = "stdout", conflicts_with = "stdout")]
    out: Option<PathBuf>,

    /// Write the license to standard output instead of a file
    #[arg(short = 'O', long)]
    stdout: bool,

    /// Start of the validity window (ms since epoch or YYYY/MM/DD);
    /// defaults to the creation date
    #[arg(short, long)]
    start: Option<String>,

    /// Expiration date (ms since epoch or YYYY/MM/DD); omit for a
    /// perpetual license
    #[arg(short, long)]
    expires: Option<String>,

    /// Expire this many milliseconds after the first validated use
    #[arg(short = 'x', long, value_name = "MS")]
    float_ms: Option<i64>,

    /// License property (repeatable)
    #[arg(short, long = "property", value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// Hardware address to lock the license to (repeatable)
    #[arg(short = 'H', long = "hardware", value_name = "ADDR")]
    hardware: Vec<String>,

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

    let pair = import_key_pair(&args.key)
        .with_context(|| format!("reading key pair {}", args.key.display()))?;

    let mut license = License::new();
    if let Some(raw) = &args.start {
        license.set_start_date(parse_date(raw).context("invalid start date")?);
    }
    if let Some(raw) = &args.expires {
        license.set_expiration_date(parse_date(raw).context("invalid expiration date")?);
    }
    if let Some(millis) = args.float_ms {
        license.set_floating_expiry(millis);
    }
    for raw in &args.properties {
        let (key, value) = parse_property(raw)?;
        license.add_property(key, value);
    }
    for address in &args.hardware {
        license.add_hardware_address(address);
    }

    LicenseSigner::new(pair.signing_key).sign(&mut license);
    debug!("license signed with {}", args.key.display());

    if args.stdout {
        let mut stdout = std::io::stdout().lock();
        export_license_to(&license, &mut stdout).context("writing license to stdout")?;
        stdout.flush()?;
    } else if let Some(path) = &args.out {
        export_license(&license, path)
            .with_context(|| format!("writing license to {}", path.display()))?;
        println!("License written to {}", path.display());
    }

    Ok(())
}

/// Parses a date given as milliseconds since the epoch or `YYYY/MM/DD`
/// (interpreted as midnight UTC).
fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .with_context(|| format!("timestamp out of range: {millis}"));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y/%m/%d")
        .with_context(|| format!("expected ms since epoch or YYYY/MM/DD, got {raw:?}"))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

fn parse_property(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("property must be key=value, got {raw:?}");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("property key is empty in {raw:?}");
    }
    Ok((key.to_string(), value.trim().to_string()))
}
