use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;

use roster_sync::config::{credentials_from_env, Config};
use roster_sync::oss::OssSigner;

/// Print the OSS signing headers for a request, for debugging 403 responses.
#[derive(Parser, Debug)]
#[command(name = "sign-request", version, about = "Compute OSS Authorization headers for a request")]
struct Cli {
    /// Object resource, e.g. /jinxing-edu/kt_staff.json
    resource: String,

    /// HTTP method
    #[arg(long, default_value = "PUT")]
    method: String,

    #[arg(long, default_value = "application/json")]
    content_type: String,

    #[arg(long, default_value = "")]
    content_md5: String,

    /// Bucket name (defaults to the configured one)
    #[arg(long)]
    bucket: Option<String>,

    /// Sign at this RFC 2822 time instead of now, to reproduce a captured request
    #[arg(long)]
    at: Option<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Cli::parse();

    let bucket = match args.bucket {
        Some(b) => b,
        None => Config::load(args.config.as_deref())?.oss.bucket,
    };
    if bucket.trim().is_empty() {
        anyhow::bail!("No bucket given; pass --bucket or set OSS_BUCKET");
    }
    let resource = if args.resource.starts_with('/') {
        args.resource
    } else {
        format!("/{}", args.resource)
    };

    let at = match &args.at {
        Some(text) => DateTime::parse_from_rfc2822(text)
            .with_context(|| format!("Invalid --at value '{}'", text))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let signer = OssSigner::new(credentials_from_env()?, bucket);
    let headers = signer.sign_at(&args.method, &resource, &args.content_type, &args.content_md5, at)?;
    let string_to_sign =
        signer.string_to_sign(&args.method, &resource, &args.content_type, &args.content_md5, &headers.date);

    println!("String to sign:");
    println!("{}", string_to_sign.replace('\n', "\\n\n"));
    println!();
    for (name, value) in headers.pairs() {
        println!("{}: {}", name, value);
    }
    Ok(())
}
