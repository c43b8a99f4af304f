use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use roster_sync::app::cleanup_use_case::{CleanupReport, CleanupUseCase};
use roster_sync::app::extract_use_case::{ExtractUseCase, SheetSelection};
use roster_sync::app::publish_use_case::{BatchSettings, PublishUseCase};
use roster_sync::config::{credentials_from_env, Config};
use roster_sync::constants::{AUTHORIZED_PHONES_KEY, STAFF_KEY, STUDENTS_KEY};
use roster_sync::document::{read_document, write_document};
use roster_sync::infra::{CalamineWorkbook, ReqwestHttp};
use roster_sync::logging;
use roster_sync::metrics::{init_metrics, write_snapshot};
use roster_sync::normalize::authorized_phones;
use roster_sync::oss::{OssSigner, PublishReport, UploadOutcome};
use roster_sync::types::{StaffRecord, StudentRecord};

#[derive(Parser)]
#[command(name = "roster_sync")]
#[command(about = "Kindergarten roster extraction and OSS publishing")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML config file (defaults to roster.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write a Prometheus text snapshot of the run's counters to this file
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the staff contact workbook into a JSON document
    ExtractStaff {
        /// Staff workbook (.xlsx)
        input: PathBuf,
        /// Output document (defaults to <output_dir>/kt_staff.json)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Zero-based index of the header row
        #[arg(long)]
        header_row: Option<usize>,
        /// Read this sheet instead of the first one
        #[arg(long, conflicts_with = "all_sheets")]
        sheet: Option<String>,
        /// Read every sheet
        #[arg(long)]
        all_sheets: bool,
    },
    /// Extract the student workbook (one class per sheet) into a JSON document
    ExtractStudents {
        /// Student workbook (.xlsx)
        input: PathBuf,
        /// Output document (defaults to <output_dir>/kt_students.json)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Zero-based index of the header row
        #[arg(long)]
        header_row: Option<usize>,
    },
    /// Derive the login allow-list from extracted staff and student documents
    AuthorizedPhones {
        #[arg(long)]
        staff: PathBuf,
        #[arg(long)]
        students: PathBuf,
        /// Output document (defaults to <output_dir>/kt_authorized_phones.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print each sheet's size and first rows
    Inspect {
        input: PathBuf,
        /// Rows to preview per sheet
        #[arg(long, default_value_t = 3)]
        rows: usize,
    },
    /// Upload a JSON document to the bucket (full-object replace)
    Upload {
        /// Document to upload
        input: PathBuf,
        /// Object key without prefix or extension (defaults to the file stem)
        #[arg(long)]
        key: Option<String>,
        /// Split arrays longer than this into part objects plus an index
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Delete a dataset's objects (main document, parts and index) from the bucket
    Clean {
        /// Object key without prefix or extension, e.g. kt_staff
        key: String,
    },
    /// Extract both workbooks, derive the phone allow-list and upload all three documents
    Import {
        #[arg(long)]
        staff: PathBuf,
        #[arg(long)]
        students: PathBuf,
        /// Only write the local documents
        #[arg(long)]
        skip_upload: bool,
        /// Delete each dataset's previous objects before uploading
        #[arg(long, conflicts_with = "skip_upload")]
        clean: bool,
    },
}

fn output_path(explicit: Option<PathBuf>, config: &Config, key: &str) -> PathBuf {
    explicit.unwrap_or_else(|| config.extract.output_dir.join(format!("{}.json", key)))
}

fn open_workbook(path: &Path) -> Result<ExtractUseCase> {
    let workbook = CalamineWorkbook::open(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    Ok(ExtractUseCase::new(Box::new(workbook)))
}

fn extract_staff(
    config: &Config,
    input: &Path,
    header_row: Option<usize>,
    selection: &SheetSelection,
) -> Result<Vec<StaffRecord>> {
    let header_row = header_row.unwrap_or(config.extract.staff_header_row);
    let records = open_workbook(input)?
        .extract_staff(header_row, selection)
        .with_context(|| format!("Failed to extract staff from {}", input.display()))?;
    Ok(records)
}

fn extract_students(config: &Config, input: &Path, header_row: Option<usize>) -> Result<Vec<StudentRecord>> {
    let header_row = header_row.unwrap_or(config.extract.student_header_row);
    let records = open_workbook(input)?
        .extract_students(header_row)
        .with_context(|| format!("Failed to extract students from {}", input.display()))?;
    Ok(records)
}

fn build_http(config: &Config) -> Result<(ReqwestHttp, OssSigner)> {
    config.oss.validate()?;
    let credentials = credentials_from_env()?;
    let http = ReqwestHttp::new(config.oss.timeout()).context("Failed to build HTTP client")?;
    Ok((http, OssSigner::new(credentials, config.oss.bucket.clone())))
}

fn build_publisher(config: &Config, batch_size: Option<usize>) -> Result<PublishUseCase> {
    let (http, signer) = build_http(config)?;
    let publisher = PublishUseCase::new(
        Box::new(http),
        signer,
        config.oss.endpoint(),
        config.oss.prefix.clone(),
    )
    .with_batching(BatchSettings {
        batch_size: batch_size.or(config.oss.batch_size).unwrap_or(0),
        delay: config.oss.batch_delay(),
    });
    Ok(publisher)
}

fn build_cleanup(config: &Config) -> Result<CleanupUseCase> {
    let (http, signer) = build_http(config)?;
    Ok(CleanupUseCase::new(
        Box::new(http),
        signer,
        config.oss.endpoint(),
        config.oss.prefix.clone(),
    ))
}

fn print_cleanup(key: &str, report: &CleanupReport) {
    for object in &report.deleted {
        println!("   🗑️  {}", object);
    }
    for (object, reason) in &report.failed {
        println!("   ❌ {} not deleted: {}", object, reason);
    }
    println!("🧹 {}: {} objects deleted", key, report.deleted.len());
}

fn print_report(key: &str, report: &PublishReport) {
    for outcome in report.outcomes() {
        match outcome {
            UploadOutcome::Uploaded { url, status } => {
                println!("   ✅ {} (status {})", url, status);
            }
            UploadOutcome::Rejected { url, status, body } => {
                println!("   ❌ {} rejected with status {}", url, status);
                if !body.is_empty() {
                    println!("      {}", body);
                }
            }
            UploadOutcome::TransportFailed { url, message } => {
                println!("   ❌ {} failed: {}", url, message);
            }
        }
    }
    if report.is_success() {
        println!("✅ Uploaded {}", key);
    } else {
        println!("❌ Upload of {} failed, check the configuration and credentials", key);
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = Config::load(cli.config.as_deref())?;
    let metrics = cli.metrics_out.as_ref().and_then(|_| init_metrics());

    let ok = run_command(cli.command, &config)?;
    if let (Some(handle), Some(path)) = (&metrics, &cli.metrics_out) {
        write_snapshot(handle, path)?;
    }
    Ok(ok)
}

fn run_command(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::ExtractStaff {
            input,
            output,
            header_row,
            sheet,
            all_sheets,
        } => {
            println!("📋 Extracting staff from {}", input.display());
            let selection = match (sheet.or_else(|| config.extract.staff_sheet.clone()), all_sheets) {
                (_, true) => SheetSelection::All,
                (Some(name), false) => SheetSelection::Named(name),
                (None, false) => SheetSelection::First,
            };
            let records = extract_staff(config, &input, header_row, &selection)?;
            let path = output_path(output, config, STAFF_KEY);
            write_document(&path, &records)?;

            println!("   Valid staff: {}", records.len());
            for s in &records {
                println!("   {} - {} - {} - {:?}", s.name, s.phone, s.role, s.assigned_classes);
            }
            println!("   Output file: {}", path.display());
        }
        Commands::ExtractStudents {
            input,
            output,
            header_row,
        } => {
            println!("📋 Extracting students from {}", input.display());
            let records = extract_students(config, &input, header_row)?;
            let path = output_path(output, config, STUDENTS_KEY);
            write_document(&path, &records)?;

            println!("   Students: {}", records.len());
            println!("   Output file: {}", path.display());
        }
        Commands::AuthorizedPhones {
            staff,
            students,
            output,
        } => {
            let staff: Vec<StaffRecord> = read_document(&staff)
                .with_context(|| format!("Failed to read {}", staff.display()))?;
            let students: Vec<StudentRecord> = read_document(&students)
                .with_context(|| format!("Failed to read {}", students.display()))?;
            let phones = authorized_phones(&staff, &students);
            let path = output_path(output, config, AUTHORIZED_PHONES_KEY);
            write_document(&path, &phones)?;
            println!("📱 {} authorized phones written to {}", phones.len(), path.display());
        }
        Commands::Inspect { input, rows } => {
            for preview in open_workbook(&input)?.inspect(rows)? {
                println!(
                    "--- Sheet: {} ({} rows x {} columns) ---",
                    preview.name, preview.row_count, preview.column_count
                );
                for row in &preview.rows {
                    println!("{}", serde_json::to_string(row)?);
                }
                println!();
            }
        }
        Commands::Upload {
            input,
            key,
            batch_size,
        } => {
            let key = match key {
                Some(k) => k,
                None => input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("Cannot derive a key from {}", input.display()))?,
            };
            let document: Value = read_document(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            if let Value::Array(items) = &document {
                println!("📤 Uploading {} records as {}...", items.len(), key);
            } else {
                println!("📤 Uploading {}...", key);
            }

            let publisher = build_publisher(config, batch_size)?;
            let report = publisher.publish_document(&key, &document)?;
            print_report(&key, &report);
            return Ok(report.is_success());
        }
        Commands::Clean { key } => {
            let report = build_cleanup(config)?.remove_dataset(&key)?;
            print_cleanup(&key, &report);
            return Ok(report.is_success());
        }
        Commands::Import {
            staff,
            students,
            skip_upload,
            clean,
        } => {
            println!("🚀 Importing rosters");
            let selection = config
                .extract
                .staff_sheet
                .clone()
                .map(SheetSelection::Named)
                .unwrap_or_default();
            let staff = extract_staff(config, &staff, None, &selection)?;
            let students = extract_students(config, &students, None)?;
            let phones = authorized_phones(&staff, &students);
            println!(
                "📊 Staff: {}, students: {}, authorized phones: {}",
                staff.len(),
                students.len(),
                phones.len()
            );

            let documents = [
                (STUDENTS_KEY, serde_json::to_value(&students)?),
                (STAFF_KEY, serde_json::to_value(&staff)?),
                (AUTHORIZED_PHONES_KEY, serde_json::to_value(&phones)?),
            ];
            for (key, document) in &documents {
                write_document(&output_path(None, config, key), document)?;
            }
            if skip_upload {
                println!("⏭️  Upload skipped; documents are in {}", config.extract.output_dir.display());
                return Ok(true);
            }

            if clean {
                let cleanup = build_cleanup(config)?;
                for (key, _) in &documents {
                    // Cleanup failures do not abort the import
                    match cleanup.remove_dataset(key) {
                        Ok(report) => print_cleanup(key, &report),
                        Err(e) => {
                            warn!("Cleanup of {} failed, continuing: {}", key, e);
                            println!("⚠️  Could not clean {}: {}", key, e);
                        }
                    }
                }
            }

            let publisher = build_publisher(config, None)?;
            let mut all_ok = true;
            for (key, document) in &documents {
                println!("\n📤 Uploading {}...", key);
                let report = publisher.publish_document(key, document)?;
                print_report(key, &report);
                all_ok &= report.is_success();
            }
            if all_ok {
                println!("\n✅ Import complete");
            }
            return Ok(all_ok);
        }
    }
    Ok(true)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let log_guard = logging::init_logging();

    let cli = Cli::parse();
    if !run(cli)? {
        error!("One or more bucket operations failed");
        // process::exit skips destructors; flush the file log first
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
