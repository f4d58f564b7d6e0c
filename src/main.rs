// src/main.rs
use clap::{Parser, Subcommand};
use fund_facts::extractors::{extract_fee_schedules, extract_performance};
use fund_facts::storage::{RunSummary, StorageManager};
use fund_facts::utils::logging::setup_logging;
use fund_facts::{AppError, HighlightsBatch, IdentityMap, InlineDocument, SatisfiedSet};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Command Line Interface for fund filing fact extraction
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output directory for extracted records
    #[arg(short, long, env = "FUND_FACTS_OUTPUT_DIR", default_value = "./output", global = true)]
    output_dir: PathBuf,

    /// Verbose logging (debug level) unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the series/class/ticker identity map of an SGML header
    Header {
        /// Header file (the SEC-HEADER block of a submission)
        file: PathBuf,
    },

    /// Reconcile Financial Highlights tables against header identities
    Highlights {
        /// Header file(s) supplying the identity map, most authoritative first
        #[arg(long = "header", required = true)]
        headers: Vec<PathBuf>,

        /// Filing documents, in processing order (earlier wins)
        #[arg(required = true)]
        documents: Vec<PathBuf>,

        /// Maximum number of documents to scan
        #[arg(long, env = "FUND_FACTS_MAX_FILINGS", default_value_t = 10)]
        max_filings: usize,

        /// Only keep these class ids; scanning stops once all are satisfied
        #[arg(long = "class-id")]
        class_ids: Vec<String>,
    },

    /// Print the fee schedules of an inline XBRL prospectus
    Fees {
        document: PathBuf,
    },

    /// Print per-class performance facts of an inline XBRL shareholder report
    Performance {
        document: PathBuf,
    },

    /// Print one normalized fact value
    Fact {
        document: PathBuf,

        /// Tag name, e.g. rr:ManagementFeesOverAssets
        #[arg(long)]
        tag: String,

        /// Context id the fact is reported in
        #[arg(long)]
        context: String,

        /// Store negative magnitudes as positive (fee waivers, redemption fees)
        #[arg(long)]
        negate: bool,
    },
}

fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (RUST_LOG wins over --verbose)
    setup_logging(if args.verbose { "debug" } else { "info" });
    tracing::debug!("Starting with args: {:?}", args);

    // 3. Dispatch
    match args.command {
        Command::Header { file } => {
            let identities = IdentityMap::from_header(&read_document(&file)?);
            print_json(&identities)
        }
        Command::Highlights { headers, documents, max_filings, class_ids } => {
            run_highlights(&args.output_dir, &headers, &documents, max_filings, class_ids)
        }
        Command::Fees { document } => {
            let document = InlineDocument::parse(&read_document(&document)?);
            let schedules = extract_fee_schedules(&document);
            let storage = StorageManager::new(&args.output_dir)?;
            for schedule in &schedules {
                storage.save_fee_schedule(schedule)?;
            }
            print_json(&schedules)
        }
        Command::Performance { document } => {
            let document = InlineDocument::parse(&read_document(&document)?);
            let records = extract_performance(&document);
            let storage = StorageManager::new(&args.output_dir)?;
            for record in &records {
                storage.save_performance(record)?;
            }
            print_json(&records)
        }
        Command::Fact { document, tag, context, negate } => {
            let document = InlineDocument::parse(&read_document(&document)?);
            let value = document.extract(&tag, &context, negate);
            if value.is_none() {
                tracing::warn!("No value for {} in context {}", tag, context);
            }
            print_json(&value)
        }
    }
}

fn run_highlights(
    output_dir: &Path,
    headers: &[PathBuf],
    documents: &[PathBuf],
    max_filings: usize,
    class_ids: Vec<String>,
) -> Result<(), AppError> {
    // 1. Build the identity map; earlier headers take precedence
    let mut identities = IdentityMap::default();
    for header in headers {
        identities.merge(IdentityMap::from_header(&read_document(header)?));
    }
    if identities.is_empty() {
        return Err(AppError::Config("No series or classes found in the header file(s)".to_string()));
    }

    // 2. Initialize storage
    let storage = StorageManager::new(output_dir)?;

    // 3. Scan documents in the given order
    let needed: HashSet<String> = class_ids.into_iter().collect();
    let mut satisfied = SatisfiedSet::new();
    let mut batch = HighlightsBatch::new(&identities, &mut satisfied);
    if !needed.is_empty() {
        batch = batch.with_needed(needed.iter().cloned());
    }

    let mut records_written = 0;
    let mut failure_count = 0;

    for path in documents.iter().take(max_filings) {
        if batch.is_complete() {
            tracing::info!("All requested class ids satisfied after {} document(s)", batch.documents_processed());
            break;
        }

        let html = match read_document(path) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", path.display(), e);
                failure_count += 1;
                continue;
            }
        };

        tracing::info!("Processing {}", path.display());
        for highlights in batch.process_document(&html) {
            match storage.save_highlights(&highlights) {
                Ok(_) => records_written += 1,
                Err(e) => tracing::error!("Failed to save highlights for {}: {}", highlights.class_id, e),
            }
        }
    }

    let documents_processed = batch.documents_processed();

    // 4. Summarize the run
    let summary = RunSummary {
        documents_processed,
        records_written,
        classes_remaining: satisfied.remaining(&needed).into_iter().map(str::to_string).collect(),
    };
    storage.save_run_summary(&summary)?;

    tracing::info!(
        "Processing finished. Documents: {}, records: {}, read failures: {}",
        documents_processed,
        records_written,
        failure_count
    );

    if records_written == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "No highlights extracted; {} document(s) could not be read",
            failure_count
        )));
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<String, AppError> {
    let bytes = fs::read(path)?;
    // Older filings are often Latin-1; keep going on stray bytes
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| AppError::Processing(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
