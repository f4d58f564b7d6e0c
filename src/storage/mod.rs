// src/storage/mod.rs
use crate::edgar::models::{FeeSchedule, PerformanceRecord, ReconciledHighlights};
use crate::utils::error::StorageError;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Counts reported at the end of a `highlights` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub documents_processed: usize,
    pub records_written: usize,
    pub classes_remaining: Vec<String>,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn save_highlights(&self, highlights: &ReconciledHighlights) -> Result<PathBuf, StorageError> {
        self.save_record(&highlights.class_id, highlights.record.fiscal_year_end, "highlights", highlights)
    }

    pub fn save_fee_schedule(&self, schedule: &FeeSchedule) -> Result<PathBuf, StorageError> {
        self.save_record(&schedule.class_id, schedule.effective_date, "fees", schedule)
    }

    pub fn save_performance(&self, record: &PerformanceRecord) -> Result<PathBuf, StorageError> {
        self.save_record(&record.class_id, Some(record.fiscal_year_end), "performance", record)
    }

    /// Writes `record` as pretty JSON to `<base>/<CLASS_ID>/<period|undated>_<kind>.json`.
    /// An existing file for the same class, period and kind is replaced.
    pub fn save_record<T: Serialize>(
        &self,
        class_id: &str,
        period: Option<NaiveDate>,
        kind: &str,
        record: &T,
    ) -> Result<PathBuf, StorageError> {
        // Create a directory structure like: /base_dir/CLASS_ID/
        let target_dir = self.base_dir.join(class_id.to_uppercase());
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let period = period.map_or_else(|| "undated".to_string(), |date| date.format("%Y-%m-%d").to_string());
        let file_path = target_dir.join(format!("{}_{}.json", period, kind));

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} record to {}", kind, file_path.display());
        Ok(file_path)
    }

    /// Saves the run summary with an extraction timestamp.
    pub fn save_run_summary(&self, summary: &RunSummary) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join("run_summary.json");

        let metadata = serde_json::json!({
            "documents_processed": summary.documents_processed,
            "records_written": summary.records_written,
            "classes_remaining": summary.classes_remaining,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved run summary to {}", file_path.display());
        Ok(file_path)
    }
}
