//! Export of accumulated records to a tabular file
//!
//! The export collaborator consumes a run's result sequence and writes a
//! flat table whose column order matches the record's fixed field list.
//! Only the interface is fixed; CSV is the concrete format.

mod csv_output;

pub use csv_output::CsvExporter;

use crate::model::DepartmentRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export file: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Writes a sequence of records to a tabular file
pub trait RecordExporter {
    /// Writes all records, header row first, in fixed column order
    fn export(&self, records: &[DepartmentRecord], path: &Path) -> ExportResult<()>;
}

/// Default export filename for a job
pub fn default_export_filename(job_id: &uuid::Uuid) -> String {
    format!("star_plan_{job_id}.csv")
}
