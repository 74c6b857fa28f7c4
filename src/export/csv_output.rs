//! CSV record exporter

use crate::export::{ExportResult, RecordExporter};
use crate::model::DepartmentRecord;
use std::path::Path;

/// Exports records as UTF-8 CSV with a header row
pub struct CsvExporter;

impl RecordExporter for CsvExporter {
    fn export(&self, records: &[DepartmentRecord], path: &Path) -> ExportResult<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(DepartmentRecord::columns())?;
        for record in records {
            writer.write_record(record.to_row())?;
        }

        writer.flush()?;
        Ok(())
    }
}
