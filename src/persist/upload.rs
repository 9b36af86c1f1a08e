//! Raw checklist uploads (first sheet of an xlsx workbook, or a CSV file)

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use csv::ReaderBuilder;

use crate::entities::checklist::{ChecklistTable, UploadError};
use crate::persist::xlsx;

/// Read every record of an upload, header row included
pub fn read_records(path: &Path) -> Result<Vec<Vec<String>>, UploadError> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        let file = File::open(path).map_err(|e| UploadError::Read(e.to_string()))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut records = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| UploadError::Read(format!("row {}: {}", i + 1, e)))?;
            records.push(record.iter().map(str::to_string).collect());
        }
        Ok(records)
    } else {
        let bytes = fs::read(path).map_err(|e| UploadError::Read(e.to_string()))?;
        xlsx::read_first_sheet(&bytes).map_err(UploadError::Read)
    }
}

/// Build a checklist from an upload file
pub fn load_checklist(path: &Path) -> Result<ChecklistTable, UploadError> {
    let records = read_records(path)?;
    let table = ChecklistTable::from_upload(&records)?;
    tracing::info!(path = %path.display(), rows = table.len(), "read checklist upload");
    Ok(table)
}
