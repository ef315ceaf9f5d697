//! CSV / XLS / XLSX complaint sheets.
//!
//! The header row names the columns; `subject`, `complaint`, `location`,
//! `date` and `sender` are picked up case-insensitively and any missing
//! column reads as an empty string.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use triage_core::{Error, Result, StructuredRecord};

/// Column positions of the known fields within a header row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    subject: Option<usize>,
    complaint: Option<usize>,
    location: Option<usize>,
    date: Option<usize>,
    sender: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        let mut map = Self::default();
        for (idx, name) in header.iter().enumerate() {
            let slot = match name.trim_start_matches('\u{feff}').trim().to_lowercase().as_str() {
                "subject" => &mut map.subject,
                "complaint" => &mut map.complaint,
                "location" => &mut map.location,
                "date" => &mut map.date,
                "sender" => &mut map.sender,
                _ => continue,
            };
            // First occurrence wins for duplicated headers.
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        map
    }

    fn record(&self, row: &[String]) -> StructuredRecord {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        StructuredRecord {
            subject: cell(self.subject),
            complaint: cell(self.complaint),
            location: cell(self.location),
            date: cell(self.date),
            sender: cell(self.sender),
        }
    }
}

/// Turn a header plus data rows into records, dropping fully blank rows.
fn records_from_rows<I>(header: &[String], rows: I) -> Vec<StructuredRecord>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let columns = ColumnMap::from_header(header);
    rows.into_iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| columns.record(&row))
        .collect()
}

/// Read a CSV file into structured records.
pub fn read_csv(path: &Path) -> Result<Vec<StructuredRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::Parse(format!("invalid CSV: {}", e)))?;

    let header: Vec<String> = reader
        .byte_headers()
        .map_err(|e| Error::Parse(format!("invalid CSV header: {}", e)))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| Error::Parse(format!("invalid CSV row: {}", e)))?;
        rows.push(
            record
                .iter()
                .map(|c| String::from_utf8_lossy(c).into_owned())
                .collect(),
        );
    }

    Ok(records_from_rows(&header, rows))
}

/// Read the first worksheet of an XLS/XLSX workbook into structured records.
pub fn read_workbook(path: &Path) -> Result<Vec<StructuredRecord>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Parse(format!("invalid spreadsheet: {}", e)))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(Error::Parse(format!("unreadable worksheet: {}", e))),
        None => return Ok(Vec::new()),
    };

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<String>>());
    let header = match rows.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };

    Ok(records_from_rows(&header, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_columns_default_empty() {
        let header = strings(&["Complaint", "Location"]);
        let rows = vec![strings(&["Drain overflowing near school", "Zone 4"])];
        let records = records_from_rows(&header, rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].complaint, "Drain overflowing near school");
        assert_eq!(records[0].location, "Zone 4");
        assert_eq!(records[0].subject, "");
        assert_eq!(records[0].sender, "");
    }

    #[test]
    fn test_blank_rows_dropped_and_short_rows_padded() {
        let header = strings(&["subject", "complaint", "sender"]);
        let rows = vec![
            strings(&["", "", ""]),
            strings(&["Potholes"]),
        ];
        let records = records_from_rows(&header, rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "Potholes");
        assert_eq!(records[0].complaint, "");
    }

    #[test]
    fn test_read_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        std::fs::write(
            &path,
            "\u{feff}subject,complaint,location,date,sender\n\
             Garbage,\"Garbage has not been collected, residents are suffering\",Zone 2,2025-01-04,Ward Office\n\
             \n\
             Noise,,,,\n",
        )
        .unwrap();

        let records = read_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject, "Garbage");
        assert_eq!(
            records[0].complaint,
            "Garbage has not been collected, residents are suffering"
        );
        assert_eq!(records[0].date, "2025-01-04");
        assert_eq!(records[1].subject, "Noise");
        assert_eq!(records[1].complaint, "");
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::Float(1200.0)), "1200");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::String("Zone 1".into())), "Zone 1");
    }

    #[test]
    fn test_corrupt_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"definitely not a spreadsheet").unwrap();
        assert!(matches!(read_workbook(&path), Err(Error::Parse(_))));
    }
}
