// extractor/src/export.rs
//! Spreadsheet and JSONL output of the consolidated records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::info;

use crate::document_processing::ensure_parent_dir;
use crate::schemas::{AssetField, AssetRecord, FieldValue};
use crate::{ExtractError, Result};

const SHEET_NAME: &str = "Assets";

fn export_error(err: XlsxError) -> ExtractError {
    ExtractError::Export(err.to_string())
}

/// Write one worksheet: a header row in canonical field order, then one row
/// per record. Absent fields stay empty.
pub fn write_xlsx(records: &[AssetRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(export_error)?;

    for (col, field) in AssetField::ALL.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, field.as_str(), &header_format)
            .map_err(export_error)?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, field) in AssetField::ALL.iter().enumerate() {
            let col = col as u16;
            match record.get(*field) {
                Some(value @ FieldValue::Number(_)) => {
                    let number = value.as_f64().ok_or_else(|| {
                        ExtractError::Export(format!("{} is not representable", value))
                    })?;
                    worksheet.write_number(row, col, number).map_err(export_error)?;
                }
                Some(FieldValue::Text(text)) => {
                    worksheet.write_string(row, col, text).map_err(export_error)?;
                }
                None => {}
            }
        }
    }

    workbook.save(path).map_err(export_error)?;
    info!(path = %path.display(), records = records.len(), "wrote workbook");
    Ok(())
}

/// Write one JSON object per line with canonical keys.
pub fn write_jsonl(records: &[AssetRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .map_err(|err| ExtractError::Export(err.to_string()))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    info!(path = %path.display(), records = records.len(), "wrote jsonl");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn records() -> Vec<AssetRecord> {
        vec![
            AssetRecord::new()
                .with(AssetField::AssetName, "Unit A")
                .with(AssetField::Filename, "lease1.pdf")
                .with(AssetField::Gla, 1200_i64),
            AssetRecord::new()
                .with(AssetField::AssetName, "Unit B")
                .with(AssetField::Tenant, "Acme"),
        ]
    }

    #[test]
    fn test_write_xlsx_creates_parent_dirs() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("out").join("extracted.xlsx");

        write_xlsx(&records(), &path)?;

        let bytes = fs::read(&path)?;
        assert!(bytes.starts_with(b"PK"), "xlsx is a zip container");
        Ok(())
    }

    #[test]
    fn test_write_xlsx_with_no_records_still_writes_header() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("empty.xlsx");
        write_xlsx(&[], &path)?;
        assert!(fs::metadata(&path)?.len() > 0);
        Ok(())
    }

    #[test]
    fn test_write_jsonl_one_line_per_record() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("records.jsonl");

        write_jsonl(&records(), &path)?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"Asset Name":"Unit A","Filename":"lease1.pdf","GLA (Gross Leasable Area)":1200}"#
        );
        assert_eq!(lines[1], r#"{"Asset Name":"Unit B","Tenant":"Acme"}"#);
        Ok(())
    }
}
