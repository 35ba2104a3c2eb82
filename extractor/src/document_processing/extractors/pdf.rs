// PDF extraction module
// Page text comes from pdf-extract; tables are detected from the page layout

use std::panic;
use std::path::Path;

use once_cell::sync::Lazy;
use pdf_extract::extract_text_by_pages;
use regex::Regex;
use tracing::{debug, info};

use crate::document_processing::extractors::{tables, DocumentReader};
use crate::document_processing::schemas::{ExtractedDocument, TableCandidate};
use crate::{ExtractError, Result};

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"));
static PAGE_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,4}\s*$").expect("page number pattern is valid"));

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract page texts and table candidates from a PDF file
    pub fn extract(pdf_path: impl AsRef<Path>) -> Result<ExtractedDocument> {
        let pdf_path = pdf_path.as_ref();

        let raw_pages = Self::extract_pages(pdf_path)?;

        let pages: Vec<String> = raw_pages
            .iter()
            .map(|page| Self::auto_clean_text(page))
            .collect();

        let tables: Vec<TableCandidate> = pages
            .iter()
            .enumerate()
            .flat_map(|(idx, text)| tables::detect_tables(idx + 1, text))
            .collect();

        info!(
            path = %pdf_path.display(),
            pages = pages.len(),
            tables = tables.len(),
            "extracted pdf content"
        );

        Ok(ExtractedDocument { pages, tables })
    }

    fn extract_pages(pdf_path: &Path) -> Result<Vec<String>> {
        let unreadable = |reason: String| ExtractError::DocumentUnreadable {
            path: pdf_path.to_path_buf(),
            reason,
        };

        // pdf-extract panics on some malformed font programs.
        match panic::catch_unwind(|| extract_text_by_pages(pdf_path)) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(err)) => Err(unreadable(err.to_string())),
            Err(_) => Err(unreadable("pdf parser panicked".to_string())),
        }
    }

    /// Clean one page of extracted text.
    ///
    /// Trailing whitespace, bare page-number lines and runs of blank lines are
    /// removed. Leading and inner spacing is kept because table detection
    /// depends on it.
    fn auto_clean_text(text: &str) -> String {
        let cleaned = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !PAGE_NUMBER_LINE.is_match(line))
            .collect::<Vec<_>>()
            .join("\n");

        let cleaned = EXCESS_NEWLINES.replace_all(&cleaned, "\n\n");
        let cleaned = cleaned.trim_matches('\n').to_string();
        debug!(chars = cleaned.len(), "cleaned page text");
        cleaned
    }
}

impl DocumentReader for PdfExtractor {
    fn read_text(&self, path: &Path) -> Result<Vec<String>> {
        Self::extract(path).map(|doc| doc.pages)
    }

    fn read_tables(&self, path: &Path) -> Result<Vec<TableCandidate>> {
        Self::extract(path).map(|doc| doc.tables)
    }

    fn read_document(&self, path: &Path) -> Result<ExtractedDocument> {
        Self::extract(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_auto_clean_text() {
        let input = "Asset   Tenant   \n\n\n\n12\nCholet   Perrenot\n\n";
        let cleaned = PdfExtractor::auto_clean_text(input);
        assert_eq!(cleaned, "Asset   Tenant\n\nCholet   Perrenot");
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.pdf");

        let err = PdfExtractor::new().read_document(&path).unwrap_err();
        assert!(matches!(err, ExtractError::DocumentUnreadable { .. }));
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("garbage.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let err = PdfExtractor::extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::DocumentUnreadable { .. }));
    }
}
