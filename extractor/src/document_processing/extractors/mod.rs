// Extractors turn a source document into page texts and table candidates

pub mod pdf;
pub mod tables;

pub use pdf::PdfExtractor;

use std::path::Path;

use crate::document_processing::schemas::{ExtractedDocument, TableCandidate};
use crate::Result;

/// Source of page text and tables for one document.
///
/// Implementations fail with `ExtractError::DocumentUnreadable` when the
/// file cannot be opened or parsed.
pub trait DocumentReader {
    /// Page texts in reading order.
    fn read_text(&self, path: &Path) -> Result<Vec<String>>;

    /// Tables found in the document, tagged with their page.
    fn read_tables(&self, path: &Path) -> Result<Vec<TableCandidate>>;

    /// Read text and tables together.
    fn read_document(&self, path: &Path) -> Result<ExtractedDocument> {
        Ok(ExtractedDocument {
            pages: self.read_text(path)?,
            tables: self.read_tables(path)?,
        })
    }
}
