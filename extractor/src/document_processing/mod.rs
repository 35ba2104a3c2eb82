// Document Processing Module
//
// This module turns a PDF into the text handed to the extraction model.
//
// Main components:
// - schemas: asset records, table candidates and extracted documents
// - extractors: page text and table detection
// - processors: relevance filtering and prompt content assembly
// - utils: file discovery and output paths
//
// Usage:
//   1. Read a document with a DocumentReader (PdfExtractor for real files)
//   2. Drop irrelevant tables with the RelevanceFilter
//   3. Assemble the tables-only or full-text blob with the ContentAssembler

pub mod extractors;
pub mod processors;
pub mod schemas;
pub mod utils;

// Re-export commonly used types
pub use extractors::{DocumentReader, PdfExtractor};
pub use processors::assembler::InputStrategy;
pub use processors::{ContentAssembler, RelevanceFilter};
pub use utils::{ensure_parent_dir, find_files_by_extension};

use std::path::Path;

use tracing::debug;

use crate::Result;
use schemas::ExtractedDocument;

/// Read a document and keep only the tables that look like asset data.
pub fn load_document(
    reader: &dyn DocumentReader,
    path: impl AsRef<Path>,
    filter: &RelevanceFilter,
) -> Result<ExtractedDocument> {
    let path = path.as_ref();
    let document = reader.read_document(path)?;

    let detected = document.tables.len();
    let tables = filter.filter(document.tables);
    debug!(
        path = %path.display(),
        detected,
        relevant = tables.len(),
        "filtered table candidates"
    );

    Ok(ExtractedDocument {
        pages: document.pages,
        tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::TableCandidate;
    use crate::ExtractError;

    struct FixedReader;

    impl DocumentReader for FixedReader {
        fn read_text(&self, _path: &Path) -> Result<Vec<String>> {
            Ok(vec!["Rent roll".to_string()])
        }

        fn read_tables(&self, _path: &Path) -> Result<Vec<TableCandidate>> {
            Ok(vec![
                TableCandidate::new(1, vec!["Tenant".into()], vec![vec!["Acme".into()]]),
                TableCandidate::new(1, vec!["Year".into()], vec![vec!["2020".into()]]),
            ])
        }
    }

    struct BrokenReader;

    impl DocumentReader for BrokenReader {
        fn read_text(&self, path: &Path) -> Result<Vec<String>> {
            Err(ExtractError::DocumentUnreadable {
                path: path.to_path_buf(),
                reason: "corrupt".to_string(),
            })
        }

        fn read_tables(&self, _path: &Path) -> Result<Vec<TableCandidate>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_load_document_filters_tables() {
        let doc = load_document(&FixedReader, "a.pdf", &RelevanceFilter::default()).unwrap();
        assert_eq!(doc.pages, vec!["Rent roll"]);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].columns, vec!["Tenant"]);
    }

    #[test]
    fn test_load_document_propagates_unreadable() {
        let err = load_document(&BrokenReader, "a.pdf", &RelevanceFilter::default()).unwrap_err();
        assert!(matches!(err, ExtractError::DocumentUnreadable { .. }));
    }
}
