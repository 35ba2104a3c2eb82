// Relevance filter: keeps only tables likely to describe assets

use crate::document_processing::schemas::TableCandidate;

/// Keywords used when the configuration does not provide its own.
pub const DEFAULT_KEYWORDS: [&str; 4] = ["asset name", "asset", "tenant", "rent"];

/// Case-insensitive keyword match on table headers and cells.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { keywords }
    }

    /// True when any header or cell contains any keyword.
    ///
    /// An empty table is never relevant.
    pub fn is_relevant(&self, table: &TableCandidate) -> bool {
        if table.is_empty() {
            return false;
        }

        table
            .columns
            .iter()
            .map(String::as_str)
            .chain(table.cells())
            .any(|text| self.matches(text))
    }

    /// Keep the relevant tables, preserving order.
    pub fn filter(&self, tables: Vec<TableCandidate>) -> Vec<TableCandidate> {
        tables
            .into_iter()
            .filter(|table| self.is_relevant(table))
            .collect()
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|keyword| text.contains(keyword.as_str()))
    }
}
