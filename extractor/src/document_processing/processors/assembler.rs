// Content assembler: builds the text blobs sent to the model

use tracing::warn;

use crate::document_processing::schemas::{TableCandidate, PAGE_SEPARATOR};

/// Which blob to send to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStrategy {
    /// Rendered relevant tables only.
    TablesOnly,
    /// Page text with the relevant tables placed after their page.
    FullText,
}

impl InputStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputStrategy::TablesOnly => "tables-only",
            InputStrategy::FullText => "full-text",
        }
    }
}

/// Assembles page texts and filtered tables into prompt content.
#[derive(Debug, Clone)]
pub struct ContentAssembler {
    max_chars: usize,
}

impl ContentAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Page text first, then every table of that page, page by page.
    pub fn assemble_full_text(&self, pages: &[String], tables: &[TableCandidate]) -> String {
        let blob = pages
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                let page_number = idx + 1;
                let mut section = format!("Page {}\n{}\n", page_number, text);
                for (table_idx, table) in tables
                    .iter()
                    .filter(|table| table.page == page_number)
                    .enumerate()
                {
                    section.push_str(&format!(
                        "\nTable {} on Page {}\n{}\n",
                        table_idx + 1,
                        page_number,
                        table.render()
                    ));
                }
                section
            })
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        self.bounded(blob)
    }

    /// Rendered tables only, separated by blank lines.
    pub fn assemble_tables_only(&self, tables: &[TableCandidate]) -> String {
        let blob = tables
            .iter()
            .map(TableCandidate::render)
            .collect::<Vec<_>>()
            .join("\n\n");

        self.bounded(blob)
    }

    pub fn assemble(
        &self,
        strategy: InputStrategy,
        pages: &[String],
        tables: &[TableCandidate],
    ) -> String {
        match strategy {
            InputStrategy::TablesOnly => self.assemble_tables_only(tables),
            InputStrategy::FullText => self.assemble_full_text(pages, tables),
        }
    }

    fn bounded(&self, blob: String) -> String {
        let total = blob.chars().count();
        if total <= self.max_chars {
            return blob;
        }

        warn!(
            chars = total,
            limit = self.max_chars,
            "content exceeds prompt limit, truncating"
        );
        blob.chars().take(self.max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant_table(page: usize) -> TableCandidate {
        TableCandidate::new(
            page,
            vec!["Asset".into(), "Tenant".into()],
            vec![vec!["Cholet".into(), "Perrenot".into()]],
        )
    }

    #[test]
    fn test_tables_follow_their_page() {
        let assembler = ContentAssembler::new(10_000);
        let pages = vec!["intro".to_string(), "schedule".to_string()];
        let blob = assembler.assemble_full_text(&pages, &[tenant_table(2)]);

        let intro = blob.find("intro").unwrap();
        let separator = blob.find(PAGE_SEPARATOR).unwrap();
        let schedule = blob.find("schedule").unwrap();
        let table = blob.find("Table 1 on Page 2").unwrap();
        let cell = blob.find("Perrenot").unwrap();

        assert!(intro < separator);
        assert!(separator < schedule);
        assert!(schedule < table);
        assert!(table < cell);
    }

    #[test]
    fn test_tables_only_blob_has_every_cell() {
        let assembler = ContentAssembler::new(10_000);
        let blob = assembler.assemble_tables_only(&[tenant_table(1), tenant_table(4)]);
        assert_eq!(blob.matches("Perrenot").count(), 2);
        assert!(!blob.contains("Page"));
    }

    #[test]
    fn test_no_tables_gives_empty_tables_blob() {
        let assembler = ContentAssembler::new(10_000);
        assert!(assembler.assemble_tables_only(&[]).is_empty());
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let assembler = ContentAssembler::new(4);
        let pages = vec!["Béziers".to_string()];
        let blob = assembler.assemble(InputStrategy::FullText, &pages, &[]);
        assert_eq!(blob, "Page");
    }
}
