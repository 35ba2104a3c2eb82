// Table detection from the text layout of a page
//
// pdf-extract keeps the horizontal spacing of tabular content, so a table
// shows up as a run of consecutive lines whose cells are separated by tabs or
// by two or more spaces. The first line of such a run is taken as the header.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document_processing::schemas::TableCandidate;

/// Minimum number of cells for a line to count as a table row.
const MIN_COLUMNS: usize = 2;

/// Minimum number of lines (header included) for a run to count as a table.
const MIN_LINES: usize = 2;

static CELL_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\t+|\s{2,}").expect("cell split pattern is valid"));

/// Split a line into trimmed, non-empty cells.
pub fn split_cells(line: &str) -> Vec<String> {
    CELL_SPLIT
        .split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Detect every table on one page.
pub fn detect_tables(page: usize, text: &str) -> Vec<TableCandidate> {
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= MIN_COLUMNS {
            run.push(cells);
        } else {
            flush_run(page, &mut run, &mut tables);
        }
    }
    flush_run(page, &mut run, &mut tables);

    tables
}

fn flush_run(page: usize, run: &mut Vec<Vec<String>>, tables: &mut Vec<TableCandidate>) {
    if run.len() < MIN_LINES {
        run.clear();
        return;
    }

    let mut lines = std::mem::take(run).into_iter();
    let Some(mut columns) = lines.next() else {
        return;
    };
    let rows: Vec<Vec<String>> = lines.collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    while columns.len() < width {
        columns.push(format!("Column {}", columns.len() + 1));
    }

    tables.push(TableCandidate::new(page, columns, rows));
}
