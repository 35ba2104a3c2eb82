// File utilities for document processing

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::Result;

/// Find all files with a specific extension directly inside a directory
///
/// The match is case-insensitive and the result is sorted by file name so
/// batches run in a stable order.
pub fn find_files_by_extension(base_dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let base_dir = base_dir.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Create the parent directory of an output file if it doesn't exist
pub fn ensure_parent_dir(output_path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = output_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_find_files_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        File::create(base.join("b.pdf")).unwrap();
        File::create(base.join("a.PDF")).unwrap();
        File::create(base.join("notes.txt")).unwrap();
        fs::create_dir(base.join("nested")).unwrap();
        File::create(base.join("nested").join("c.pdf")).unwrap();

        let pdf_files = find_files_by_extension(base, "pdf").unwrap();
        let names: Vec<_> = pdf_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_files_by_extension(temp_dir.path().join("nope"), "pdf").is_err());
    }

    #[test]
    fn test_ensure_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out").join("extracted.xlsx");
        ensure_parent_dir(&output).unwrap();
        assert!(temp_dir.path().join("out").is_dir());
    }
}
