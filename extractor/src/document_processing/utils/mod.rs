// Utility functions for document processing

pub mod file_utils;

pub use file_utils::{ensure_parent_dir, find_files_by_extension};
