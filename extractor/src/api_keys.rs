// extractor/src/api_keys.rs
//!
//! API key loading for the extraction service
//!
//! The key lives in a local file holding nothing but the key itself. It is
//! read once at startup and handed to the model adapter explicitly.

use std::fs;
use std::path::Path;

use crate::{ExtractError, Result};

/// Load the API key stored in `path`, trimmed of surrounding whitespace.
pub fn load_api_key(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let credentials_error = |reason: String| ExtractError::Credentials {
        path: path.to_path_buf(),
        reason,
    };

    let contents = fs::read_to_string(path).map_err(|err| credentials_error(err.to_string()))?;
    let key = contents.trim();
    if key.is_empty() {
        return Err(credentials_error("file is empty".to_string()));
    }

    Ok(key.to_string())
}

/// Masked form of a key that is safe to log.
pub fn redact(api_key: &str) -> String {
    let visible: String = api_key.chars().take(4).collect();
    format!("{}…", visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_api_key_trims_whitespace() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "  sk-test-123  ")?;

        assert_eq!(load_api_key(file.path())?, "sk-test-123");
        Ok(())
    }

    #[test]
    fn test_empty_key_file_is_rejected() -> anyhow::Result<()> {
        let file = NamedTempFile::new()?;
        let err = load_api_key(file.path()).unwrap_err();
        assert!(matches!(err, ExtractError::Credentials { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_key_file_is_rejected() {
        let err = load_api_key("/definitely/not/here/api_key.txt").unwrap_err();
        assert!(matches!(err, ExtractError::Credentials { .. }));
    }

    #[test]
    fn test_redact_hides_most_of_the_key() {
        assert_eq!(redact("sk-abcdef"), "sk-a…");
    }
}
