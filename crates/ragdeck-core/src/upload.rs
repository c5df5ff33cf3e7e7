//! Client-side checks run before any file leaves the machine.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::UploadConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("No files selected")]
    NoFiles,

    #[error("Too many files: {count} selected, at most {max} allowed")]
    TooManyFiles { count: usize, max: usize },

    #[error("Unsupported file type: {} (allowed: {allowed})", path.display())]
    UnsupportedType { path: PathBuf, allowed: String },
}

/// Validate an upload selection against the configured rules.
///
/// Extensions are compared case-insensitively; a file without an extension
/// is rejected.
pub fn validate_upload(paths: &[PathBuf], config: &UploadConfig) -> Result<Vec<PathBuf>, UploadError> {
    if paths.is_empty() {
        return Err(UploadError::NoFiles);
    }
    if paths.len() > config.max_files {
        return Err(UploadError::TooManyFiles {
            count: paths.len(),
            max: config.max_files,
        });
    }

    if let Some(rejected) = paths.iter().find(|p| !is_allowed(p, &config.allowed_extensions)) {
        return Err(UploadError::UnsupportedType {
            path: rejected.clone(),
            allowed: config
                .allowed_extensions
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    Ok(paths.to_vec())
}

fn is_allowed(path: &Path, allowed: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    allowed
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
