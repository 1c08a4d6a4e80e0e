use super::Acquired;
use crate::error::SourceError;
use std::path::Path;

/// Accepts an existing file or directory.
pub(super) fn acquire(path: &Path) -> Result<Acquired, SourceError> {
    if path.is_file() || path.is_dir() {
        Ok(Acquired::path(path.to_path_buf()))
    } else {
        Err(SourceError::PathNotFound(path.to_path_buf()))
    }
}
