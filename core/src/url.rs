//! Joining the configured base URL with request paths.

use crate::error::ApiError;

/// Combine `base` and `path` with exactly one slash between them.
///
/// A trailing slash on `base` is dropped and `path` always ends up with a
/// single leading slash. Fails when `base` is empty.
pub fn join_url(base: &str, path: &str) -> Result<String, ApiError> {
    if base.trim().is_empty() {
        return Err(ApiError::Config("cannot build a request URL without a base".to_string()));
    }
    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.trim_start_matches('/');
    Ok(format!("{base}/{path}"))
}
