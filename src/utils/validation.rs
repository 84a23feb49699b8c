use crate::utils::error::{RelPerfError, Result};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> RelPerfError {
    RelPerfError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// The benchmark database must be reachable over http(s) with a host.
pub fn validate_endpoint(field: &str, endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint)
        .map_err(|e| invalid(field, endpoint, format!("Invalid URL format: {}", e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        "http" | "https" => Err(invalid(field, endpoint, "URL has no host")),
        scheme => Err(invalid(
            field,
            endpoint,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

/// The cache artifact is a single file, so an existing directory is rejected.
pub fn validate_cache_path(field: &str, path: &Path) -> Result<()> {
    let shown = path.display();
    if path.as_os_str().is_empty() {
        return Err(invalid(field, shown, "Path cannot be empty"));
    }
    if path.is_dir() {
        return Err(invalid(field, shown, "Path points to a directory"));
    }
    Ok(())
}

pub fn validate_at_least(field: &str, value: u64, min: u64) -> Result<()> {
    if value < min {
        return Err(invalid(field, value, format!("Value must be at least {}", min)));
    }
    Ok(())
}
