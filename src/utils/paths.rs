//! Path Utilities
//!
//! Default locations for site workspaces and configuration, plus the
//! domain-relative path checks every store operation goes through.

use std::path::{Component, Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

const APP_DIR: &str = "site-tailor";

/// Default root for domain working directories
/// (`<data dir>/site-tailor/sites`, or `./sites` when no data dir exists).
pub fn default_workspace_root() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("sites"))
        .unwrap_or_else(|| PathBuf::from("sites"))
}

/// Default config file (`<config dir>/site-tailor/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Validate a domain name: a single non-empty path segment.
pub fn validate_domain(domain: &str) -> AppResult<()> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("domain must not be empty"));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(AppError::validation(format!(
            "domain '{}' must be a single directory name",
            domain
        )));
    }
    Ok(())
}

/// Validate a domain-relative file path and return it normalized to
/// forward slashes. Rejects absolute paths and any `..` segment.
pub fn validate_relative_file(file: &str) -> AppResult<String> {
    let trimmed = file.trim().trim_start_matches("./");
    if trimmed.is_empty() {
        return Err(AppError::validation("file name must not be empty"));
    }
    let path = Path::new(trimmed);
    if path.is_absolute() || trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return Err(AppError::validation(format!(
            "file '{}' must be relative to the domain",
            file
        )));
    }
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            _ => {
                return Err(AppError::validation(format!(
                    "file '{}' escapes the domain directory",
                    file
                )))
            }
        }
    }
    if parts.is_empty() {
        return Err(AppError::validation("file name must not be empty"));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_files_are_normalized() {
        assert_eq!(validate_relative_file("./index.html").unwrap(), "index.html");
        assert_eq!(
            validate_relative_file("blog/post.html").unwrap(),
            "blog/post.html"
        );
    }

    #[test]
    fn test_escaping_paths_are_rejected() {
        for bad in ["../secret.html", "a/../../b.html", "/etc/passwd", "", "  "] {
            assert!(
                matches!(validate_relative_file(bad), Err(AppError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_domain_validation() {
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("a/b").is_err());
        assert!(validate_domain("..").is_err());
        assert!(validate_domain("").is_err());
    }

    #[test]
    fn test_default_workspace_root_ends_with_sites() {
        assert!(default_workspace_root().ends_with("sites"));
    }
}
