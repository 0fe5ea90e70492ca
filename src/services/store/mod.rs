//! Document Store
//!
//! Reads and writes HTML files under `<workspace>/<domain>/` and keeps a
//! timestamped snapshot of every file before it is overwritten.

mod document;
mod versions;

pub use document::Document;
pub use versions::VersionSnapshot;

use std::path::{Path, PathBuf};

use chrono::Utc;
use ignore::WalkBuilder;
use similar::TextDiff;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{validate_domain, validate_relative_file};
use versions::{file_key, parse_snapshot_id, snapshot_id, SNAPSHOT_EXTENSION};

/// Snapshot collisions tolerated within one millisecond.
const MAX_SNAPSHOT_SEQUENCE: u32 = 1000;

/// File-backed store for domain working directories.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    versions_dir: String,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>, versions_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            versions_dir: versions_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn domain_dir(&self, domain: &str) -> AppResult<PathBuf> {
        validate_domain(domain)?;
        Ok(self.root.join(domain.trim()))
    }

    fn resolve(&self, domain: &str, file: &str) -> AppResult<(String, PathBuf)> {
        let dir = self.domain_dir(domain)?;
        let rel = validate_relative_file(file)?;
        if rel.split('/').next() == Some(self.versions_dir.as_str()) {
            return Err(AppError::validation(format!(
                "'{}' is inside the snapshot area",
                file
            )));
        }
        let path = dir.join(&rel);
        Ok((rel, path))
    }

    fn versions_dir_for(&self, domain: &str, rel: &str) -> AppResult<PathBuf> {
        Ok(self
            .domain_dir(domain)?
            .join(&self.versions_dir)
            .join(file_key(rel)))
    }

    /// Read a file's current content.
    pub async fn read(&self, domain: &str, file: &str) -> AppResult<String> {
        let (rel, path) = self.resolve(domain, file)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found(
                format!("{} in domain {}", rel, domain),
            )),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read and parse a file.
    pub async fn load(&self, domain: &str, file: &str) -> AppResult<Document> {
        let (rel, _) = self.resolve(domain, file)?;
        let text = self.read(domain, &rel).await?;
        Ok(Document::parse(rel, text))
    }

    /// Overwrite (or create) a file. Existing content is snapshotted first;
    /// the snapshot is returned.
    pub async fn write(
        &self,
        domain: &str,
        file: &str,
        content: &str,
    ) -> AppResult<Option<VersionSnapshot>> {
        let (rel, path) = self.resolve(domain, file)?;
        let previous = match fs::read_to_string(&path).await {
            Ok(previous) => Some(previous),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(AppError::Io(e)),
        };

        let snapshot = match previous {
            Some(previous) => Some(self.snapshot(domain, &rel, &previous).await?),
            None => None,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        write_atomic(&path, content).await?;
        tracing::debug!(
            "[store] wrote {}/{} ({} bytes, snapshot: {})",
            domain,
            rel,
            content.len(),
            snapshot.as_ref().map(|s| s.id.as_str()).unwrap_or("none")
        );
        Ok(snapshot)
    }

    /// Persist an edited document.
    pub async fn save(&self, domain: &str, document: &Document) -> AppResult<Option<VersionSnapshot>> {
        self.write(domain, document.path(), &document.text()).await
    }

    async fn snapshot(&self, domain: &str, rel: &str, content: &str) -> AppResult<VersionSnapshot> {
        let dir = self.versions_dir_for(domain, rel)?;
        fs::create_dir_all(&dir).await?;
        let now = Utc::now();
        for sequence in 0..MAX_SNAPSHOT_SEQUENCE {
            let id = snapshot_id(now, sequence);
            let path = dir.join(format!("{}.{}", id, SNAPSHOT_EXTENSION));
            let opened = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut handle = match opened {
                Ok(handle) => handle,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(AppError::Io(e)),
            };
            handle.write_all(content.as_bytes()).await?;
            handle.flush().await?;
            return Ok(VersionSnapshot {
                id,
                domain: domain.to_string(),
                file: rel.to_string(),
                created_at: now,
                size: content.len() as u64,
            });
        }
        Err(AppError::internal(format!(
            "could not allocate a snapshot name for {}",
            rel
        )))
    }

    /// Known domains, sorted.
    pub async fn list_domains(&self) -> AppResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };
        let mut domains = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                domains.push(name);
            }
        }
        domains.sort();
        Ok(domains)
    }

    /// Domain-relative HTML files, sorted, excluding snapshots.
    pub async fn list_files(&self, domain: &str) -> AppResult<Vec<String>> {
        let dir = self.domain_dir(domain)?;
        if !fs::try_exists(&dir).await? {
            return Err(AppError::not_found(format!("domain {}", domain)));
        }
        let versions_dir = self.versions_dir.clone();
        tokio::task::spawn_blocking(move || collect_html_files(&dir, &versions_dir))
            .await
            .map_err(|e| AppError::internal(format!("file listing task failed: {}", e)))
    }

    /// Snapshots of a file, oldest first.
    pub async fn list_versions(&self, domain: &str, file: &str) -> AppResult<Vec<VersionSnapshot>> {
        let (rel, _) = self.resolve(domain, file)?;
        let dir = self.versions_dir_for(domain, &rel)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((created_at, sequence)) = parse_snapshot_id(id) else {
                continue;
            };
            let size = entry.metadata().await?.len();
            found.push((
                sequence,
                VersionSnapshot {
                    id: id.to_string(),
                    domain: domain.to_string(),
                    file: rel.clone(),
                    created_at,
                    size,
                },
            ));
        }
        found.sort_by(|a, b| (a.1.created_at, a.0).cmp(&(b.1.created_at, b.0)));
        Ok(found.into_iter().map(|(_, snapshot)| snapshot).collect())
    }

    fn version_path(&self, domain: &str, rel: &str, version_id: &str) -> AppResult<PathBuf> {
        if parse_snapshot_id(version_id).is_none() {
            return Err(AppError::validation(format!(
                "'{}' is not a version id",
                version_id
            )));
        }
        Ok(self
            .versions_dir_for(domain, rel)?
            .join(format!("{}.{}", version_id, SNAPSHOT_EXTENSION)))
    }

    pub async fn read_version(&self, domain: &str, file: &str, version_id: &str) -> AppResult<String> {
        let (rel, _) = self.resolve(domain, file)?;
        let path = self.version_path(domain, &rel, version_id)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found(
                format!("version {} of {}", version_id, rel),
            )),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write a snapshot's content back as the current file. The content being
    /// replaced is itself snapshotted.
    pub async fn restore_version(
        &self,
        domain: &str,
        file: &str,
        version_id: &str,
    ) -> AppResult<Option<VersionSnapshot>> {
        let content = self.read_version(domain, file, version_id).await?;
        tracing::info!("[store] restoring {}/{} to {}", domain, file, version_id);
        self.write(domain, file, &content).await
    }

    /// Unified diff from a snapshot to the current content.
    pub async fn diff_version(&self, domain: &str, file: &str, version_id: &str) -> AppResult<String> {
        let old = self.read_version(domain, file, version_id).await?;
        let current = self.read(domain, file).await?;
        let (rel, _) = self.resolve(domain, file)?;
        let diff = TextDiff::from_lines(&old, &current);
        Ok(diff
            .unified_diff()
            .context_radius(3)
            .header(&format!("{}@{}", rel, version_id), &rel)
            .to_string())
    }
}

async fn write_atomic(path: &Path, content: &str) -> AppResult<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp-{}", name, Uuid::new_v4()));
    fs::write(&tmp, content).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(AppError::Io(e));
    }
    Ok(())
}

fn collect_html_files(dir: &Path, versions_dir: &str) -> Vec<String> {
    let mut builder = WalkBuilder::new(dir);
    builder
        .hidden(true)
        .follow_links(false)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .ignore(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
            .unwrap_or(false);
        if !is_html {
            continue;
        }
        let Ok(rel) = path.strip_prefix(dir) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if rel.split('/').next() == Some(versions_dir) {
            continue;
        }
        files.push(rel);
    }
    files.sort();
    files
}
