use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

/// A single file to download with optional SHA-1 and size for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

/// `{url, sha1, size}` as found under `downloads.artifact` in metadata.
#[derive(Debug, Clone, Deserialize)]
struct DownloadMeta {
    #[serde(default)]
    url: String,
    #[serde(default)]
    sha1: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

impl DownloadEntry {
    /// Build an entry from a metadata download descriptor. Returns `None`
    /// when the descriptor has no usable URL.
    pub fn from_meta(meta: &serde_json::Value, dest: PathBuf) -> Option<Self> {
        let meta: DownloadMeta = serde_json::from_value(meta.clone()).ok()?;
        if meta.url.is_empty() {
            return None;
        }
        Some(Self {
            url: meta.url,
            dest,
            sha1: meta.sha1.filter(|s| !s.is_empty()),
            size: meta.size,
        })
    }

    /// Whether the destination already exists with the expected size.
    pub fn is_satisfied(&self) -> bool {
        match std::fs::metadata(&self.dest) {
            Ok(meta) => meta.is_file() && self.size.map_or(true, |size| meta.len() == size),
            Err(_) => false,
        }
    }
}

/// Concurrent, SHA-1 validated downloader.
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: 8,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    // ── Single file download ────────────────────────────

    /// Download a single file to `dest`, optionally validating SHA-1.
    ///
    /// Creates parent directories as needed.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        if let Some(expected) = sha1_expected {
            let actual = sha1_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        // The handle must be dropped before anything else opens the file.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| LauncherError::Io {
                    path: dest.to_path_buf(),
                    source: e,
                })?;
            file.write_all(&bytes).await.map_err(|e| LauncherError::Io {
                path: dest.to_path_buf(),
                source: e,
            })?;
            file.flush().await.map_err(|e| LauncherError::Io {
                path: dest.to_path_buf(),
                source: e,
            })?;
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many files concurrently using `buffer_unordered`.
    ///
    /// Entries already satisfied on disk are skipped. Returns the list of
    /// files that failed (if any).
    pub async fn download_batch(
        &self,
        entries: Vec<DownloadEntry>,
    ) -> Vec<(DownloadEntry, LauncherError)> {
        let pending: Vec<DownloadEntry> = entries
            .into_iter()
            .filter(|entry| !entry.is_satisfied())
            .collect();

        if pending.is_empty() {
            return Vec::new();
        }

        info!(
            "Starting batch download: {} files, concurrency={}",
            pending.len(),
            self.concurrency
        );

        let results: Vec<_> = stream::iter(pending)
            .map(|entry| async move {
                let result = self
                    .download_file(&entry.url, &entry.dest, entry.sha1.as_deref())
                    .await;
                (entry, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(entry, result)| result.err().map(|e| (entry, e)))
            .collect()
    }

    /// Validate an existing file's SHA-1.
    pub async fn validate_sha1(path: &Path, expected: &str) -> LauncherResult<bool> {
        let bytes = tokio::fs::read(path).await.map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(sha1_hex(&bytes).eq_ignore_ascii_case(expected))
    }
}

pub(crate) fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
