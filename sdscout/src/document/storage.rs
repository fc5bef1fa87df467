//! Temporary and persistent document storage.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::ScoutError;
use crate::websearch::PDF_EXTENSION;

/// Hex characters of the URL digest used to disambiguate promoted names.
const DIGEST_HEX_LEN: usize = 8;

/// The three storage directories.
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Creates a storage handle. Nothing touches the filesystem until [`Storage::prepare`].
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Directory holding verified documents.
    #[must_use]
    pub fn verified_dir(&self) -> &Path {
        &self.config.verified_dir
    }

    /// Directory holding run reports.
    #[must_use]
    pub fn logs_dir(&self) -> &Path {
        &self.config.logs_dir
    }

    /// Creates all three directories if they do not exist.
    pub async fn prepare(&self) -> Result<(), ScoutError> {
        for dir in [
            &self.config.temp_dir,
            &self.config.verified_dir,
            &self.config.logs_dir,
        ] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ScoutError::storage(dir, e))?;
        }
        Ok(())
    }

    /// Creates the temporary directory owned by one invocation.
    pub async fn open_run(&self, run_id: Uuid) -> Result<RunDir, ScoutError> {
        let path = self.config.temp_dir.join(run_id.to_string());
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| ScoutError::storage(&path, e))?;
        Ok(RunDir { path })
    }

    /// Moves a verified temporary file into the verified directory.
    ///
    /// Keeps the file name unless it is taken, in which case a short digest of
    /// the source URL (and, failing that, a counter) is appended to the stem.
    /// Each name is claimed atomically, so concurrent promotions into the same
    /// directory never replace one another.
    pub async fn promote(&self, temp: &Path, url: &str) -> std::io::Result<PathBuf> {
        let name = temp
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("document{PDF_EXTENSION}"));
        let (stem, ext) = split_extension(&name);
        let digest = url_digest(url);

        let mut attempt = 0u32;
        let target = loop {
            let candidate = self.config.verified_dir.join(match attempt {
                0 => name.clone(),
                1 => format!("{stem}-{digest}{ext}"),
                n => format!("{stem}-{digest}-{}{ext}", n - 1),
            });
            match claim(temp, &candidate).await {
                Ok(()) => break candidate,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        };

        // Anything left behind goes with the run directory.
        if let Err(e) = tokio::fs::remove_file(temp).await {
            tracing::warn!(path = %temp.display(), error = %e, "Failed to delete promoted temporary file");
        }
        Ok(target)
    }

    /// Deletes a temporary file. A file that is already gone is not an error.
    pub async fn discard(&self, temp: &Path) {
        match tokio::fs::remove_file(temp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %temp.display(), error = %e, "Failed to delete temporary file"),
        }
    }
}

/// Places `temp` at `target`, failing with `AlreadyExists` if the name is taken.
async fn claim(temp: &Path, target: &Path) -> std::io::Result<()> {
    match tokio::fs::hard_link(temp, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(e),
        Err(e) => {
            // Temp and verified may sit on different filesystems.
            tracing::debug!(error = %e, "Hard link failed, copying instead");
            copy_new(temp, target).await
        }
    }
}

async fn copy_new(temp: &Path, target: &Path) -> std::io::Result<()> {
    let mut source = tokio::fs::File::open(temp).await?;
    let mut dest = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .await?;

    let copied = async {
        tokio::io::copy(&mut source, &mut dest).await?;
        dest.flush().await
    }
    .await;

    if let Err(e) = copied {
        drop(dest);
        if let Err(cleanup) = tokio::fs::remove_file(target).await {
            tracing::warn!(path = %target.display(), error = %cleanup, "Failed to remove partial copy");
        }
        return Err(e);
    }
    Ok(())
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn url_digest(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(DIGEST_HEX_LEN);
    hex
}

/// Temporary directory scoped to one invocation.
#[derive(Debug)]
pub struct RunDir {
    path: PathBuf,
}

impl RunDir {
    /// The directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path a downloaded file with this name would occupy.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Removes the directory and anything left in it.
    pub async fn close(self) {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove run directory"
            ),
        }
    }
}
