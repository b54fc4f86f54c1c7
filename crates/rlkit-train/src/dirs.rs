//! Run directory preparation

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use rlkit_core::Result;

/// Directories of a run under `root`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirs {
    /// Checkpoints
    pub model: PathBuf,
    /// Logs and telemetry
    pub log: PathBuf,
    /// Animations
    pub images: PathBuf,
}

impl RunDirs {
    /// Standard layout: `model/`, `log/` and `log/images/`
    #[must_use]
    pub fn under(root: &Path) -> Self {
        let log = root.join("log");
        Self {
            model: root.join("model"),
            images: log.join("images"),
            log,
        }
    }
}

/// Create the standard run directories under `root`; existing ones are kept
pub async fn prep_dir_default(root: impl AsRef<Path>) -> Result<RunDirs> {
    let dirs = RunDirs::under(root.as_ref());
    for dir in [&dirs.model, &dirs.log, &dirs.images] {
        fs::create_dir_all(dir).await?;
    }
    info!("Prepared run directory {}", root.as_ref().display());
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_layout_and_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let dirs = prep_dir_default(root.path()).await.unwrap();
        assert!(dirs.model.is_dir());
        assert!(dirs.images.is_dir());
        assert_eq!(dirs.images, root.path().join("log").join("images"));

        std::fs::write(dirs.model.join("keep.json"), "{}").unwrap();
        prep_dir_default(root.path()).await.unwrap();
        assert!(dirs.model.join("keep.json").exists());
    }
}
