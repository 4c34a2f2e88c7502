use std::path::{Path, PathBuf};

use color_eyre::eyre::Context;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use walkdir::WalkDir;

use super::DevService;
use crate::{
    errors::{Result, UserFacingError},
    model::LargeFileEntry,
};

impl DevService {
    /// Finds the largest files under the given directory, sorted by size in descending order.
    ///
    /// Files smaller than `min_size` are ignored and at most `limit` entries are returned. Entries that can't be read
    /// are skipped.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub async fn find_large_files(
        &self,
        root: impl AsRef<Path>,
        min_size: u64,
        limit: usize,
        cancellation_token: &CancellationToken,
    ) -> Result<Vec<LargeFileEntry>> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(UserFacingError::NotADirectory(root.display().to_string()).into());
        }
        let exclude = self.scan.exclude.clone();
        let token = cancellation_token.clone();
        tokio::task::spawn_blocking(move || walk_large_files(&root, min_size, limit, &exclude, &token))
            .await
            .wrap_err("Scan task panicked")?
    }
}

fn walk_large_files(
    root: &Path,
    min_size: u64,
    limit: usize,
    exclude: &[String],
    cancellation_token: &CancellationToken,
) -> Result<Vec<LargeFileEntry>> {
    let mut entries = Vec::new();
    let iter = WalkDir::new(root).into_iter().filter_entry(|e| {
        e.depth() == 0 || !(e.file_type().is_dir() && exclude.iter().any(|x| e.file_name().to_str() == Some(x.as_str())))
    });
    for result in iter {
        if cancellation_token.is_cancelled() {
            tracing::info!("Scan cancelled");
            return Err(UserFacingError::Cancelled.into());
        }
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("Skipped entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                tracing::debug!("Couldn't stat {}: {err}", entry.path().display());
                continue;
            }
        };
        if size >= min_size {
            let path = entry
                .path()
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(entry.path()));
            entries.push(LargeFileEntry { path, size_bytes: size });
        }
    }
    tracing::info!("Found {} files over {min_size} bytes", entries.len());

    entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.path.cmp(&b.path)));
    entries.truncate(limit);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{AiConfig, ScanConfig};

    fn write_file(root: &Path, path: &str, size: usize) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b'x'; size]).unwrap();
    }

    #[tokio::test]
    async fn test_find_large_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "small.txt", 10);
        write_file(dir.path(), "big.bin", 3000);
        write_file(dir.path(), "nested/bigger.bin", 5000);
        write_file(dir.path(), "nested/deep/exact.bin", 1000);
        write_file(dir.path(), "node_modules/huge.js", 10_000);
        write_file(dir.path(), ".git/objects/pack", 10_000);

        let service = DevService::new(AiConfig::default(), ScanConfig::default());
        let files = service
            .find_large_files(dir.path(), 1000, 20, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            files,
            vec![
                LargeFileEntry {
                    path: PathBuf::from("nested/bigger.bin"),
                    size_bytes: 5000
                },
                LargeFileEntry {
                    path: PathBuf::from("big.bin"),
                    size_bytes: 3000
                },
                LargeFileEntry {
                    path: PathBuf::from("nested/deep/exact.bin"),
                    size_bytes: 1000
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_find_large_files_limit() {
        let dir = tempfile::tempdir().unwrap();
        for ix in 1..=5 {
            write_file(dir.path(), &format!("file{ix}.bin"), ix * 100);
        }

        let service = DevService::new(AiConfig::default(), ScanConfig::default());
        let files = service
            .find_large_files(dir.path(), 0, 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            files.iter().map(|f| f.size_bytes).collect::<Vec<_>>(),
            vec![500, 400]
        );
    }

    #[tokio::test]
    async fn test_find_large_files_not_a_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "file.txt", 1);

        let service = DevService::new(AiConfig::default(), ScanConfig::default());
        let res = service
            .find_large_files(dir.path().join("file.txt"), 0, 2, &CancellationToken::new())
            .await;
        assert!(res.is_err());
    }
}
