use std::env;

use color_eyre::eyre::Context;
use prettytable::{Table, format, row};
use tokio_util::sync::CancellationToken;

use super::{Process, ProcessOutput, spinner};
use crate::{
    cli::ScanProcess,
    config::Config,
    errors::Result,
    format_msg,
    model::{HumanSize, LargeFileEntry},
    service::DevService,
};

impl Process for ScanProcess {
    async fn execute(
        self,
        config: Config,
        service: DevService,
        cancellation_token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let root = match self.path {
            Some(path) => path,
            None => env::current_dir().wrap_err("Couldn't read the working dir")?,
        };
        let min_size = self.min_size.unwrap_or(service.scan_config().min_size);
        let limit = self.limit.unwrap_or(service.scan_config().limit);

        let pb = spinner("Scanning files ...");
        let res = service
            .find_large_files(&root, min_size, limit, &cancellation_token)
            .await;
        pb.finish_and_clear();
        let files = res?;

        if files.is_empty() {
            return Ok(ProcessOutput::success().stderr(format_msg!(
                config.theme,
                "No files over {} found on {}",
                HumanSize(min_size),
                root.display()
            )));
        }

        Ok(ProcessOutput::success().stdout(files_table(&files)))
    }
}

/// Renders the files as a table of sizes and paths
fn files_table(files: &[LargeFileEntry]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row!["Size", "Path"]);
    for file in files {
        table.add_row(row![r->HumanSize(file.size_bytes), file.path.display()]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_files_table() {
        let table = files_table(&[
            LargeFileEntry {
                path: PathBuf::from("video.mp4"),
                size_bytes: 12 * 1024 * 1024,
            },
            LargeFileEntry {
                path: PathBuf::from("data/dump.sql"),
                size_bytes: 6 * 1024 * 1024,
            },
        ]);
        let lines = table.lines().collect::<Vec<_>>();
        assert!(lines[0].contains("Size") && lines[0].contains("Path"));
        assert!(table.contains("12.0 MB"));
        assert!(table.contains("data/dump.sql"));
        assert!(table.find("video.mp4") < table.find("data/dump.sql"));
    }
}
