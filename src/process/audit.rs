use std::env;

use color_eyre::eyre::Context;
use itertools::Itertools;
use tokio_util::sync::CancellationToken;

use super::{Process, ProcessOutput, print_block, spinner};
use crate::{cli::AuditProcess, config::Config, errors::Result, format_msg, format_warning, service::DevService};

impl Process for AuditProcess {
    async fn execute(
        self,
        config: Config,
        service: DevService,
        cancellation_token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let dir = match self.path {
            Some(path) => path,
            None => env::current_dir().wrap_err("Couldn't read the working dir")?,
        };

        let scan = service.scan_manifests(&dir).await?;
        for err in &scan.errors {
            println!("{}", format_warning!(config.theme, "Couldn't parse {}: {}", err.kind, err.message));
        }
        if scan.manifests.is_empty() {
            return Ok(ProcessOutput::success().stderr(format_warning!(
                config.theme,
                "No dependency manifests found on {}",
                dir.display()
            )));
        }
        println!(
            "{}",
            format_msg!(
                config.theme,
                "Found {} dependencies on {}",
                scan.dependencies.len(),
                scan.manifests.iter().join(", ")
            )
        );
        if scan.dependencies.is_empty() {
            return Ok(ProcessOutput::success());
        }

        let pb = spinner("Scanning dependencies ...");
        let res = service.audit_dependencies(&scan.dependencies, &cancellation_token).await;
        pb.finish_and_clear();
        let report = res?;

        print_block(&config, "Security Report", &report);
        Ok(ProcessOutput::success())
    }
}
