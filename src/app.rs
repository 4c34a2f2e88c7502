use color_eyre::Result;
use strum::IntoEnumIterator;
use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    cli::{
        ApiProcess, AuditProcess, CliProcess, CommitProcess, DocsProcess, RegexProcess, ScanProcess, TimerProcess,
    },
    config::Config,
    errors::AppError,
    format_error,
    process::{Process, ProcessOutput},
    service::DevService,
    utils::Prompter,
};

/// Entries of the interactive menu
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display, strum::EnumIter)]
enum MenuItem {
    #[strum(to_string = "Commit message (AI)")]
    Commit,
    #[strum(to_string = "README/Docs generator")]
    Docs,
    #[strum(to_string = "Regex helper")]
    Regex,
    #[strum(to_string = "API tester")]
    Api,
    #[strum(to_string = "Large file scanner")]
    Scan,
    #[strum(to_string = "Dependency security scan")]
    Audit,
    #[strum(to_string = "Activity timer")]
    Timer,
    #[strum(to_string = "Exit")]
    Exit,
}

impl MenuItem {
    /// The process to run for this entry, with every argument to be prompted
    fn process(self) -> Option<CliProcess> {
        Some(match self {
            MenuItem::Commit => CliProcess::Commit(CommitProcess::default()),
            MenuItem::Docs => CliProcess::Docs(DocsProcess::default()),
            MenuItem::Regex => CliProcess::Regex(RegexProcess::default()),
            MenuItem::Api => CliProcess::Api(ApiProcess::default()),
            MenuItem::Scan => CliProcess::Scan(ScanProcess::default()),
            MenuItem::Audit => CliProcess::Audit(AuditProcess::default()),
            MenuItem::Timer => CliProcess::Timer(TimerProcess::default()),
            MenuItem::Exit => return None,
        })
    }
}

/// The main application struct, holding configuration and dispatching the processes
pub struct App {
    config: Config,
    service: DevService,
}

impl App {
    /// Creates a new instance of the application
    pub fn new(config: Config, service: DevService) -> Self {
        Self { config, service }
    }

    /// Runs the given process, or the interactive menu if none.
    ///
    /// Errors displayable to the user are returned as a failed [ProcessOutput], any other error is propagated.
    #[instrument(skip_all)]
    pub async fn run(self, process: Option<CliProcess>) -> Result<ProcessOutput> {
        match process {
            Some(process) => match self.dispatch(process).await {
                Ok(output) => Ok(output),
                Err(AppError::UserFacing(err)) => {
                    Ok(ProcessOutput::fail().stderr(format_error!(self.config.theme, "{err}")))
                }
                Err(AppError::Unexpected(report)) => Err(report),
            },
            None => self.run_menu().await,
        }
    }

    /// Displays the menu until the user exits, reporting every failure and continuing
    async fn run_menu(self) -> Result<ProcessOutput> {
        println!(
            "{}",
            self.config
                .theme
                .banner
                .apply(concat!("devcli v", env!("CARGO_PKG_VERSION"), " - developer tools"))
        );

        let items = MenuItem::iter().collect::<Vec<_>>();
        loop {
            println!();
            let item = {
                let interrupt = Interrupt::new();
                let prompt = Prompter::new(&self.config.theme, &interrupt.token);
                match prompt.select("Choose tool", &items).await {
                    Ok(item) => item,
                    // Interrupting the menu or reaching the end of the input exits
                    Err(AppError::UserFacing(_)) => break,
                    Err(AppError::Unexpected(report)) => return Err(report),
                }
            };
            let Some(process) = item.process() else {
                break;
            };

            tracing::info!("Running '{item}' from the menu");
            println!("\n{}", self.config.theme.info.apply(item.to_string()));
            match self.dispatch(process).await {
                Ok(output) => print_output(&output),
                Err(AppError::UserFacing(err)) => {
                    eprintln!("{}", format_error!(self.config.theme, "{err}"));
                }
                Err(AppError::Unexpected(report)) => {
                    tracing::error!("Unexpected error on '{item}': {report:?}");
                    eprintln!("{}", format_error!(self.config.theme, "{report}"));
                }
            }
        }

        Ok(ProcessOutput::success().stderr(self.config.theme.secondary.apply("Bye!").to_string()))
    }

    /// Runs a single process, that will be cancelled on Ctrl+C
    async fn dispatch(&self, process: CliProcess) -> Result<ProcessOutput, AppError> {
        let interrupt = Interrupt::new();
        let token = interrupt.token.clone();
        let config = self.config.clone();
        let service = self.service.clone();
        match process {
            CliProcess::Commit(p) => {
                tracing::debug!("Options: {p:?}");
                p.execute(config, service, token).await
            }
            CliProcess::Docs(p) => {
                tracing::debug!("Options: {p:?}");
                p.execute(config, service, token).await
            }
            CliProcess::Regex(p) => {
                tracing::debug!("Options: {p:?}");
                p.execute(config, service, token).await
            }
            CliProcess::Api(p) => {
                tracing::debug!("Options: {p:?}");
                p.execute(config, service, token).await
            }
            CliProcess::Scan(p) => {
                tracing::debug!("Options: {p:?}");
                p.execute(config, service, token).await
            }
            CliProcess::Audit(p) => {
                tracing::debug!("Options: {p:?}");
                p.execute(config, service, token).await
            }
            CliProcess::Timer(p) => p.execute(config, service, token).await,
        }
    }
}

/// Prints the output of a process
pub fn print_output(output: &ProcessOutput) {
    if let Some(stderr) = &output.stderr {
        eprintln!("{stderr}");
    }
    if let Some(stdout) = &output.stdout {
        println!("{stdout}");
    }
}

/// A cancellation token that is cancelled when Ctrl+C is received, while alive
struct Interrupt {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Interrupt {
    fn new() -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let token = token.clone();
            async move {
                if signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl+C received, cancelling token");
                    token.cancel();
                }
            }
        });
        Self { token, handle }
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_menu_order() {
        let items = MenuItem::iter().map(|i| i.to_string()).collect::<Vec<_>>();
        assert_eq!(
            items,
            vec![
                "Commit message (AI)",
                "README/Docs generator",
                "Regex helper",
                "API tester",
                "Large file scanner",
                "Dependency security scan",
                "Activity timer",
                "Exit"
            ]
        );
        assert!(MenuItem::Exit.process().is_none());
        assert!(MenuItem::Timer.process().is_some());
    }
}
