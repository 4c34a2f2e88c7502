use std::{panic::AssertUnwindSafe, process};

use color_eyre::Result;
use devcli::{
    app::{self, App},
    cli::Cli,
    config::Config,
    errors, format_error,
    logging::LogSettings,
    service::DevService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Read cli arguments
    let cli = Cli::parse_extended();

    // Load the env file before anything reads the environment
    match dotenvy::dotenv() {
        Err(err) if !err.not_found() => eprintln!("Couldn't load .env file: {err}"),
        _ => (),
    }

    // Initialize the config
    let config = Config::init(cli.config.clone())?;

    // Initialize logging
    let log_settings = LogSettings::resolve(&config);
    log_settings.init()?;

    // Initialize error handlers
    errors::init(
        log_settings.enabled().then_some(log_settings.path),
        AssertUnwindSafe(async move {
            tracing::info!("devcli v{}", env!("CARGO_PKG_VERSION"));

            // Every feature talks to the AI, so the credential must be there from the start
            if let Err(err) = config.ai.api_key() {
                tracing::error!("{err}");
                eprintln!("{}", format_error!(config.theme, "{err}"));
                process::exit(1);
            }

            // Run the app
            let service = DevService::new(config.ai.clone(), config.scan.clone());
            let app = App::new(config, service);
            let output = app.run(cli.process).await?;

            // Print the output and exit accordingly
            app::print_output(&output);
            if output.failed {
                process::exit(1);
            }
            Ok(())
        }),
    )
    .await
}
