use std::{
    env,
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::Context};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Config;

/// Env variable enabling the logs, with the filter to apply
pub const LOG_ENV: &str = "DEVCLI_LOG";

/// Name of the log file, under the data dir
const LOG_FILE_NAME: &str = "devcli.log";

/// Where and what to log
#[derive(Debug, PartialEq, Eq)]
pub struct LogSettings {
    /// Path of the log file
    pub path: PathBuf,
    /// Filter to apply, logs are disabled when missing
    pub filter: Option<String>,
}

impl LogSettings {
    /// Resolves the settings from the config and the [LOG_ENV] variable
    pub fn resolve(config: &Config) -> Self {
        Self::with_env_filter(config, env::var(LOG_ENV).ok())
    }

    fn with_env_filter(config: &Config, env_filter: Option<String>) -> Self {
        Self {
            path: config.data_dir.join(LOG_FILE_NAME),
            filter: config.logs.resolve_filter(env_filter),
        }
    }

    /// Whether logs will be written
    pub fn enabled(&self) -> bool {
        self.filter.is_some()
    }

    /// Installs the global subscriber, appending to the log file.
    ///
    /// Nothing is installed when disabled, the terminal is never written to.
    pub fn init(&self) -> Result<()> {
        let Some(filter) = &self.filter else {
            return Ok(());
        };
        let env_filter = EnvFilter::try_new(filter).wrap_err_with(|| format!("Invalid log filter '{filter}'"))?;
        let file_layer = fmt::layer()
            .with_writer(open_log_file(&self.path)?)
            .with_ansi(false)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter);
        tracing_subscriber::registry()
            .with(file_layer)
            .with(ErrorLayer::default())
            .init();
        Ok(())
    }
}

/// Opens the log file, keeping the logs of previous runs
fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Couldn't open the log file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_resolve_settings() {
        let mut config = Config::default();
        config.data_dir = PathBuf::from("/data/devcli");

        let settings = LogSettings::with_env_filter(&config, None);
        assert_eq!(settings.path, PathBuf::from("/data/devcli/devcli.log"));
        assert!(!settings.enabled());

        let settings = LogSettings::with_env_filter(&config, Some("debug".into()));
        assert_eq!(settings.filter.as_deref(), Some("debug"));

        config.logs.enabled = true;
        let settings = LogSettings::with_env_filter(&config, None);
        assert_eq!(settings.filter.as_deref(), Some("info"));
        let settings = LogSettings::with_env_filter(&config, Some("devcli=trace".into()));
        assert_eq!(settings.filter.as_deref(), Some("devcli=trace"));
    }

    #[test]
    fn test_log_file_is_appended() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(LOG_FILE_NAME);
        fs::write(&path, "previous run\n")?;

        {
            use std::io::Write;
            let mut file = open_log_file(&path)?;
            writeln!(file, "next run")?;
        }

        assert_eq!(fs::read_to_string(&path)?, "previous run\nnext run\n");
        Ok(())
    }
}
