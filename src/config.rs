use std::{env, fs, path::PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, ContextCompat},
};
use crossterm::style::{Attribute, Attributes, Color, ContentStyle};
use directories::ProjectDirs;
use serde::{
    Deserialize,
    de::{Deserializer, Error},
};

use crate::errors::UserFacingError;

/// Main configuration struct for the application
#[derive(Clone, Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
#[cfg_attr(not(test), serde(default))]
pub struct Config {
    /// Directory where the data must be stored
    pub data_dir: PathBuf,
    /// Configuration settings for application logging
    pub logs: LogsConfig,
    /// Configuration for the terminal output styles
    pub theme: Theme,
    /// Configuration for the AI integration
    pub ai: AiConfig,
    /// Configuration for the large file scanner
    pub scan: ScanConfig,
}

/// Configuration settings for application logging
#[derive(Clone, Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
#[cfg_attr(not(test), serde(default))]
pub struct LogsConfig {
    /// Whether application logging is enabled
    pub enabled: bool,
    /// The log filter to apply, controlling which logs are recorded.
    ///
    /// This string supports the `tracing-subscriber`'s environment filter syntax.
    pub filter: String,
}

/// Terminal output styles
#[derive(Clone, Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
#[cfg_attr(not(test), serde(default))]
pub struct Theme {
    /// Main text, like prompts
    #[serde(deserialize_with = "deserialize_style")]
    pub primary: ContentStyle,
    /// Less important text, like defaults or separators
    #[serde(deserialize_with = "deserialize_style")]
    pub secondary: ContentStyle,
    /// Highlighted values, like the extracted pattern
    #[serde(deserialize_with = "deserialize_style")]
    pub accent: ContentStyle,
    /// Successful operations
    #[serde(deserialize_with = "deserialize_style")]
    pub success: ContentStyle,
    /// Section titles and informative messages
    #[serde(deserialize_with = "deserialize_style")]
    pub info: ContentStyle,
    /// Recoverable problems
    #[serde(deserialize_with = "deserialize_style")]
    pub warning: ContentStyle,
    /// Errors
    #[serde(deserialize_with = "deserialize_style")]
    pub error: ContentStyle,
    /// The welcome banner
    #[serde(deserialize_with = "deserialize_style")]
    pub banner: ContentStyle,
}

/// Configuration for the AI completion client
#[derive(Clone, Deserialize)]
#[cfg_attr(any(test, debug_assertions), derive(Debug))]
#[cfg_attr(test, derive(PartialEq))]
#[cfg_attr(not(test), serde(default))]
pub struct AiConfig {
    /// The exact model identifier to use (e.g., "gpt-4o-mini")
    pub model: String,
    /// The base URL of an OpenAI-compatible API endpoint
    pub url: String,
    /// The name of the environment variable containing the API key
    pub api_key_env: String,
    /// Sampling temperature, in the `[0, 2]` range
    pub temperature: f32,
    /// System prompts used by each feature
    pub prompts: AiPromptsConfig,
}

/// System prompts sent along with every feature request
#[derive(Clone, Deserialize)]
#[cfg_attr(any(test, debug_assertions), derive(Debug))]
#[cfg_attr(test, derive(PartialEq))]
#[cfg_attr(not(test), serde(default))]
pub struct AiPromptsConfig {
    /// Used to generate commit messages
    pub commit: String,
    /// Used to generate documentation
    pub docs: String,
    /// Used to synthesize regular expressions
    pub regex: String,
    /// Used to summarize HTTP responses
    pub api: String,
    /// Used to review dependency lists
    pub audit: String,
}

/// Configuration for the large file scanner
#[derive(Clone, Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
#[cfg_attr(not(test), serde(default))]
pub struct ScanConfig {
    /// Minimum size (in bytes) for a file to be reported
    pub min_size: u64,
    /// Maximum number of files to display
    pub limit: usize,
    /// Directory names that are never walked into
    pub exclude: Vec<String>,
}

impl Config {
    /// Initializes the application configuration.
    ///
    /// Attempts to load the configuration from the given file, the `DEVCLI_CONFIG` env variable or the user's config
    /// directory (`config.toml`). If the file does not exist or has missing fields, it falls back to default values.
    pub fn init(config_file: Option<PathBuf>) -> Result<Self> {
        // Initialize directories
        let proj_dirs =
            ProjectDirs::from("org", "DevCli", "devcli").wrap_err("Couldn't initialize project directory")?;
        let config_dir = proj_dirs.config_dir().to_path_buf();

        // Initialize the config
        let config_path = config_file
            .or_else(|| env::var_os("DEVCLI_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| config_dir.join("config.toml"));
        let mut config = if config_path.exists() {
            tracing::debug!("Reading config from {}", config_path.display());
            let config_str = fs::read_to_string(&config_path)
                .wrap_err_with(|| format!("Couldn't read config file {}", config_path.display()))?;
            toml::from_str(&config_str)
                .wrap_err_with(|| format!("Couldn't parse config file {}", config_path.display()))?
        } else {
            Config::default()
        };
        // If no data dir is provided, use the default
        if config.data_dir.as_os_str().is_empty() {
            config.data_dir = proj_dirs.data_dir().to_path_buf();
        }

        // Keep the temperature within the range accepted by the api
        config.ai.temperature = config.ai.temperature.clamp(0.0, 2.0);

        // Create the data directory if not found
        fs::create_dir_all(&config.data_dir)
            .wrap_err_with(|| format!("Could't create data dir {}", config.data_dir.display()))?;

        Ok(config)
    }
}

impl LogsConfig {
    /// Resolves the filter to apply, or `None` when logging is disabled.
    ///
    /// A non-blank filter from the environment enables logging regardless of `enabled` and replaces `filter`.
    pub fn resolve_filter(&self, env_filter: Option<String>) -> Option<String> {
        match env_filter.filter(|f| !f.trim().is_empty()) {
            Some(env_filter) => Some(env_filter),
            None => self.enabled.then(|| self.filter.clone()),
        }
    }
}

impl AiConfig {
    /// Reads the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, UserFacingError> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| UserFacingError::AiMissingApiKey(self.api_key_env.clone()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            logs: LogsConfig::default(),
            theme: Theme::default(),
            ai: AiConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}
impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: String::from("info"),
        }
    }
}
impl Default for Theme {
    fn default() -> Self {
        let mut secondary = ContentStyle::new();
        secondary.attributes.set(Attribute::Dim);

        Self {
            primary: ContentStyle::new(),
            secondary,
            accent: fg(Color::Yellow),
            success: fg(Color::Green),
            info: fg(Color::Cyan),
            warning: fg(Color::Yellow),
            error: fg(Color::DarkRed),
            banner: fg(Color::Magenta),
        }
    }
}
impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: String::from("gpt-4o-mini"),
            url: String::from("https://api.openai.com/v1"),
            api_key_env: String::from("OPENAI_API_KEY"),
            temperature: 0.2,
            prompts: AiPromptsConfig::default(),
        }
    }
}
impl Default for AiPromptsConfig {
    fn default() -> Self {
        Self {
            commit: String::from("Conventional commit assistant."),
            docs: String::from("Technical writer"),
            regex: String::from("Regex expert"),
            api: String::from("Backend debugger"),
            audit: String::from("Security auditor"),
        }
    }
}
impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_size: 5 * 1024 * 1024,
            limit: 20,
            exclude: vec![
                String::from(".git"),
                String::from("node_modules"),
                String::from("target"),
            ],
        }
    }
}

fn fg(color: Color) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(color);
    style
}

/// Deserializes a string into a [`ContentStyle`].
///
/// Supports color names and modifiers (e.g., "red", "bold", "italic blue", "underline dim green").
fn deserialize_style<'de, D>(deserializer: D) -> Result<ContentStyle, D::Error>
where
    D: Deserializer<'de>,
{
    parse_style(&String::deserialize(deserializer)?).map_err(D::Error::custom)
}

/// Parses a string into a [`ContentStyle`], leading words are attributes and the rest is the foreground color
fn parse_style(raw: &str) -> Result<ContentStyle, String> {
    let raw_lower = raw.to_ascii_lowercase();
    let mut attributes = Attributes::none();
    let mut words = raw_lower.split_whitespace().peekable();
    while let Some(word) = words.peek() {
        let attribute = match *word {
            "bold" => Attribute::Bold,
            "dim" => Attribute::Dim,
            "italic" => Attribute::Italic,
            "underline" | "underlined" => Attribute::Underlined,
            _ => break,
        };
        attributes.set(attribute);
        words.next();
    }
    let color = words.collect::<Vec<_>>().join(" ");

    let mut style = ContentStyle::new();
    style.attributes = attributes;
    if !color.is_empty() && color != "default" {
        style.foreground_color = Some(parse_color(&color)?);
    }
    Ok(style)
}

/// Parses a color name, a `#rrggbb` hex code or an ansi index
fn parse_color(raw: &str) -> Result<Color, String> {
    let err = || format!("Unable to parse color: {raw}");
    Ok(match raw {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Grey,
        "dark gray" | "dark grey" => Color::DarkGrey,
        "dark red" => Color::DarkRed,
        "dark green" => Color::DarkGreen,
        "dark yellow" => Color::DarkYellow,
        "dark blue" => Color::DarkBlue,
        "dark magenta" => Color::DarkMagenta,
        "dark cyan" => Color::DarkCyan,
        hex if hex.starts_with('#') => {
            let hex = &hex[1..];
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(err());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
            Color::Rgb {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
            }
        }
        idx => Color::AnsiValue(idx.parse::<u8>().map_err(|_| err())?),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() -> Result<()> {
        let config_str = fs::read_to_string("default_config.toml").wrap_err("Couldn't read default config file")?;
        let config: Config = toml::from_str(&config_str).wrap_err("Couldn't parse default config file")?;

        assert_eq!(Config::default(), config);

        Ok(())
    }

    #[test]
    fn test_logs_resolve_filter() {
        let mut logs = LogsConfig::default();
        assert_eq!(logs.resolve_filter(None), None);
        assert_eq!(logs.resolve_filter(Some("  ".into())), None);
        assert_eq!(logs.resolve_filter(Some("debug".into())).as_deref(), Some("debug"));

        logs.enabled = true;
        logs.filter = "devcli=trace".into();
        assert_eq!(logs.resolve_filter(None).as_deref(), Some("devcli=trace"));
        assert_eq!(logs.resolve_filter(Some("warn".into())).as_deref(), Some("warn"));
    }

    #[test]
    fn test_parse_style_empty() {
        assert_eq!(parse_style("").unwrap(), ContentStyle::new());
        assert_eq!(parse_style("default").unwrap(), ContentStyle::new());
    }

    #[test]
    fn test_parse_style_with_modifiers() {
        let style = parse_style("underline dim dark red").unwrap();
        assert_eq!(style.foreground_color, Some(Color::DarkRed));
        let mut expected = Attributes::none();
        expected.set(Attribute::Underlined);
        expected.set(Attribute::Dim);
        assert_eq!(style.attributes, expected);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0064"), Ok(Color::Rgb { r: 255, g: 0, b: 100 }));
        assert_eq!(parse_color("6"), Ok(Color::AnsiValue(6)));
        assert_eq!(parse_color("#ff00"), Err(String::from("Unable to parse color: #ff00")));
        assert_eq!(parse_color("1234"), Err(String::from("Unable to parse color: 1234")));
    }

    #[test]
    fn test_missing_api_key() {
        let config = AiConfig {
            api_key_env: String::from("DEVCLI_TEST_SURELY_UNSET_KEY"),
            ..Default::default()
        };
        assert_eq!(
            config.api_key(),
            Err(UserFacingError::AiMissingApiKey(String::from("DEVCLI_TEST_SURELY_UNSET_KEY")))
        );
    }
}
