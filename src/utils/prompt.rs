use std::{
    fmt::Display,
    io::{self, Write},
    sync::LazyLock,
};

use color_eyre::eyre::Context;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Theme,
    errors::{Result, UserFacingError},
};

/// Lines read from the standard input.
///
/// A single reader is shared so that a read interrupted by a cancellation is resumed by the next prompt instead of
/// losing the line.
static STDIN_LINES: LazyLock<Mutex<Lines<BufReader<Stdin>>>> =
    LazyLock::new(|| Mutex::new(BufReader::new(tokio::io::stdin()).lines()));

/// Interactive prompts on the terminal, cancellable with the given token
pub struct Prompter<'a> {
    theme: &'a Theme,
    cancellation_token: &'a CancellationToken,
}

impl<'a> Prompter<'a> {
    /// Creates a new prompter
    pub fn new(theme: &'a Theme, cancellation_token: &'a CancellationToken) -> Self {
        Self {
            theme,
            cancellation_token,
        }
    }

    /// Asks for a line of text, which might be empty
    pub async fn text(&self, label: &str) -> Result<String> {
        self.print_label(label, None)?;
        self.read_line().await
    }

    /// Asks for a line of text, returning the default value if left empty
    pub async fn text_or(&self, label: &str, default: &str) -> Result<String> {
        self.print_label(label, Some(default))?;
        let input = self.read_line().await?;
        Ok(if input.is_empty() { default.to_string() } else { input })
    }

    /// Asks for a non-empty line of text
    pub async fn required(&self, label: &str) -> Result<String> {
        let input = self.text(label).await?;
        if input.is_empty() {
            Err(UserFacingError::EmptyInput.into())
        } else {
            Ok(input)
        }
    }

    /// Asks a yes/no question
    pub async fn confirm(&self, label: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            self.print_label(label, Some(hint))?;
            let input = self.read_line().await?;
            match parse_confirmation(&input, default) {
                Some(answer) => return Ok(answer),
                None => println!("{}", self.theme.warning.apply("Please answer 'y' or 'n'")),
            }
        }
    }

    /// Asks to pick one of the given options, displayed as a numbered list
    pub async fn select<T>(&self, label: &str, options: &[T]) -> Result<T>
    where
        T: Display + Clone,
    {
        for (ix, option) in options.iter().enumerate() {
            println!("  {} {option}", self.theme.accent.apply(format!("{}.", ix + 1)));
        }
        loop {
            self.print_label(label, Some(&format!("1-{}", options.len())))?;
            let input = self.read_line().await?;
            match parse_selection(&input, options.len()) {
                Some(ix) => return Ok(options[ix].clone()),
                None => println!("{}", self.theme.warning.apply("Invalid choice")),
            }
        }
    }

    /// Opens the user's editor to input multi-line text
    pub async fn editor(&self, label: &str) -> Result<String> {
        println!("{}", self.theme.secondary.apply(format!("Opening editor for {label} ...")));
        let content = tokio::task::spawn_blocking(|| edit::edit(""))
            .await
            .wrap_err("Editor task panicked")?
            .wrap_err("Couldn't open the editor")?;
        Ok(content.trim().to_string())
    }

    fn print_label(&self, label: &str, hint: Option<&str>) -> Result<()> {
        let mut stdout = io::stdout();
        match hint {
            Some(hint) => write!(
                stdout,
                "{} {} ",
                self.theme.primary.apply(label),
                self.theme.secondary.apply(format!("[{hint}]:"))
            )?,
            None => write!(stdout, "{} ", self.theme.primary.apply(format!("{label}:")))?,
        }
        stdout.flush()?;
        Ok(())
    }

    /// Reads a trimmed line from stdin, the end of the input is reported as a cancellation
    async fn read_line(&self) -> Result<String> {
        let mut lines = STDIN_LINES.lock().await;
        let line = tokio::select! {
            biased;
            _ = self.cancellation_token.cancelled() => {
                println!();
                return Err(UserFacingError::Cancelled.into());
            }
            line = lines.next_line() => line.wrap_err("Couldn't read from stdin")?,
        };
        match line {
            Some(line) => Ok(line.trim().to_string()),
            None => {
                tracing::info!("Reached the end of the input");
                println!();
                Err(UserFacingError::Cancelled.into())
            }
        }
    }
}

/// Parses a yes/no answer, empty input returns the default
fn parse_confirmation(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Parses a 1-based choice into a 0-based index
fn parse_selection(input: &str, len: usize) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_confirmation() {
        assert_eq!(parse_confirmation("", true), Some(true));
        assert_eq!(parse_confirmation("  ", false), Some(false));
        assert_eq!(parse_confirmation("Y", false), Some(true));
        assert_eq!(parse_confirmation("yes", false), Some(true));
        assert_eq!(parse_confirmation("No", true), Some(false));
        assert_eq!(parse_confirmation("maybe", true), None);
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1", 3), Some(0));
        assert_eq!(parse_selection(" 3 ", 3), Some(2));
        assert_eq!(parse_selection("0", 3), None);
        assert_eq!(parse_selection("4", 3), None);
        assert_eq!(parse_selection("two", 3), None);
    }
}
