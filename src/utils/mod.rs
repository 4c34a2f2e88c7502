/// Macro to format an error message with theme's error style.
///
/// # Examples
/// ```rust
/// # use devcli::format_error;
/// # use devcli::config::Theme;
/// # let theme = Theme::default();
/// let msg = format_error!(theme, "Invalid value");
/// let msg = format_error!(theme, "Invalid value: {}", 42);
/// ```
#[macro_export]
macro_rules! format_error {
    ($theme:expr, $($arg:tt)*) => {
        format!("{}{}", $theme.error.apply("[Error] "), format!($($arg)*))
    }
}

/// Macro to format a warning message with theme's warning style
#[macro_export]
macro_rules! format_warning {
    ($theme:expr, $($arg:tt)*) => {
        format!("{}{}", $theme.warning.apply("[Warning] "), format!($($arg)*))
    }
}

/// Macro to format an information message with theme's style.
///
/// # Examples
/// ```rust
/// # use devcli::format_msg;
/// # use devcli::config::Theme;
/// # let theme = Theme::default();
/// let msg = format_msg!(theme, "Succesful operation");
/// ```
#[macro_export]
macro_rules! format_msg {
    ($theme:expr, $($arg:tt)*) => {
        format!("{}{}", $theme.accent.apply("-> "), format!($($arg)*))
    }
}

/// Declares a `mod` and uses it
#[macro_export]
macro_rules! using {
    ($($v:vis $p:ident),* $(,)?) => {
        $(
            mod $p;
            $v use self::$p::*;
        )*
    }
}

using! {
    pub process,
    pub prompt,
    pub string,
}

/// Frames of the spinner displayed while waiting for a response
pub const SPINNER_CHARS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Separator printed around AI responses
pub const SEPARATOR: &str = "────────────────────────────────────────────────────────────";
