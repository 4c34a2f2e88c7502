use std::{fmt, sync::LazyLock};

use itertools::Itertools;
use regex::{Regex, RegexBuilder};

/// Fenced code block, optionally tagged, wrapping a `/pattern/flags` literal
static FENCED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[\w-]*\s*/(.+?)/([a-zA-Z]*)\s*```").unwrap());

/// A `/pattern/flags` literal anywhere in a single line
static DELIMITED_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(.+?)/([a-zA-Z]*)").unwrap());

/// Separators between example strings
static EXAMPLE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;]+").unwrap());

/// Matching-mode modifiers for a pattern.
///
/// Only `i`, `m` and `s` are recognized, any other flag character is ignored.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct PatternFlags {
    /// `i`: letters match both upper and lower case
    pub ignore_case: bool,
    /// `m`: `^` and `$` match at line boundaries
    pub multiline: bool,
    /// `s`: `.` also matches new lines
    pub dot_all: bool,
}

impl PatternFlags {
    /// Parses the flag characters following a `/pattern/` literal
    pub fn parse(raw: &str) -> Self {
        raw.chars().fold(Self::default(), |mut flags, c| {
            match c {
                'i' => flags.ignore_case = true,
                'm' => flags.multiline = true,
                's' => flags.dot_all = true,
                other => tracing::trace!("Ignoring unsupported pattern flag '{other}'"),
            }
            flags
        })
    }

    /// Whether no flag is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignore_case {
            f.write_str("i")?;
        }
        if self.multiline {
            f.write_str("m")?;
        }
        if self.dot_all {
            f.write_str("s")?;
        }
        Ok(())
    }
}

/// Where an [ExtractedPattern] was found on the AI response
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
pub enum ExtractionSource {
    /// A `/pattern/flags` literal inside a fenced code block
    #[strum(to_string = "code block")]
    FencedBlock,
    /// A `/pattern/flags` literal anywhere on the text
    #[strum(to_string = "inline literal")]
    Delimited,
    /// The first line of the response, taken verbatim
    #[strum(to_string = "first line")]
    FirstLine,
}

impl ExtractionSource {
    /// Strategies in priority order, the first one finding a pattern wins
    pub const ORDERED: [ExtractionSource; 3] = [Self::FencedBlock, Self::Delimited, Self::FirstLine];

    /// Runs this strategy over the given text
    fn extract(self, text: &str) -> Option<ExtractedPattern> {
        let (raw, flags) = match self {
            Self::FencedBlock => {
                let caps = FENCED_PATTERN.captures(text)?;
                (caps[1].trim().to_owned(), PatternFlags::parse(&caps[2]))
            }
            Self::Delimited => {
                let caps = DELIMITED_PATTERN.captures(text)?;
                (caps[1].to_owned(), PatternFlags::parse(&caps[2]))
            }
            Self::FirstLine => {
                let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
                (line.to_owned(), PatternFlags::default())
            }
        };
        (!raw.is_empty()).then_some(ExtractedPattern {
            raw,
            flags,
            source: self,
        })
    }
}

/// A pattern extracted from a free-form AI response
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExtractedPattern {
    /// The pattern itself, without delimiters
    pub raw: String,
    /// The flags found next to the pattern
    pub flags: PatternFlags,
    /// The strategy that found it
    pub source: ExtractionSource,
}

impl ExtractedPattern {
    /// Extracts a pattern from the given text.
    ///
    /// This never fails: when no `/pattern/flags` literal is found, the first line of the text is used as the pattern.
    pub fn extract(text: &str) -> Self {
        ExtractionSource::ORDERED
            .into_iter()
            .find_map(|strategy| strategy.extract(text))
            .unwrap_or_else(|| {
                tracing::warn!("Blank AI response, using it verbatim as the pattern");
                Self {
                    raw: text.to_owned(),
                    flags: PatternFlags::default(),
                    source: ExtractionSource::FirstLine,
                }
            })
    }

    /// Compiles this pattern with its flags
    pub fn compile(&self) -> Result<CompiledPattern, PatternError> {
        CompiledPattern::new(&self.raw, self.flags)
    }

    /// Compiles the pattern and finds every match on the sample text, reporting syntax errors as a failed result
    pub fn test(&self, sample: &str) -> MatchResult {
        match self.compile() {
            Ok(compiled) => MatchResult::Matches(compiled.find_all(sample)),
            Err(err) => {
                tracing::debug!("Pattern '{}' is not valid: {}", self.raw, err.message);
                MatchResult::Invalid(err.message)
            }
        }
    }
}

impl fmt::Display for ExtractedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.raw, self.flags)
    }
}

/// The pattern couldn't be compiled
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PatternError {
    /// The message reported by the regex engine
    pub message: String,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid pattern: {}", self.message)
    }
}

/// A validated pattern, ready to be matched
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    regex: Regex,
}

impl CompiledPattern {
    /// Compiles the pattern, mapping the flags into the regex engine options
    pub fn new(pattern: &str, flags: PatternFlags) -> Result<Self, PatternError> {
        RegexBuilder::new(pattern)
            .case_insensitive(flags.ignore_case)
            .multi_line(flags.multiline)
            .dot_matches_new_line(flags.dot_all)
            .build()
            .map(|regex| Self { regex })
            .map_err(|err| PatternError {
                message: err.to_string(),
            })
    }

    /// Finds all non-overlapping matches, from left to right.
    ///
    /// Without capturing groups each match is the whole matched text, with a single group it's that group's text and
    /// with more groups it's the tuple of every group (empty when the group didn't participate).
    pub fn find_all(&self, text: &str) -> Vec<PatternMatch> {
        let groups = self.regex.captures_len() - 1;
        self.regex
            .captures_iter(text)
            .map(|caps| {
                let group = |i: usize| caps.get(i).map(|m| m.as_str().to_owned()).unwrap_or_default();
                match groups {
                    0 => PatternMatch::Text(group(0)),
                    1 => PatternMatch::Text(group(1)),
                    n => PatternMatch::Groups((1..=n).map(group).collect()),
                }
            })
            .collect()
    }
}

/// A single match of a [CompiledPattern]
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PatternMatch {
    /// The matched text, or the text of the only capturing group
    Text(String),
    /// The text of every capturing group
    Groups(Vec<String>),
}

impl fmt::Display for PatternMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternMatch::Text(text) => write!(f, "{text:?}"),
            PatternMatch::Groups(groups) => write!(f, "({})", groups.iter().map(|g| format!("{g:?}")).join(", ")),
        }
    }
}

/// The outcome of testing a pattern against some sample text
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MatchResult {
    /// The pattern is valid, with its matches in scan order
    Matches(Vec<PatternMatch>),
    /// The pattern couldn't be compiled
    Invalid(String),
}

impl MatchResult {
    /// Whether the pattern was valid
    pub fn is_ok(&self) -> bool {
        matches!(self, MatchResult::Matches(_))
    }

    /// The matches found, if the pattern was valid
    pub fn matches(&self) -> Option<&[PatternMatch]> {
        match self {
            MatchResult::Matches(matches) => Some(matches),
            MatchResult::Invalid(_) => None,
        }
    }

    /// The engine error message, if the pattern was not valid
    pub fn error_message(&self) -> Option<&str> {
        match self {
            MatchResult::Matches(_) => None,
            MatchResult::Invalid(msg) => Some(msg),
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Matches(matches) => write!(f, "[{}]", matches.iter().join(", ")),
            MatchResult::Invalid(msg) => write!(f, "Invalid pattern: {msg}"),
        }
    }
}

/// Builds the text to match against from a comma or semicolon separated list of examples.
///
/// Every example is trimmed, empty ones are discarded and the rest are joined by a single space.
pub fn build_sample_text(examples: &str) -> String {
    EXAMPLE_SEPARATORS
        .split(examples)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .join(" ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_extract_fenced_block() {
        let response = "Here is a pattern for that:\n\n```regex\n/^\\d{3}-\\d{4}$/gm\n```\n\nIt matches phone numbers \
                        like /555/ in the middle.";
        let pattern = ExtractedPattern::extract(response);
        assert_eq!(pattern.raw, r"^\d{3}-\d{4}$");
        assert_eq!(
            pattern.flags,
            PatternFlags {
                ignore_case: false,
                multiline: true,
                dot_all: false,
            }
        );
        assert_eq!(pattern.source, ExtractionSource::FencedBlock);
    }

    #[test]
    fn test_extract_untagged_fence_with_slashes_inside() {
        let pattern = ExtractedPattern::extract("```\n/https?:\\/\\/[a-z.]+\\/\\w+/i\n```");
        assert_eq!(pattern.raw, r"https?:\/\/[a-z.]+\/\w+");
        assert!(pattern.flags.ignore_case);
        assert_eq!(pattern.source, ExtractionSource::FencedBlock);
    }

    #[test]
    fn test_extract_delimited() {
        let pattern = ExtractedPattern::extract("Pattern: /colou?r/i\nFlags: i\nExplanation: optional u");
        assert_eq!(pattern.raw, "colou?r");
        assert_eq!(pattern.flags.to_string(), "i");
        assert_eq!(pattern.source, ExtractionSource::Delimited);
    }

    #[test]
    fn test_extract_first_line_fallback() {
        let pattern = ExtractedPattern::extract("  [A-Z]{2}\\d+  \nThis matches a code");
        assert_eq!(pattern.raw, r"[A-Z]{2}\d+");
        assert!(pattern.flags.is_empty());
        assert_eq!(pattern.source, ExtractionSource::FirstLine);

        // Even when the line is plainly not a pattern
        let pattern = ExtractedPattern::extract("Sure! Here is what you asked for");
        assert_eq!(pattern.raw, "Sure! Here is what you asked for");
    }

    #[test]
    fn test_extract_blank_response() {
        let pattern = ExtractedPattern::extract("   ");
        assert_eq!(pattern.raw, "   ");
        assert_eq!(pattern.source, ExtractionSource::FirstLine);
    }

    #[test]
    fn test_flags_drop_unsupported() {
        assert_eq!(
            PatternFlags::parse("gimsuxii"),
            PatternFlags {
                ignore_case: true,
                multiline: true,
                dot_all: true,
            }
        );
        assert!(PatternFlags::parse("gyu").is_empty());

        let pattern = ExtractedPattern::extract("```js\n/abc/gyq\n```");
        assert_eq!(pattern.raw, "abc");
        assert!(pattern.flags.is_empty());
    }

    #[test]
    fn test_flags_mapping() {
        let pattern = ExtractedPattern::extract("/^hello.world$/ims");
        let res = pattern.test("say\nHELLO\nWORLD\nnow");
        assert_eq!(res, MatchResult::Matches(vec![PatternMatch::Text("HELLO\nWORLD".into())]));

        let pattern = ExtractedPattern::extract("/^hello.world$/");
        assert_eq!(pattern.test("say\nHELLO\nWORLD\nnow"), MatchResult::Matches(vec![]));
    }

    #[test]
    fn test_empty_sample() {
        let compiled = CompiledPattern::new(r"\d+", PatternFlags::default()).unwrap();
        assert!(compiled.find_all("").is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let res = ExtractedPattern::extract("(abc").test("abc");
        assert!(!res.is_ok());
        assert!(res.error_message().is_some_and(|m| !m.is_empty()));
        assert!(res.to_string().starts_with("Invalid pattern: "));
    }

    #[test]
    fn test_capturing_groups() {
        let compiled = CompiledPattern::new(r"(\w+)=(\d+)?", PatternFlags::default()).unwrap();
        assert_eq!(
            compiled.find_all("a=1 b= c=3"),
            vec![
                PatternMatch::Groups(vec!["a".into(), "1".into()]),
                PatternMatch::Groups(vec!["b".into(), "".into()]),
                PatternMatch::Groups(vec!["c".into(), "3".into()]),
            ]
        );

        let compiled = CompiledPattern::new(r"#(\d+)", PatternFlags::default()).unwrap();
        assert_eq!(
            compiled.find_all("fixes #12 and #7"),
            vec![PatternMatch::Text("12".into()), PatternMatch::Text("7".into())]
        );
    }

    #[test]
    fn test_sample_text() {
        assert_eq!(build_sample_text(" a, b;;c ,, ;d "), "a b c d");
        assert_eq!(build_sample_text(" ,; "), "");
    }

    #[test]
    fn test_email_scenario() {
        let response = "Pattern:\n```regex\n/[\\w.+-]+@[\\w-]+\\.[\\w.]+/g\n```\nExplanation: matches emails";
        let sample = build_sample_text("user@example.com, admin@test.org");
        let res = ExtractedPattern::extract(response).test(&sample);
        assert_eq!(
            res,
            MatchResult::Matches(vec![
                PatternMatch::Text("user@example.com".into()),
                PatternMatch::Text("admin@test.org".into()),
            ])
        );
        assert_eq!(res.to_string(), r#"["user@example.com", "admin@test.org"]"#);
    }
}
