/// Marker appended to text truncated for display
pub const TRUNCATED_MARKER: &str = "...(truncated)";

/// Returns the first `max_chars` characters of the given text
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((ix, _)) => &text[..ix],
        None => text,
    }
}

/// Truncates the text to `max_chars` characters, appending a [TRUNCATED_MARKER] line if anything was removed
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(text, max_chars);
    if truncated.len() < text.len() {
        format!("{truncated}\n{TRUNCATED_MARKER}")
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("ñandú", 3), "ñan");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_truncate_for_display() {
        assert_eq!(truncate_for_display("short", 3000), "short");
        let long = "a".repeat(3005);
        let display = truncate_for_display(&long, 3000);
        assert!(display.ends_with("\n...(truncated)"));
        assert_eq!(display.len(), 3000 + 1 + TRUNCATED_MARKER.len());
    }
}
