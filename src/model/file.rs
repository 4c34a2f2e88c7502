use std::{fmt, path::PathBuf};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// A file found by the large file scanner
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LargeFileEntry {
    /// Path of the file, relative to the scanned root when possible
    pub path: PathBuf,
    /// Size of the file in bytes
    pub size_bytes: u64,
}

/// A number of bytes displayed with binary units (`1.5 MB`)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HumanSize(pub u64);

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut size = self.0 as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            write!(f, "{} {}", self.0, UNITS[0])
        } else {
            write!(f, "{size:.1} {}", UNITS[unit])
        }
    }
}

/// Parses a size like `500`, `10KB`, `5 MB` or `1.5gb` into bytes
pub fn parse_size(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let number: f64 = number.parse().map_err(|_| format!("Invalid size: {raw}"))?;
    let unit = unit.trim().to_ascii_uppercase();
    let exp = match unit.as_str() {
        "" | "B" => 0,
        "K" | "KB" => 1,
        "M" | "MB" => 2,
        "G" | "GB" => 3,
        "T" | "TB" => 4,
        _ => return Err(format!("Invalid size unit: {unit}")),
    };
    Ok((number * 1024f64.powi(exp)) as u64)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(HumanSize(512).to_string(), "512 B");
        assert_eq!(HumanSize(1536).to_string(), "1.5 KB");
        assert_eq!(HumanSize(5 * 1024 * 1024).to_string(), "5.0 MB");
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("500"), Ok(500));
        assert_eq!(parse_size("10KB"), Ok(10 * 1024));
        assert_eq!(parse_size("5 mb"), Ok(5 * 1024 * 1024));
        assert_eq!(parse_size("1.5G"), Ok(1536 * 1024 * 1024));
        assert_eq!(parse_size("12 parsecs"), Err(String::from("Invalid size unit: PARSECS")));
        assert!(parse_size("MB").is_err());
    }
}
