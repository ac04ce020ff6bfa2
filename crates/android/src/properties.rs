//! Java `.properties` reader
//!
//! Reads `key.properties` and `local.properties` the way Gradle does via
//! `java.util.Properties.load(InputStream)`:
//!
//! - bytes are ISO-8859-1
//! - `#` / `!` comment lines, blank lines ignored
//! - key ends at the first unescaped `=`, `:` or whitespace
//! - odd trailing backslashes continue a line
//! - `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes
//! - last duplicate key wins
//!
//! A bad `\uXXXX` escape is the only way well-read bytes fail to parse.

use std::collections::BTreeMap;
use std::ops::Range;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors from reading or interpreting a properties file
#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("line {line}: malformed \\uxxxx encoding")]
    MalformedUnicodeEscape { line: usize },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for {key} ({value:?}): {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl PropertiesError {
    /// Line the error refers to, when it comes from parsing
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedUnicodeEscape { line } => Some(*line),
            _ => None,
        }
    }
}

/// A parsed flat key/value mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Read and parse a file; the file is closed before returning
    pub fn load(path: &Path) -> Result<Self, PropertiesError> {
        let bytes = fs::read(path).map_err(|source| PropertiesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse ISO-8859-1 encoded bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PropertiesError> {
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        Self::parse(&text)
    }

    /// Parse already-decoded text
    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let mut entries = BTreeMap::new();

        for line in logical_lines(text) {
            let (key_range, value_range) = split_key_value(&line.text);
            let key = line.unescape(key_range)?;
            let value = line.unescape(value_range)?;
            entries.insert(key, value);
        }

        Ok(Self { entries })
    }

    /// Raw string value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value of `key` parsed as `T`; absent keys are `Ok(None)`
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, PropertiesError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                PropertiesError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// One key/value record, possibly joined from several natural lines
struct LogicalLine {
    text: String,
    /// `(byte offset in text, 1-based natural line number)` per joined line
    segments: Vec<(usize, usize)>,
}

impl LogicalLine {
    /// Natural line holding byte `offset` of the joined text
    fn line_at(&self, offset: usize) -> usize {
        self.segments
            .iter()
            .take_while(|(start, _)| *start <= offset)
            .last()
            .map_or(1, |(_, line)| *line)
    }

    fn unescape(&self, range: Range<usize>) -> Result<String, PropertiesError> {
        let start = range.start;
        unescape(&self.text[range]).map_err(|offset| PropertiesError::MalformedUnicodeEscape {
            line: self.line_at(start + offset),
        })
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Split on `\n`, `\r` and `\r\n`
fn natural_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\n' && c != '\r' {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + 1;
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                start = i + 2;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn logical_lines(text: &str) -> Vec<LogicalLine> {
    let mut logical = Vec::new();
    let mut lines = natural_lines(text).into_iter().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start_matches(is_blank);
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut text = String::new();
        let mut segments = vec![(0, index + 1)];
        let mut current = trimmed;
        loop {
            if !ends_with_continuation(current) {
                text.push_str(current);
                break;
            }
            text.push_str(&current[..current.len() - 1]);
            match lines.next() {
                Some((next_index, next)) => {
                    segments.push((text.len(), next_index + 1));
                    current = next.trim_start_matches(is_blank);
                }
                None => break,
            }
        }

        // A lone continuation followed by a blank line carries no entry
        if text.is_empty() {
            continue;
        }

        logical.push(LogicalLine { text, segments });
    }

    logical
}

/// Byte ranges of the raw (still escaped) key and value in a logical line
fn split_key_value(line: &str) -> (Range<usize>, Range<usize>) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                has_separator = true;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                value_start = i + 1;
                break;
            }
            _ => {}
        }
    }

    for (offset, c) in line[value_start..].char_indices() {
        if is_blank(c) {
            continue;
        }
        if !has_separator && (c == '=' || c == ':') {
            has_separator = true;
            continue;
        }
        return (0..key_end, value_start + offset..line.len());
    }

    (0..key_end, line.len()..line.len())
}

/// Resolve escapes; a malformed `\uXXXX` yields the byte offset of its backslash
fn unescape(raw: &str) -> Result<String, usize> {
    // UTF-16 units so that escaped surrogate pairs combine
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    let mut buf = [0u16; 2];

    while let Some((at, c)) = chars.next() {
        let decoded = if c == '\\' {
            match chars.next() {
                None => break,
                Some((_, 'u')) => {
                    let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                    let unit = if hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit()) {
                        u16::from_str_radix(&hex, 16).ok()
                    } else {
                        None
                    };
                    match unit {
                        Some(unit) => {
                            units.push(unit);
                            continue;
                        }
                        None => return Err(at),
                    }
                }
                Some((_, 't')) => '\t',
                Some((_, 'r')) => '\r',
                Some((_, 'n')) => '\n',
                Some((_, 'f')) => '\x0c',
                Some((_, other)) => other,
            }
        } else {
            c
        };
        units.extend_from_slice(decoded.encode_utf16(&mut buf));
    }

    Ok(String::from_utf16_lossy(&units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_separators() {
        let props = Properties::parse("a=1\nb:2\nc 3\nd = 4\ne\t:\t5\nf\n").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.get("e"), Some("5"));
        assert_eq!(props.get("f"), Some(""));
        assert_eq!(props.len(), 6);
    }

    #[test]
    fn test_only_first_separator_is_consumed() {
        let props = Properties::parse("url = =http://host:8080/x\nk==v\n").unwrap();
        assert_eq!(props.get("url"), Some("=http://host:8080/x"));
        assert_eq!(props.get("k"), Some("=v"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = "# signing\n! legacy comment\n\n   \n  storeFile=release.jks\n";
        let props = Properties::parse(text).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("storeFile"), Some("release.jks"));
    }

    #[test]
    fn test_value_keeps_trailing_whitespace() {
        let props = Properties::parse("keyAlias=upload  \n").unwrap();
        assert_eq!(props.get("keyAlias"), Some("upload  "));
    }

    #[test]
    fn test_line_endings() {
        let props = Properties::parse("a=1\r\nb=2\rc=3").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
    }

    #[test]
    fn test_continuation_lines() {
        let text = "storeFile=keys/\\\n    release.jks\nnext=1\n";
        let props = Properties::parse(text).unwrap();
        assert_eq!(props.get("storeFile"), Some("keys/release.jks"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let props = Properties::parse("path=C:\\\\\nother=x\n").unwrap();
        assert_eq!(props.get("path"), Some("C:\\"));
        assert_eq!(props.get("other"), Some("x"));
    }

    #[test]
    fn test_continuation_at_eof() {
        let props = Properties::parse("a=b\\").unwrap();
        assert_eq!(props.get("a"), Some("b"));
    }

    #[test]
    fn test_comment_marker_inside_continuation_is_data() {
        let props = Properties::parse("a=1\\\n#2\n").unwrap();
        assert_eq!(props.get("a"), Some("1#2"));
    }

    #[test]
    fn test_escapes() {
        let text = "tab=a\\tb\nsep\\=key=v\\:w\nspace\\ key=x\nuni=\\u0041\\u00e9\nother=\\q\n";
        let props = Properties::parse(text).unwrap();
        assert_eq!(props.get("tab"), Some("a\tb"));
        assert_eq!(props.get("sep=key"), Some("v:w"));
        assert_eq!(props.get("space key"), Some("x"));
        assert_eq!(props.get("uni"), Some("Aé"));
        assert_eq!(props.get("other"), Some("q"));
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let props = Properties::parse("emoji=\\uD83D\\uDE00\n").unwrap();
        assert_eq!(props.get("emoji"), Some("\u{1F600}"));
    }

    #[test]
    fn test_malformed_unicode_escape_reports_line() {
        let err = Properties::parse("a=1\n# note\nb=\\u12G4\n").unwrap_err();
        assert!(matches!(err, PropertiesError::MalformedUnicodeEscape { line: 3 }));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_malformed_escape_on_continuation_reports_its_own_line() {
        let text = "keyAlias=upload\nstorePassword=abc\\\n    def\\\n    \\u00zz\n";
        let err = Properties::parse(text).unwrap_err();
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_escape_split_by_continuation_is_joined() {
        let props = Properties::parse("a=\\u00\\\n  41\n").unwrap();
        assert_eq!(props.get("a"), Some("A"));
    }

    #[test]
    fn test_lone_continuation_before_blank_line_is_skipped() {
        let props = Properties::parse("\\\n\nk\\ ey=1\n  \\\n\nx\n").unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), ["k ey", "x"]);
        assert!(!props.contains_key(""));
    }

    #[test]
    fn test_truncated_unicode_escape() {
        let err = Properties::parse("storePassword=\\u00").unwrap_err();
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_latin1_bytes() {
        let props = Properties::from_bytes(b"keyPassword=p\xe4ss\n").unwrap();
        assert_eq!(props.get("keyPassword"), Some("päss"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let props = Properties::parse("storeFile=a.jks\nstoreFile=b.jks\n").unwrap();
        assert_eq!(props.get("storeFile"), Some("b.jks"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_get_parsed() {
        let props = Properties::parse("flutter.versionCode=12\nbad=twelve\n").unwrap();
        assert_eq!(props.get_parsed::<u32>("flutter.versionCode").unwrap(), Some(12));
        assert_eq!(props.get_parsed::<u32>("missing").unwrap(), None);

        let err = props.get_parsed::<u32>("bad").unwrap_err();
        assert!(matches!(err, PropertiesError::InvalidValue { .. }));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Properties::load(&dir.path().join("key.properties")).unwrap_err();
        assert!(matches!(err, PropertiesError::Io { .. }));
        assert_eq!(err.line(), None);
    }

    proptest! {
        #[test]
        fn simple_pairs_read_back(
            key in "[a-zA-Z][a-zA-Z0-9._]{0,20}",
            value in "[a-zA-Z0-9./_-][a-zA-Z0-9 ./_-]{0,40}",
        ) {
            let text = format!("{} = {}\n", key, value);
            let props = Properties::parse(&text).unwrap();
            prop_assert_eq!(props.get(&key), Some(value.as_str()));
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = Properties::from_bytes(&bytes);
        }

        #[test]
        fn parsing_is_deterministic(text in "[ -~\n]{0,200}") {
            let first = Properties::parse(&text);
            let second = Properties::parse(&text);
            match (first, second) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(a), Err(b)) => prop_assert_eq!(a.line(), b.line()),
                _ => prop_assert!(false, "parse results differ"),
            }
        }
    }
}
