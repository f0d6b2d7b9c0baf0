//! Line-oriented directive files.
//!
//! Each non-blank line is `keyword value...`; `#` starts a comment. Keywords
//! are matched exactly, values are left as written for the caller to judge.

use std::io;
use std::path::Path;

/// One `keyword value...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub keyword: String,
    pub values: Vec<String>,
}

impl Directive {
    /// The first value token, if the line has one.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Read and tokenize a directive file.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// stray Latin-1 comment cannot hide the directives around it.
pub fn read_directives(path: &Path) -> io::Result<Vec<Directive>> {
    let bytes = std::fs::read(path)?;
    Ok(parse_directives(&String::from_utf8_lossy(&bytes)))
}

/// Directives from `path`, or none if it cannot be read.
///
/// A missing file is an ordinary "nothing configured"; any other failure is
/// logged as a warning since settings in the file are being ignored.
pub fn load_or_empty(path: &Path) -> Vec<Directive> {
    match read_directives(path) {
        Ok(directives) => directives,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No directive file, using defaults");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Directive file unreadable, using defaults"
            );
            Vec::new()
        }
    }
}

/// Tokenize directive text. Lines that carry only a comment are dropped.
pub fn parse_directives(text: &str) -> Vec<Directive> {
    text.lines()
        .filter_map(|line| {
            let content = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            };
            let mut words = content.split_ascii_whitespace();
            let keyword = words.next()?.to_string();
            Some(Directive {
                keyword,
                values: words.map(str::to_string).collect(),
            })
        })
        .collect()
}

/// The last directive named `keyword`, so later lines override earlier ones.
pub fn last_named<'a>(directives: &'a [Directive], keyword: &str) -> Option<&'a Directive> {
    directives.iter().rev().find(|d| d.keyword == keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "\n# leading comment\n   \nall.role server\noss.localroot /data # trailing\n";
        let directives = parse_directives(text);
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].keyword, "all.role");
        assert_eq!(directives[0].value(), Some("server"));
        assert_eq!(directives[1].values, vec!["/data".to_string()]);
    }

    #[test]
    fn test_keyword_without_value() {
        let directives = parse_directives("redirlocal.readonlyredirect\n");
        assert_eq!(directives[0].value(), None);
    }

    #[test]
    fn test_last_named_prefers_later_lines() {
        let directives = parse_directives("a.b one\nc.d x\na.b two\n");
        assert_eq!(last_named(&directives, "a.b").and_then(Directive::value), Some("two"));
        assert!(last_named(&directives, "A.B").is_none());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("redir-local-does-not-exist.cfg");
        assert!(read_directives(&path).is_err());
        assert!(load_or_empty(&path).is_empty());
    }

    #[test]
    fn test_non_utf8_comment_does_not_hide_directives() {
        let path = std::env::temp_dir().join(format!(
            "redir-local-directives-{}.cfg",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, b"# Zugriff f\xfcr Leser\nredirlocal.readonlyredirect true\n").unwrap();
        let directives = read_directives(&path);
        std::fs::remove_file(&path).unwrap();
        let directives = directives.unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].value(), Some("true"));
    }
}
