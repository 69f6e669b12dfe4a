//! Concat list serialization.
//!
//! Serializes an ordered clip plan into the ffconcat list format consumed by
//! `-f concat`. Paths are quoted by construction: a single quote inside a
//! path becomes `'\''`, the demuxer's escape for a quote inside a quoted
//! string. Paths that cannot be represented at all (embedded newlines,
//! non-UTF-8) are rejected as [`MediaError::ListFormat`] instead of emitting
//! a corrupt list.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// One clip slice in a concat list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatEntry {
    pub path: std::path::PathBuf,
    /// Start offset within the clip, seconds.
    pub inpoint: Option<f64>,
    /// End offset within the clip, seconds.
    pub outpoint: Option<f64>,
}

impl ConcatEntry {
    /// A whole-clip entry.
    pub fn whole(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            inpoint: None,
            outpoint: None,
        }
    }

    /// A trimmed entry.
    pub fn trimmed(path: impl Into<std::path::PathBuf>, inpoint: f64, outpoint: f64) -> Self {
        Self {
            path: path.into(),
            inpoint: Some(inpoint),
            outpoint: Some(outpoint),
        }
    }
}

/// Serialize entries into ffconcat syntax.
pub fn render_concat_list(entries: &[ConcatEntry]) -> MediaResult<String> {
    let mut out = String::from("ffconcat version 1.0\n");
    for entry in entries {
        out.push_str(&format!("file {}\n", quote_path(&entry.path)?));
        if let Some(inpoint) = entry.inpoint {
            out.push_str(&format!("inpoint {:.3}\n", inpoint));
        }
        if let Some(outpoint) = entry.outpoint {
            out.push_str(&format!("outpoint {:.3}\n", outpoint));
        }
    }
    Ok(out)
}

/// Write a concat list file.
pub async fn write_concat_list(
    list_path: impl AsRef<Path>,
    entries: &[ConcatEntry],
) -> MediaResult<()> {
    let content = render_concat_list(entries)?;
    fs::write(list_path.as_ref(), content).await?;
    Ok(())
}

/// Quote a path for the concat demuxer.
fn quote_path(path: &Path) -> MediaResult<String> {
    let s = path
        .to_str()
        .ok_or_else(|| MediaError::list_format(format!("non-UTF-8 path: {}", path.display())))?;

    if s.contains('\n') || s.contains('\r') {
        return Err(MediaError::list_format(format!(
            "path contains a line break: {:?}",
            s
        )));
    }

    Ok(escape_single_quoted(s))
}

/// Wrap a string in single quotes, escaping embedded quotes as `'\''`.
fn escape_single_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Parse a quoted path back, applying the same escaping rule in reverse.
/// Used to verify the round-trip property.
#[cfg(test)]
fn unescape_single_quoted(s: &str) -> Option<String> {
    let inner = s.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("'\\''", "'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_plain_path_is_quoted() {
        let list = render_concat_list(&[ConcatEntry::whole("/work/footage/abc.mp4")]).unwrap();
        assert!(list.starts_with("ffconcat version 1.0\n"));
        assert!(list.contains("file '/work/footage/abc.mp4'\n"));
    }

    #[test]
    fn test_trim_points_rendered() {
        let list =
            render_concat_list(&[ConcatEntry::trimmed("/work/a.mp4", 0.0, 4.5)]).unwrap();
        assert!(list.contains("inpoint 0.000\n"));
        assert!(list.contains("outpoint 4.500\n"));
    }

    #[test]
    fn test_single_quote_roundtrip() {
        let original = "/work/it's a clip.mp4";
        let quoted = quote_path(Path::new(original)).unwrap();
        assert_eq!(unescape_single_quoted(&quoted).unwrap(), original);
    }

    #[test]
    fn test_many_quotes_roundtrip() {
        let original = "/work/''weird''/clip'.mp4";
        let quoted = quote_path(Path::new(original)).unwrap();
        assert_eq!(unescape_single_quoted(&quoted).unwrap(), original);
    }

    #[test]
    fn test_newline_in_path_rejected() {
        let err = render_concat_list(&[ConcatEntry::whole(PathBuf::from("/work/a\nb.mp4"))])
            .unwrap_err();
        assert!(matches!(err, MediaError::ListFormat(_)));
    }

    #[tokio::test]
    async fn test_write_concat_list() {
        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("list.txt");
        let entries = vec![
            ConcatEntry::trimmed("/work/a.mp4", 0.0, 5.0),
            ConcatEntry::trimmed("/work/b.mp4", 0.0, 2.5),
        ];
        write_concat_list(&list_path, &entries).await.unwrap();

        let content = tokio::fs::read_to_string(&list_path).await.unwrap();
        assert_eq!(content.matches("file ").count(), 2);
    }
}
