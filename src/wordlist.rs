// src/wordlist.rs
// =============================================================================
// Loads the list of candidate paths from the input file.
//
// Format: one path per line, taken verbatim. Nothing is trimmed or validated,
// an empty line becomes an empty path (which probes "<target>/"). Both "\n"
// and "\r\n" line endings are accepted.
// =============================================================================

use std::path::Path;

use crate::error::{SweepError, SweepResult};

/// Reads the wordlist at `path` into an ordered list of path segments.
///
/// An empty file gives an empty list. A missing file, a permission problem or
/// non UTF-8 content is an `Input` error.
pub async fn load_paths(path: &Path) -> SweepResult<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SweepError::Input {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(split_lines(&content))
}

fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "method-sweep-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_split_lines_verbatim() {
        let paths = split_lines("admin\n login \n\napi/v1\r\n");
        assert_eq!(paths, vec!["admin", " login ", "", "api/v1"]);
    }

    #[test]
    fn test_split_lines_without_trailing_newline() {
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[tokio::test]
    async fn test_load_paths_from_file() {
        let path = temp_file("words.txt", b"admin\nlogin\n");
        let paths = load_paths(&path).await.unwrap();
        assert_eq!(paths, vec!["admin", "login"]);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_load_paths_empty_file() {
        let path = temp_file("empty.txt", b"");
        let paths = load_paths(&path).await.unwrap();
        assert!(paths.is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_load_paths_missing_file() {
        let path = std::env::temp_dir().join("method-sweep-does-not-exist.txt");
        let err = load_paths(&path).await.unwrap_err();
        assert!(matches!(err, SweepError::Input { .. }));
    }

    #[tokio::test]
    async fn test_load_paths_rejects_binary() {
        let path = temp_file("binary.txt", &[0xff, 0xfe, 0x00, 0x41]);
        let err = load_paths(&path).await.unwrap_err();
        assert!(matches!(err, SweepError::Input { .. }));
        let _ = std::fs::remove_file(path);
    }
}
