//! File utility functions

use std::path::{Path, PathBuf};

/// Resolve a user-supplied path to an absolute path.
///
/// `~` and `~/rest` expand to the home directory. Relative paths are joined
/// onto the current working directory. Absolute paths pass through.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if path.is_empty() {
        return cwd();
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => dirs::home_dir()
            .map(|home| home.join(&rest[1..]))
            .unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        cwd().join(expanded)
    } else {
        expanded
    }
}

/// Build a file name of the form `<stem>_<token>.<extension>` inside `dir`.
pub fn unique_file_in(dir: &Path, stem: &str, token: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", stem, token, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_absolute_unix() {
        assert_eq!(expand_path("/var/lib/sieve.db"), PathBuf::from("/var/lib/sieve.db"));
    }

    #[test]
    fn test_expand_path_bare_name() {
        let result = expand_path("sieve.db");
        assert!(result.is_absolute());
        assert!(result.ends_with("sieve.db"));
    }

    #[test]
    fn test_expand_path_empty_is_cwd() {
        assert_eq!(expand_path("  "), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_expand_path_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/data/sieve.db"), home.join("data/sieve.db"));
        }
    }

    #[test]
    fn test_unique_file_in() {
        let path = unique_file_in(Path::new("/tmp/out"), "dog", "ab12", "csv");
        assert_eq!(path, PathBuf::from("/tmp/out/dog_ab12.csv"));
    }
}
