use runway_core::paths::RUNWAY_DIR;
use std::path::{Path, PathBuf};

/// Resolve the directory holding `.runway/`.
///
/// Priority:
/// 1. `--root` flag / `RUNWAY_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.runway/`
/// 3. The user's home directory
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Some(found) = find_upward(&cwd) {
        return found;
    }

    home::home_dir().unwrap_or(cwd)
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(RUNWAY_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_runway_dir_above() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".runway")).unwrap();
        let subdir = dir.path().join("notes/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(find_upward(&subdir).as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_runway_dir_found() {
        let dir = TempDir::new().unwrap();
        let subdir = dir.path().join("a/b");
        std::fs::create_dir_all(&subdir).unwrap();
        let found = find_upward(&subdir);
        assert!(found.map_or(true, |p| !p.starts_with(dir.path())));
    }
}
