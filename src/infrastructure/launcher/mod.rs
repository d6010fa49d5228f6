//! Launcher - locates the repository root and its environment file,
//! applies it, and hands the process over to the bot loop.
//!
//! The binary may live either at the repository root or inside a tools
//! directory one level down. In the latter case the tools directory
//! carries a marker file, and the parent is the root.

use std::path::{Path, PathBuf};

use crate::application::errors::LaunchError;
use crate::infrastructure::config;

/// Marker dropped next to helper binaries installed under the root.
pub const ROOT_MARKER: &str = ".scrapetech-tools";

/// Environment file candidates relative to the root, in preference
/// order.
const ENV_CANDIDATES: [&str; 2] = ["config/.env", ".env"];

/// Resolve the repository root from the directory holding the
/// executable. A marker file means we are one level below the root.
pub fn resolve_root(exe_dir: &Path) -> PathBuf {
    if exe_dir.join(ROOT_MARKER).exists() {
        exe_dir.parent().unwrap_or(exe_dir).to_path_buf()
    } else {
        exe_dir.to_path_buf()
    }
}

/// Find the environment file under `root`. `config/.env` is preferred;
/// `.env` at the root is the fallback. Missing both is fatal and the
/// error names the root-scoped path callers are expected to create.
pub fn find_env_file(root: &Path) -> Result<PathBuf, LaunchError> {
    for candidate in ENV_CANDIDATES {
        let path = root.join(candidate);
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(LaunchError::MissingEnvironment(root.join(".env")))
}

/// Locate and apply the environment, then move the process to the
/// root. After this the bot loop runs with the repository as cwd and
/// the dotenv variables in place.
pub fn activate() -> Result<PathBuf, LaunchError> {
    let exe = std::env::current_exe()?;
    let exe_dir = exe.parent().unwrap_or(Path::new(".")).to_path_buf();
    let root = resolve_root(&exe_dir);

    let env_file = find_env_file(&root)?;
    config::load_dotenv(&env_file)?;
    std::env::set_current_dir(&root)?;
    tracing::info!(root = %root.display(), env = %env_file.display(), "environment activated");
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_the_exe_dir_without_a_marker() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_root(dir.path()), dir.path());
    }

    #[test]
    fn marker_promotes_the_parent_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        std::fs::create_dir(&tools).unwrap();
        std::fs::write(tools.join(ROOT_MARKER), "").unwrap();
        assert_eq!(resolve_root(&tools), dir.path());
    }

    #[test]
    fn prefers_the_config_scoped_env_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join("config/.env"), "A=1\n").unwrap();
        std::fs::write(dir.path().join(".env"), "A=2\n").unwrap();
        let found = find_env_file(dir.path()).unwrap();
        assert_eq!(found, dir.path().join("config/.env"));
    }

    #[test]
    fn falls_back_to_the_root_env_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=2\n").unwrap();
        let found = find_env_file(dir.path()).unwrap();
        assert_eq!(found, dir.path().join(".env"));
    }

    #[test]
    fn missing_env_file_error_names_the_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_env_file(dir.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(&dir.path().join(".env").display().to_string()), "{}", msg);
    }
}
