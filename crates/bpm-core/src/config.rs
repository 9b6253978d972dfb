//! Process-level configuration, resolved once at startup and then passed
//! explicitly to the components that need it.

use std::env;
use std::path::PathBuf;

use crate::constant::CACHE_ROOT_ENV;
use crate::error::{BpmError, Result};

/// Resolved configuration for a `bpm` process.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_root: PathBuf,
}

impl Config {
    /// Resolves `BPM_PATH`, falling back to a platform cache directory
    /// (`$HOME/.cache/bpm` on Unix-like systems, via `$XDG_CACHE_HOME` when
    /// set) when the environment variable is absent.
    pub fn resolve() -> Result<Self> {
        let cache_root = match env::var_os(CACHE_ROOT_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_cache_root()?,
        };

        tracing::debug!(cache_root = %cache_root.display(), "resolved config");
        Ok(Self { cache_root })
    }

    #[cfg(test)]
    pub fn with_root(cache_root: PathBuf) -> Self {
        Self { cache_root }
    }
}

fn default_cache_root() -> Result<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CACHE_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join("bpm"));
        }
    }

    let home = env::var_os("HOME")
        .ok_or_else(|| BpmError::Config("neither BPM_PATH, XDG_CACHE_HOME nor HOME is set".into()))?;

    Ok(PathBuf::from(home).join(".cache").join("bpm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_bpm_path_wins() {
        // SAFETY (test-only): this test sets/removes only its own keys and
        // does not run concurrently with other tests reading them.
        unsafe {
            env::set_var(CACHE_ROOT_ENV, "/tmp/custom-bpm-root");
        }
        let cfg = Config::resolve().unwrap();
        assert_eq!(cfg.cache_root, PathBuf::from("/tmp/custom-bpm-root"));
        unsafe {
            env::remove_var(CACHE_ROOT_ENV);
        }
    }
}
