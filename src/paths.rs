//! Platform configuration-directory discovery.

use std::path::PathBuf;

use tracing::debug;

/// The filename looked for in each search directory.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// The ordered list of user configuration base directories for the
/// current platform, most specific first.
///
/// Directories are absolute and deduplicated; an application's own
/// directory is one of these joined with the application name.
pub fn config_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if cfg!(target_os = "macos") {
        if let Some(home) = dirs::home_dir() {
            dirs.push(home.join("Library").join("Application Support"));
            dirs.push(home.join(".config"));
        }
    } else if cfg!(windows) {
        if let Some(roaming) = dirs::config_dir() {
            dirs.push(roaming);
        }
    } else {
        // XDG: honor $XDG_CONFIG_HOME, fall back to ~/.config. The dirs
        // crate applies exactly this rule.
        if let Some(config) = dirs::config_dir() {
            dirs.push(config);
        }
        if let Some(home) = dirs::home_dir() {
            dirs.push(home.join(".config"));
        }
    }

    dirs.dedup();
    dirs
}

/// The ordered directories searched for an application's configuration
/// files.
///
/// Constructed once and injected into
/// [`Configuration`](crate::Configuration), which makes discovery
/// testable: tests build one with [`SearchPaths::with_dirs`] over
/// temporary directories instead of touching the real home directory.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// Discover the search directories for an application.
    ///
    /// An `{APPNAME}DIR` environment variable (appname uppercased, e.g.
    /// `QUINCEDIR` for "quince") overrides the platform list entirely;
    /// otherwise each platform base directory is joined with the
    /// appname.
    pub fn discover(appname: &str) -> SearchPaths {
        let env_var = format!("{}DIR", appname.to_uppercase());
        if let Some(dir) = std::env::var_os(&env_var).filter(|dir| !dir.is_empty()) {
            let dir = PathBuf::from(dir);
            debug!(%env_var, dir = %dir.display(), "using environment override");
            return SearchPaths { dirs: vec![dir] };
        }
        SearchPaths {
            dirs: config_dirs()
                .into_iter()
                .map(|base| base.join(appname))
                .collect(),
        }
    }

    /// Use an explicit directory list, highest priority first.
    pub fn with_dirs(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> SearchPaths {
        SearchPaths {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// The search directories, highest priority first.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// The configuration files that exist, highest priority first.
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .filter(|file| file.is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_files_in_priority_order() {
        let high = tempfile::tempdir().unwrap();
        let low = tempfile::tempdir().unwrap();
        std::fs::write(high.path().join(CONFIG_FILENAME), "a: 1\n").unwrap();
        std::fs::write(low.path().join(CONFIG_FILENAME), "a: 2\n").unwrap();

        let paths = SearchPaths::with_dirs([high.path(), low.path()]);
        let files = paths.existing_files();
        assert_eq!(files.len(), 2);
        assert!(files[0].starts_with(high.path()));
        assert!(files[1].starts_with(low.path()));
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let empty = tempfile::tempdir().unwrap();
        let filled = tempfile::tempdir().unwrap();
        std::fs::write(filled.path().join(CONFIG_FILENAME), "a: 1\n").unwrap();

        let paths = SearchPaths::with_dirs([empty.path(), filled.path()]);
        assert_eq!(paths.existing_files().len(), 1);
    }

    #[test]
    fn test_config_dirs_are_absolute() {
        for dir in config_dirs() {
            assert!(dir.is_absolute());
        }
    }
}
