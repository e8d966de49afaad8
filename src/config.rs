//! The application-facing entry point: discovery plus a root view.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::paths::{SearchPaths, CONFIG_FILENAME};
use crate::source::Source;
use crate::value::{Map, Value};
use crate::view::RootView;

/// A named application's configuration: platform file discovery layered
/// under runtime overrides.
///
/// `Configuration` dereferences to its [`RootView`], so views, reads
/// and template extraction are used directly on it:
///
/// ```no_run
/// use quince::Configuration;
///
/// let config = Configuration::new("myapp")?;
/// let workers = config.at("workers").get_i64()?;
/// # Ok::<(), quince::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct Configuration {
    appname: String,
    paths: SearchPaths,
    root: RootView,
}

impl Configuration {
    /// Discover and read the configuration files for an application.
    ///
    /// A file that exists but cannot be read or parsed aborts
    /// construction with [`ConfigError::SourceRead`]; silently ignoring
    /// a broken file would let typos downgrade explicit settings to
    /// defaults.
    pub fn new(appname: &str) -> Result<Configuration, ConfigError> {
        Configuration::with_paths(appname, SearchPaths::discover(appname))
    }

    /// Read configuration files from an explicit set of directories.
    pub fn with_paths(appname: &str, paths: SearchPaths) -> Result<Configuration, ConfigError> {
        let mut config = Configuration {
            appname: appname.to_string(),
            paths,
            root: RootView::new(Vec::new()),
        };
        config.read()?;
        Ok(config)
    }

    /// The application name this configuration was discovered for.
    pub fn appname(&self) -> &str {
        &self.appname
    }

    /// The directories searched for configuration files.
    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }

    /// Read the discovered configuration files, inserting them above
    /// every current source (but below the overlay).
    ///
    /// Called by the constructors; calling it again picks up files that
    /// changed on disk, shadowing the previously read copies.
    pub fn read(&mut self) -> Result<(), ConfigError> {
        let files = self.paths.existing_files();
        debug!(appname = %self.appname, count = files.len(), "reading configuration files");
        // Insert in reverse so the first discovered file ends up with
        // the highest priority.
        for file in files.iter().rev() {
            let source = Source::from_file(file, false)?;
            self.root.add_override(source);
        }
        if let Some(dir) = self.first_dir_with_file() {
            self.root.set_base_dir(dir);
        } else if let Some(first) = self.paths.dirs().first() {
            self.root.set_base_dir(first.clone());
        }
        Ok(())
    }

    /// Append a packaged-defaults file with the lowest priority.
    ///
    /// Relative filenames validated out of this source resolve against
    /// the file's own directory, so defaults can ship data files next
    /// to themselves.
    pub fn add_default_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let source = Source::from_file(path.as_ref(), true)?;
        self.root.add(source);
        Ok(())
    }

    /// Overlay parsed command-line arguments above every file source.
    ///
    /// Entries whose value is [`Value::Null`] mean "not given on the
    /// command line" and are dropped, so absent flags never shadow file
    /// settings.
    pub fn set_args(&mut self, args: impl Into<Map>) {
        let mut filtered = Map::new();
        for (key, value) in args.into() {
            if !value.is_null() {
                filtered.insert(key, value);
            }
        }
        self.root.add_override(Source::new(Value::Mapping(filtered)));
    }

    /// The directory to write this application's configuration into.
    ///
    /// The first search directory that already contains a configuration
    /// file wins; when none does, the first candidate directory is
    /// created (recursively) and returned.
    pub fn config_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = self.first_dir_with_file() {
            return Ok(dir);
        }
        let Some(first) = self.paths.dirs().first() else {
            return Err(ConfigError::NotFound {
                name: format!("configuration directory for {}", self.appname),
            });
        };
        std::fs::create_dir_all(first).map_err(|err| ConfigError::SourceRead {
            path: first.clone(),
            source: err.into(),
        })?;
        debug!(dir = %first.display(), "created configuration directory");
        Ok(first.clone())
    }

    fn first_dir_with_file(&self) -> Option<PathBuf> {
        self.paths
            .dirs()
            .iter()
            .find(|dir| dir.join(CONFIG_FILENAME).is_file())
            .cloned()
    }
}

impl Deref for Configuration {
    type Target = RootView;

    fn deref(&self) -> &RootView {
        &self.root
    }
}

impl DerefMut for Configuration {
    fn deref_mut(&mut self) -> &mut RootView {
        &mut self.root
    }
}
