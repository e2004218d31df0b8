use serde_json::{Map, Value};

use crate::env;
use crate::error::HereditasError;
use crate::file;
use crate::reconcile::Reconciler;
use crate::settings::{self, Settings, SettingsInput};
use crate::types::{Priority, SearchPath};

/// Entry point for building a [`Reconciler`].
pub struct Hereditas;

impl Hereditas {
    pub fn builder() -> HereditasBuilder {
        HereditasBuilder::new()
    }
}

/// Builder for loading reconciler settings and constructing a [`Reconciler`].
///
/// Settings files named [`file_name()`](Self::file_name) are read from every
/// search path (lowest priority first), then `{PREFIX}__*` environment
/// variables, then overrides set here.
pub struct HereditasBuilder {
    app_name: String,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    env_prefix: Option<String>,
    env_enabled: bool,
    reject_unknown: bool,
    overrides: Map<String, Value>,
}

impl HereditasBuilder {
    fn new() -> Self {
        Self {
            app_name: "hereditas".into(),
            file_name: None,
            search_paths: None,
            env_prefix: None,
            env_enabled: true,
            reject_unknown: true,
            overrides: Map::new(),
        }
    }

    /// Set the application name. This derives the defaults for the settings
    /// file name (`"{app_name}.toml"`), the platform config directory and the
    /// env prefix (uppercased).
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = name.to_string();
        self
    }

    /// Override the settings file name (default: `"{app_name}.toml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths (`[Platform, Cwd]`) entirely.
    ///
    /// Paths are listed in priority-ascending order: the last entry wins.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(default_search_paths)
            .push(path);
        self
    }

    /// Override the environment variable prefix (default: uppercased `app_name`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Reject unknown keys in settings files (default: `true`).
    pub fn reject_unknown_settings(mut self, reject: bool) -> Self {
        self.reject_unknown = reject;
        self
    }

    /// Override one setting by dotted key. `None` values are ignored, which
    /// suits optional clap args.
    pub fn override_setting<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            let segments: Vec<&str> = key.split('.').collect();
            env::insert_nested(&mut self.overrides, &segments, v.into());
        }
        self
    }

    pub fn priority(self, priority: Priority) -> Self {
        self.override_setting("priority", Some(priority.as_str()))
    }

    /// Validate decisions before merging (the `strict` setting).
    pub fn strict(self, strict: bool) -> Self {
        self.override_setting("strict", Some(strict))
    }

    pub fn advanced(self, advanced: bool) -> Self {
        self.override_setting("advanced", Some(advanced))
    }

    fn effective_file_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!("{}.toml", self.app_name),
        }
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        self.search_paths
            .clone()
            .unwrap_or_else(default_search_paths)
    }

    fn effective_env_prefix(&self) -> Option<String> {
        if !self.env_enabled {
            return None;
        }
        Some(
            self.env_prefix
                .clone()
                .unwrap_or_else(|| self.app_name.to_uppercase()),
        )
    }

    fn build_input(self) -> Result<SettingsInput, HereditasError> {
        let files = file::load_settings_files(
            &self.effective_search_paths(),
            &self.effective_file_name(),
            &self.app_name,
        )?;
        let env_prefix = self.effective_env_prefix();
        let env_vars: Vec<(String, String)> = match env_prefix {
            Some(_) => std::env::vars().collect(),
            None => Vec::new(),
        };

        Ok(SettingsInput {
            files,
            env_vars,
            env_prefix,
            overrides: self.overrides,
            reject_unknown: self.reject_unknown,
        })
    }

    /// Resolve settings through all layers.
    pub fn load_settings(self) -> Result<Settings, HereditasError> {
        settings::resolve_settings(self.build_input()?)
    }

    /// Resolve settings and build a [`Reconciler`].
    pub fn build(self) -> Result<Reconciler, HereditasError> {
        Ok(Reconciler::new(self.load_settings()?))
    }
}

fn default_search_paths() -> Vec<SearchPath> {
    vec![SearchPath::Platform, SearchPath::Cwd]
}
