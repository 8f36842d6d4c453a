use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use fragstore::FragmentStore;
use renderer::{GlVersion, RendererConfig, SyncPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::RunArgs;

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "ShaderPlayground";
const APPLICATION: &str = "shader-playground";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings read from `config.toml`, overridable from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaygroundConfig {
    pub store_root: PathBuf,
    pub shader_extension: String,
    pub include_extension: String,
    pub window_size: [u32; 2],
    pub vsync: bool,
    pub fullscreen: bool,
    pub gl_version: String,
    pub dump_source: Option<PathBuf>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from(fragstore::DEFAULT_ROOT),
            shader_extension: fragstore::DEFAULT_SHADER_EXTENSION.to_string(),
            include_extension: fragstore::DEFAULT_INCLUDE_EXTENSION.to_string(),
            window_size: [1280, 720],
            vsync: true,
            fullscreen: false,
            gl_version: GlVersion::default().to_string(),
            dump_source: None,
        }
    }
}

/// Per-user location of `config.toml`, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

impl PlaygroundConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents, path)
    }

    fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the explicitly requested file, or the per-user one when it exists,
    /// or falls back to defaults. Returns the file actually read.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        match default_config_path() {
            Some(path) if path.is_file() => Ok((Self::load(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }

    /// Command-line flags take precedence over file values.
    pub fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(store) = &args.store {
            self.store_root = store.clone();
        }
        if let Some((width, height)) = args.size {
            self.window_size = [width, height];
        }
        if args.no_vsync {
            self.vsync = false;
        }
        if args.fullscreen {
            self.fullscreen = true;
        }
        if let Some(version) = args.gl_version {
            self.gl_version = version.to_string();
        }
        if let Some(path) = &args.dump_source {
            self.dump_source = Some(path.clone());
        }
    }

    pub fn gl_version(&self) -> Result<GlVersion, ConfigError> {
        self.gl_version
            .parse()
            .map_err(|err| ConfigError::Invalid(format!("gl_version: {err}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [width, height] = self.window_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window_size must be non-zero, got {width}x{height}"
            )));
        }
        validate_extension("shader_extension", &self.shader_extension)?;
        validate_extension("include_extension", &self.include_extension)?;
        self.gl_version()?;
        Ok(())
    }

    pub fn store(&self) -> FragmentStore {
        FragmentStore::new(&self.store_root)
            .with_extensions(&self.shader_extension, &self.include_extension)
    }

    pub fn renderer_config(&self) -> Result<RendererConfig, ConfigError> {
        self.validate()?;
        let [width, height] = self.window_size;
        let sync = if self.vsync {
            SyncPolicy::Vsync
        } else {
            SyncPolicy::Immediate
        };
        Ok(RendererConfig::new(self.store())
            .with_window_size(width, height)
            .with_gl_version(self.gl_version()?)
            .with_sync(sync)
            .with_fullscreen(self.fullscreen)
            .with_dump_source(self.dump_source.clone()))
    }
}

fn validate_extension(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    if value.starts_with('.') {
        return Err(ConfigError::Invalid(format!(
            "{field} must not start with a dot (got `{value}`)"
        )));
    }
    Ok(())
}
