use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use fragstore::FragmentStore;
use thiserror::Error;

use crate::runtime::SyncPolicy;

/// Smallest OpenGL version the harness compiles against.
pub const MIN_GL_VERSION: GlVersion = GlVersion { major: 3, minor: 3 };

/// Requested OpenGL context version. Also selects the `#version` pragma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlVersion {
    major: u8,
    minor: u8,
}

impl GlVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn major(self) -> u8 {
        self.major
    }

    pub fn minor(self) -> u8 {
        self.minor
    }

    /// `#version 330 core` for 3.3, `#version 460 core` for 4.6.
    pub fn glsl_directive(self) -> String {
        format!("#version {}{}0 core", self.major, self.minor)
    }
}

impl Default for GlVersion {
    fn default() -> Self {
        MIN_GL_VERSION
    }
}

impl fmt::Display for GlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GlVersionError {
    #[error("invalid OpenGL version `{0}` (expected MAJOR.MINOR, e.g. 3.3)")]
    Malformed(String),
    #[error("OpenGL {0} is below the supported minimum {min}", min = MIN_GL_VERSION)]
    TooOld(GlVersion),
}

impl FromStr for GlVersion {
    type Err = GlVersionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || GlVersionError::Malformed(value.to_string());
        let (major, minor) = value.trim().split_once('.').ok_or_else(malformed)?;
        let major: u8 = major.parse().map_err(|_| malformed())?;
        let minor: u8 = minor.parse().map_err(|_| malformed())?;
        if minor > 9 {
            return Err(malformed());
        }
        let version = GlVersion::new(major, minor);
        if version < MIN_GL_VERSION {
            return Err(GlVersionError::TooOld(version));
        }
        Ok(version)
    }
}

/// Everything the renderer needs to open its window and find shaders.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub title: String,
    /// Initial windowed size in physical pixels.
    pub window_size: (u32, u32),
    pub store: FragmentStore,
    pub gl_version: GlVersion,
    pub sync: SyncPolicy,
    /// Enter borderless fullscreen the first time the window is shown.
    pub fullscreen: bool,
    /// When set, every wrapped fragment source is written here before compiling.
    pub dump_source: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            title: "Shader Playground".to_string(),
            window_size: (1280, 720),
            store: FragmentStore::default(),
            gl_version: GlVersion::default(),
            sync: SyncPolicy::default(),
            fullscreen: false,
            dump_source: None,
        }
    }
}

impl RendererConfig {
    pub fn new(store: FragmentStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width.max(1), height.max(1));
        self
    }

    pub fn with_gl_version(mut self, version: GlVersion) -> Self {
        self.gl_version = version;
        self
    }

    pub fn with_sync(mut self, sync: SyncPolicy) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_dump_source(mut self, path: Option<PathBuf>) -> Self {
        self.dump_source = path;
        self
    }
}
