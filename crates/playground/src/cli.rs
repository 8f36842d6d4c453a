use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::GlVersion;

/// Environment variable consulted when `--config` is not given.
pub const ENV_CONFIG: &str = "SHADER_PLAYGROUND_CONFIG";

#[derive(Parser, Debug)]
#[command(
    name = "shader-playground",
    author,
    version,
    about = "Live GLSL fragment shader playground",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Shader to load straight away (name inside the store, without extension).
    #[arg(value_name = "SHADER")]
    pub shader: Option<String>,

    /// Configuration file (TOML).
    #[arg(long, value_name = "FILE", env = ENV_CONFIG, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding `.frag` shaders and `.glsl` includes.
    #[arg(long, value_name = "DIR", global = true)]
    pub store: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Swap buffers without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Start in borderless fullscreen.
    #[arg(long)]
    pub fullscreen: bool,

    /// OpenGL context version, also used for the `#version` pragma (minimum 3.3).
    #[arg(long, value_name = "MAJOR.MINOR", value_parser = parse_gl_version, global = true)]
    pub gl_version: Option<GlVersion>,

    /// Write every wrapped fragment source to PATH before compiling it.
    #[arg(long, value_name = "PATH")]
    pub dump_source: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the shaders available in the store.
    List,
    /// Print the fully assembled fragment source for SHADER without opening a window.
    Preprocess {
        #[arg(value_name = "SHADER")]
        shader: String,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (w, h) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window size must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_gl_version(value: &str) -> Result<GlVersion, String> {
    value.parse::<GlVersion>().map_err(|err| err.to_string())
}
