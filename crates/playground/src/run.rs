use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use fragstore::FragmentStore;
use renderer::{ProgramBuilder, ProgramError, Renderer};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::PlaygroundConfig;

const PROMPT: &str = "> ";

const KEY_BINDINGS: &str = "\
Escape          back to the prompt
F5              hot-swap the fragment shader
Shift+F5        full reload
F8              toggle vsync
F9              reset zoom, pan, counters, flags and mode
F11             toggle borderless fullscreen
0-9             toggle vbFlags[n]
Arrow keys      pan while held
= / - / wheel   zoom in / out (Shift for finer steps)
M               cycle mode
] / [           increment / decrement the counter
Mouse buttons   vbMousePressed";

/// Printed once before the first prompt.
fn welcome_banner(store: &FragmentStore) -> String {
    let root = store.root().display();
    let shader_ext = store.shader_extension();
    let include_ext = store.include_extension();
    format!(
        "\
Shader Playground

Write fragment shaders as {root}/<name>.{shader_ext} and type <name> to run one.
Your code defines `void mainImage()` and writes `fragColor`. The harness
supplies `main`, the in/out and uniform declarations, and `#version`.
`#include <path>` inlines {root}/<path>.{include_ext}.

Type `list` for the available shaders, `help` for the keys while rendering,
and `quit` or `exit` to leave.
"
    )
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    Quit,
    List,
    Help,
    Blank,
    Load(String),
}

impl PromptCommand {
    /// `None` is end of input.
    pub fn parse(line: Option<&str>) -> Self {
        let Some(line) = line else {
            return Self::Quit;
        };
        match line.trim() {
            "" => Self::Blank,
            "quit" | "exit" => Self::Quit,
            "list" => Self::List,
            "help" => Self::Help,
            name => Self::Load(name.to_string()),
        }
    }
}

pub fn resolve_config(args: &RunArgs) -> Result<PlaygroundConfig> {
    let (mut config, used) = PlaygroundConfig::discover(args.config.as_deref())?;
    match used {
        Some(path) => tracing::debug!(path = %path.display(), "loaded configuration"),
        None => tracing::debug!("no configuration file; using defaults"),
    }
    config.apply_overrides(args);
    config.validate()?;
    Ok(config)
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let renderer_config = config.renderer_config()?;
    tracing::info!(
        store = %config.store_root.display(),
        gl_version = %config.gl_version,
        "starting shader playground"
    );
    let mut renderer = Renderer::new(renderer_config).context("failed to open render window")?;
    println!("{}", welcome_banner(renderer.store()));

    if let Some(name) = args.shader.as_deref() {
        play(&mut renderer, name)?;
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{PROMPT}");
        io::stdout().flush().context("failed to flush stdout")?;
        let line = lines.next().transpose().context("failed to read from stdin")?;
        match PromptCommand::parse(line.as_deref()) {
            PromptCommand::Quit => break,
            PromptCommand::Blank => {}
            PromptCommand::Help => println!("{KEY_BINDINGS}"),
            PromptCommand::List => print_shader_list(&config)?,
            PromptCommand::Load(name) => play(&mut renderer, &name)?,
        }
    }

    renderer.unload();
    Ok(())
}

/// Loads `name` and runs the render loop until the user returns to the prompt.
fn play(renderer: &mut Renderer, name: &str) -> Result<()> {
    match renderer.load_shader(name) {
        Ok(()) => renderer.run(),
        Err(ProgramError::ShaderNotFound { .. }) => {
            println!("Shader not found.");
            Ok(())
        }
        Err(err) => {
            println!("Failed to load shader '{name}': {err}");
            Ok(())
        }
    }
}

fn print_shader_list(config: &PlaygroundConfig) -> Result<()> {
    let store = config.store();
    let names = store
        .list_shaders()
        .with_context(|| format!("failed to list shaders in {}", store.root().display()))?;
    if names.is_empty() {
        println!("No shaders in {}.", store.root().display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

pub fn list(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    print_shader_list(&config)
}

/// Prints the source the driver would receive for `shader`.
pub fn preprocess(args: RunArgs, shader: &str) -> Result<()> {
    let config = resolve_config(&args)?;
    let builder = ProgramBuilder::new(config.store(), config.gl_version()?)
        .with_dump_path(config.dump_source.clone());
    let source = builder
        .fragment_source(shader)
        .with_context(|| format!("failed to assemble shader '{shader}'"))?;
    print!("{source}");
    Ok(())
}
