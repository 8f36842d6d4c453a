use std::path::PathBuf;

use fragstore::PreprocessError;
use thiserror::Error;

use crate::gpu::ShaderStage;

/// Everything that can go wrong while turning a shader name into a linked
/// program.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("shader `{name}` not found at {}", path.display())]
    ShaderNotFound { name: String, path: PathBuf },

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    Link { log: String },

    #[error("failed to create {object}: {message}")]
    Create {
        object: &'static str,
        message: String,
    },

    #[error("no shader has been selected")]
    NoShaderSelected,
}
