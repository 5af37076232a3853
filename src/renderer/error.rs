use thiserror::Error;

use super::shader::ShaderStage;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no rendering context available: {0}")]
    MissingContext(String),

    #[error("{stage:?} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {log}")]
    ProgramLink { log: String },

    #[error("failed to create {kind}: {reason}")]
    ResourceCreation { kind: &'static str, reason: String },

    #[error("trying to bind {0} that hasn't been created yet")]
    UnrealizedBind(&'static str),

    #[error("failed to decode texture image: {0}")]
    TextureDecode(#[from] image::ImageError),

    #[error("OBJ parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
