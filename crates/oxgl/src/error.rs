use thiserror::Error;

use crate::kind::ResourceKind;

#[derive(Error, Debug)]
pub enum GlError {
    #[error("Context returned no object when creating a {0}")]
    Allocation(ResourceKind),

    #[error("Texture unit {unit} out of range (context has {capacity} units)")]
    UnitOutOfRange { unit: u32, capacity: u32 },

    #[error("Shader objects need a stage; use Resource::new_shader")]
    ShaderStageRequired,

    #[error("Failed to load GL context: {0}")]
    ContextLoad(String),

    #[error("Unsupported by this context: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, GlError>;
