use derive_more::Display;

use spv::{Format, ReflectError};

/// Errors from shader loading and layout construction.
#[derive(Debug, Display)]
#[non_exhaustive]
pub enum ShaderError {
    #[display(fmt = "{}", _0)]
    Io(std::io::Error),
    /// The byte buffer cannot be a module: not a whole number of words.
    #[display(fmt = "module size {} is not a multiple of the word size", _0)]
    UnalignedModule(usize),
    #[display(fmt = "reflection failed: {}", _0)]
    Reflect(ReflectError),
    /// The format is not a bindable resource.
    #[display(fmt = "no descriptor type for {:?}", _0)]
    UnsupportedDescriptor(Format),
    /// Two stages declared the same set/binding with different shapes.
    #[display(fmt = "conflicting declarations for set {} binding {}", _0, _1)]
    BindingConflict(u32, u32),
    /// A push-constant block with no members has no range.
    #[display(fmt = "push constant block {:?} is empty", _0)]
    EmptyPushConstant(String),
    /// Runtime-sized data cannot live in a push-constant range.
    #[display(fmt = "push constant block {:?} has unbounded size", _0)]
    UnboundedPushConstant(String),
    /// A vertex-format member names an input the shader does not declare.
    #[display(fmt = "vertex shader has no input named {:?}", _0)]
    MissingVertexInput(String),
}

pub type Result<T> = std::result::Result<T, ShaderError>;

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Reflect(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShaderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ReflectError> for ShaderError {
    fn from(err: ReflectError) -> Self {
        Self::Reflect(err)
    }
}
