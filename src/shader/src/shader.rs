use std::path::Path;

use byteorder::{ByteOrder, NativeEndian};
use log::{debug, error};

use spv::{Input, Output, PushConstant, Reflection, ShaderStage, Uniform};

use crate::{Result, ShaderError};

/// A compiled module plus everything reflection recovered from it.
///
/// Construction fails if the module cannot be fully reflected; a shader
/// whose bindings are uncertain cannot be bound correctly, so it is
/// excluded from use instead of guessed at. The failed construct is
/// logged along with the shader's name.
#[derive(Debug)]
pub struct Shader {
    name: String,
    code: Vec<u32>,
    reflection: Reflection,
}

impl Shader {
    pub fn from_words(name: impl Into<String>, code: Vec<u32>) -> Result<Self> {
        let name = name.into();
        let reflection = match Reflection::new(&code) {
            Ok(reflection) => reflection,
            Err(err) => {
                error!("shader {:?} is invalid: {}", name, err);
                return Err(err.into());
            }
        };
        debug!(
            "loaded shader {:?}: {:?}, {} inputs, {} outputs, {} uniforms, {} push constant blocks",
            name,
            reflection.stage(),
            reflection.inputs().len(),
            reflection.outputs().len(),
            reflection.uniforms().len(),
            reflection.push_constants().len(),
        );
        Ok(Self { name, code, reflection })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(ShaderError::UnalignedModule(bytes.len()));
        }
        let mut code = vec![0u32; bytes.len() / 4];
        NativeEndian::read_u32_into(bytes, &mut code);
        Self::from_words(name, code)
    }

    /// A convenience method for loading a compiled module off the disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path.display().to_string(), &bytes)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn code(&self) -> &[u32] {
        &self.code
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.reflection.stage()
    }

    #[inline]
    pub fn entry_point(&self) -> &str {
        self.reflection.entry_point()
    }

    #[inline]
    pub fn inputs(&self) -> &[Input] {
        self.reflection.inputs()
    }

    #[inline]
    pub fn outputs(&self) -> &[Output] {
        self.reflection.outputs()
    }

    #[inline]
    pub fn uniforms(&self) -> &[Uniform] {
        self.reflection.uniforms()
    }

    #[inline]
    pub fn push_constants(&self) -> &[PushConstant] {
        self.reflection.push_constants()
    }

    #[inline]
    pub fn reflection(&self) -> &Reflection {
        &self.reflection
    }
}
