use log::warn;
use smallvec::SmallVec;

use spv::{Format, ShaderStage};

use crate::{Result, Shader, ShaderError};

/// How a vertex buffer advances.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InputRate {
    Vertex,
    Instance,
}

impl Default for InputRate {
    fn default() -> Self {
        Self::Vertex
    }
}

/// Declaration of one vertex buffer's memory layout. Members are matched
/// against a shader's inputs by name.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct VertexFormat {
    pub name: String,
    pub stride: u32,
    pub rate: InputRate,
    pub members: Vec<VertexMember>,
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct VertexMember {
    pub name: String,
    pub format: Format,
    pub offset: u32,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
    pub rate: InputRate,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

/// Vertex bindings and attributes for a pipeline, produced by matching a
/// vertex shader's inputs against buffer declarations.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct VertexInputLayout {
    pub bindings: SmallVec<[VertexBinding; 2]>,
    pub attributes: SmallVec<[VertexAttribute; 8]>,
}

impl VertexInputLayout {
    /// One binding per declared format, in order. A member that names an
    /// input the shader does not declare is a configuration error: the
    /// declaration and the shader disagree about the vertex interface.
    pub fn for_shader(shader: &Shader, formats: &[VertexFormat]) -> Result<Self> {
        assert_eq!(shader.stage(), ShaderStage::Vertex);
        let mut layout = Self::default();
        for (index, format) in formats.iter().enumerate() {
            let binding = index as u32;
            layout.bindings.push(VertexBinding {
                binding,
                stride: format.stride,
                rate: format.rate,
            });
            for member in &format.members {
                let input = shader
                    .inputs()
                    .iter()
                    .find(|input| input.name == member.name)
                    .ok_or_else(|| ShaderError::MissingVertexInput(member.name.clone()))?;
                if input.format != member.format {
                    warn!(
                        "vertex member {:?} declared as {:?} but the shader reads {:?}",
                        member.name, member.format, input.format,
                    );
                }
                layout.attributes.push(VertexAttribute {
                    location: input.location,
                    binding,
                    format: input.format,
                    offset: member.offset,
                });
            }
        }
        Ok(layout)
    }
}
