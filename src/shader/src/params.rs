use enum_map::EnumMap;

use spv::{size_of_block, Format, PushConstant, ShaderStage, Uniform, UniformMember};

use crate::Shader;

/// CPU mirror of a uniform block: a byte buffer written through the
/// block's reflected member offsets, ready for upload.
#[derive(Clone, Debug)]
pub struct UniformData {
    uniform: Uniform,
    data: Vec<u8>,
}

impl UniformData {
    pub fn new(uniform: &Uniform) -> Self {
        assert_eq!(uniform.format, Format::Structure);
        let size = size_of_block(&uniform.members).unwrap_or(0) as usize;
        Self {
            uniform: uniform.clone(),
            data: vec![0; size],
        }
    }

    /// Offset the block starts at; member writes are relative to it.
    pub fn base_offset(&self) -> u32 {
        self.uniform.members.first().map_or(0, |member| member.offset)
    }

    /// Writes `value` over the named member. Returns whether the member
    /// exists. The value must be exactly the member's reflected size.
    pub fn set<T: Copy>(&mut self, name: &str, value: T) -> bool {
        let base = self.base_offset();
        set_member(&self.uniform.members, base, &mut self.data, name, value)
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.uniform.name
    }

    #[inline]
    pub fn binding(&self) -> u32 {
        self.uniform.binding
    }

    #[inline]
    pub fn descriptor_set(&self) -> u32 {
        self.uniform.set
    }

    #[inline]
    pub fn uniform(&self) -> &Uniform {
        &self.uniform
    }
}

/// CPU mirror of a push-constant block.
#[derive(Clone, Debug)]
pub struct PushConstantData {
    block: PushConstant,
    data: Vec<u8>,
}

impl PushConstantData {
    pub fn new(block: &PushConstant) -> Self {
        assert_eq!(block.format, Format::Structure);
        let size = size_of_block(&block.members).unwrap_or(0) as usize;
        Self {
            block: block.clone(),
            data: vec![0; size],
        }
    }

    /// Offset the block starts at; member writes are relative to it.
    pub fn base_offset(&self) -> u32 {
        self.block.members.first().map_or(0, |member| member.offset)
    }

    pub fn set<T: Copy>(&mut self, name: &str, value: T) -> bool {
        let base = self.base_offset();
        set_member(&self.block.members, base, &mut self.data, name, value)
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn block(&self) -> &PushConstant {
        &self.block
    }
}

fn set_member<T: Copy>(
    members: &[UniformMember],
    base: u32,
    data: &mut [u8],
    name: &str,
    value: T,
) -> bool {
    for member in members {
        if member.name != name {
            continue;
        }
        let size = match member.size.bytes() {
            Some(size) => size as usize,
            None => return false,
        };
        assert_eq!(size, std::mem::size_of::<T>());
        let offset = match member.offset.checked_sub(base) {
            Some(offset) => offset as usize,
            None => return false,
        };
        if offset + size > data.len() {
            return false;
        }
        let bytes = unsafe {
            std::slice::from_raw_parts(&value as *const T as *const u8, size)
        };
        data[offset..offset + size].copy_from_slice(bytes);
        return true;
    }
    false
}

/// Per-pipeline parameter storage: one [`UniformData`] per uniform
/// block and per-stage push-constant mirrors, in the shaders'
/// declaration order.
#[derive(Clone, Debug, Default)]
pub struct ShaderParams {
    uniforms: Vec<UniformData>,
    push_constants: EnumMap<ShaderStage, Vec<PushConstantData>>,
}

impl ShaderParams {
    pub fn for_shaders(shaders: &[&Shader]) -> Self {
        let mut params = Self::default();
        for shader in shaders {
            for uniform in shader.uniforms() {
                // Samplers and storage buffers carry no CPU mirror.
                if uniform.format != Format::Structure {
                    continue;
                }
                params.uniforms.push(UniformData::new(uniform));
            }
            for block in shader.push_constants() {
                params.push_constants[shader.stage()].push(PushConstantData::new(block));
            }
        }
        params
    }

    pub fn uniform_by_binding(&mut self, set: u32, binding: u32) -> Option<&mut UniformData> {
        self.uniforms
            .iter_mut()
            .find(|data| data.descriptor_set() == set && data.binding() == binding)
    }

    #[inline]
    pub fn uniforms(&self) -> &[UniformData] {
        &self.uniforms
    }

    #[inline]
    pub fn push_constants(&mut self, stage: ShaderStage) -> &mut [PushConstantData] {
        &mut self.push_constants[stage]
    }
}
