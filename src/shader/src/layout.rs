use std::convert::TryFrom;

use bitflags::bitflags;
use fnv::FnvHashMap;
use log::warn;
use more_asserts::assert_lt;
use smallvec::SmallVec;

use spv::{ArrayCount, Format, MemberSize, PushConstant, ShaderStage};

use crate::{Result, Shader, ShaderError};

bitflags! {
    /// Stages a binding or push-constant range is visible to.
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

impl From<ShaderStage> for ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::Fragment => Self::FRAGMENT,
            ShaderStage::Compute => Self::COMPUTE,
            ShaderStage::Unknown => Self::empty(),
        }
    }
}

/// Descriptor kinds the binding model distinguishes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DescriptorType {
    UniformBufferDynamic,
    StorageBuffer,
    CombinedImageSampler,
}

impl TryFrom<Format> for DescriptorType {
    type Error = ShaderError;

    fn try_from(format: Format) -> std::result::Result<Self, Self::Error> {
        Ok(match format {
            Format::Structure => Self::UniformBufferDynamic,
            Format::Buffer => Self::StorageBuffer,
            Format::SampledImage => Self::CombinedImageSampler,
            other => return Err(ShaderError::UnsupportedDescriptor(other)),
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub ty: DescriptorType,
    pub count: u32,
    pub stages: ShaderStageFlags,
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct DescriptorSetLayoutDesc {
    /// Bindings in ascending binding order, without duplicates.
    pub bindings: SmallVec<[DescriptorSetLayoutBinding; 4]>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PushConstantRange {
    pub stages: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// Everything a pipeline layout needs, derived purely from reflection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PipelineLayoutDesc {
    /// Set layouts in ascending set order.
    pub set_layouts: Vec<(u32, DescriptorSetLayoutDesc)>,
    pub push_constant_ranges: SmallVec<[PushConstantRange; 2]>,
}

/// Range covered by a push-constant block: from the first member's
/// offset through the end of the last member.
pub fn push_constant_range(
    block: &PushConstant,
    stages: ShaderStageFlags,
) -> Result<PushConstantRange> {
    let (first, last) = match (block.members.first(), block.members.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ShaderError::EmptyPushConstant(block.name.clone())),
    };
    let size = match last.size {
        MemberSize::Bytes(size) => size,
        MemberSize::Unbounded => {
            return Err(ShaderError::UnboundedPushConstant(block.name.clone()));
        }
    };
    Ok(PushConstantRange {
        stages,
        offset: first.offset,
        size: last.offset + size - first.offset,
    })
}

impl PipelineLayoutDesc {
    /// Merges the resource interfaces of the shaders bound to one
    /// pipeline. A binding used by several stages gets their stage
    /// flags OR-ed together; a binding declared with two different
    /// shapes is a configuration error.
    pub fn for_shaders(shaders: &[&Shader]) -> Result<Self> {
        let mut sets: FnvHashMap<u32, FnvHashMap<u32, DescriptorSetLayoutBinding>> =
            Default::default();
        let mut push_constant_ranges = SmallVec::new();

        for shader in shaders {
            let stages = ShaderStageFlags::from(shader.stage());
            for uniform in shader.uniforms() {
                let ty = DescriptorType::try_from(uniform.format)?;
                let count = match uniform.array_count {
                    ArrayCount::Fixed(count) => count,
                    ArrayCount::Unbounded => {
                        warn!(
                            "descriptor array {:?} is runtime-sized; binding a single descriptor",
                            uniform.name,
                        );
                        1
                    }
                };
                let bindings = sets.entry(uniform.set).or_default();
                match bindings.get_mut(&uniform.binding) {
                    Some(existing) => {
                        if existing.ty != ty || existing.count != count {
                            return Err(ShaderError::BindingConflict(
                                uniform.set,
                                uniform.binding,
                            ));
                        }
                        existing.stages |= stages;
                    }
                    None => {
                        bindings.insert(uniform.binding, DescriptorSetLayoutBinding {
                            binding: uniform.binding,
                            ty,
                            count,
                            stages,
                        });
                    }
                }
            }

            for block in shader.push_constants() {
                push_constant_ranges.push(push_constant_range(block, stages)?);
            }
        }

        let mut set_layouts: Vec<_> = sets
            .into_iter()
            .map(|(set, bindings)| {
                let mut bindings: SmallVec<[DescriptorSetLayoutBinding; 4]> =
                    bindings.into_iter().map(|(_, binding)| binding).collect();
                bindings.sort_by_key(|binding| binding.binding);
                (set, DescriptorSetLayoutDesc { bindings })
            })
            .collect();
        set_layouts.sort_by_key(|&(set, _)| set);

        let desc = Self { set_layouts, push_constant_ranges };
        desc.validate();
        Ok(desc)
    }

    fn validate(&self) {
        for (_, layout) in &self.set_layouts {
            for pair in layout.bindings.windows(2) {
                // No duplicates and no redundant permutations of the
                // same bindings downstream.
                assert_lt!(pair[0].binding, pair[1].binding);
            }
        }
    }
}
