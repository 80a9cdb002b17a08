use derivative::Derivative;
use enum_map::Enum;

/// Id of a declaration inside a module.
pub type Id = u32;

/// The SPIR-V version as a pair `(major, minor)`.
pub type Version = (u8, u8);

/// Pipeline stage a module was compiled for.
#[derive(Clone, Copy, Debug, Derivative, Enum, Eq, Hash, PartialEq)]
#[derivative(Default)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
    #[derivative(Default)]
    Unknown,
}

/// Reflected shape of a variable or block member.
#[derive(Clone, Copy, Debug, Derivative, Eq, Hash, PartialEq)]
#[derivative(Default)]
pub enum Format {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    Mat2,
    Mat3,
    Mat4,
    /// A uniform block.
    Structure,
    /// A storage block (`BufferBlock`-decorated struct).
    Buffer,
    SampledImage,
    #[derivative(Default)]
    Unknown,
}

impl Format {
    /// Byte size of one element of this format, or `None` for blocks,
    /// images, and shapes the binding model cannot size.
    pub fn size(self) -> Option<u32> {
        Some(match self {
            Self::Float | Self::Int => 4,
            Self::Float2 | Self::Int2 => 8,
            Self::Float3 | Self::Int3 => 12,
            Self::Float4 | Self::Int4 => 16,
            Self::Mat4 => 16 * 4,
            _ => return None,
        })
    }
}

/// Element count of an array variable or member.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ArrayCount {
    Fixed(u32),
    /// A runtime-sized array; its length is known only at bind time.
    Unbounded,
}

impl Default for ArrayCount {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

/// Byte size of a block member.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MemberSize {
    Bytes(u32),
    /// The member is a runtime-sized array tail.
    Unbounded,
}

impl MemberSize {
    #[inline]
    pub fn bytes(self) -> Option<u32> {
        match self {
            Self::Bytes(size) => Some(size),
            Self::Unbounded => None,
        }
    }
}

impl Default for MemberSize {
    fn default() -> Self {
        Self::Bytes(0)
    }
}

/// A stage input variable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Input {
    pub format: Format,
    pub location: u32,
    pub set: u32,
    /// Debug name, or empty if the module was stripped.
    pub name: String,
}

/// A stage output variable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Output {
    pub format: Format,
    pub location: u32,
    pub name: String,
}

/// A bindable resource: a uniform block, storage block, or sampled
/// image.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Uniform {
    pub format: Format,
    pub binding: u32,
    pub set: u32,
    pub array_count: ArrayCount,
    pub name: String,
    /// Block members in declaration order; empty for non-block formats.
    pub members: Vec<UniformMember>,
}

/// One member of a block, with its offset within the enclosing struct.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UniformMember {
    pub format: Format,
    pub offset: u32,
    pub size: MemberSize,
    pub name: String,
    /// Nested members if this member is itself a struct.
    pub members: Vec<UniformMember>,
}

/// A push-constant block. Push constants are a single anonymous range
/// per stage and carry no binding or set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PushConstant {
    pub format: Format,
    pub name: String,
    pub members: Vec<UniformMember>,
}

/// Total size of a block laid out with every member starting at a
/// 16-byte boundary, or `None` if the block ends in a runtime-sized
/// array.
///
/// This matches the layout the toolkit's shader pipeline has always
/// produced, not std140/std430 packing; changing it would break offsets
/// baked into already-compiled assets.
pub fn size_of_block(members: &[UniformMember]) -> Option<u32> {
    let mut size = 0u32;
    for member in members {
        size = (size + 0xf) & !0xf;
        size += member.size.bytes()?;
    }
    Some(size)
}
