use num_traits::FromPrimitive;
use spirv_headers as spv;

use crate::parser::{
    instruction_at, parse_header, Instruction, Instructions, SymbolTables, HEADER_LEN,
};
use crate::{
    size_of_block, ArrayCount, Error, Format, Id, Input, MemberSize, Output, PushConstant,
    Result, ShaderStage, Uniform, UniformMember, Version,
};

// Valid modules declare types before use, so type chains never cycle;
// this bounds the damage a corrupt module can do.
const MAX_TYPE_DEPTH: usize = 32;

/// Reflection info for one shader module.
///
/// Decoding either succeeds completely or fails with the first construct
/// that could not be classified; there is no partial result.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Reflection {
    version: Version,
    stage: ShaderStage,
    entry_point: String,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    uniforms: Vec<Uniform>,
    push_constants: Vec<PushConstant>,
}

impl Reflection {
    pub fn new(data: &[u32]) -> Result<Self> {
        let mut decoder = Decoder {
            data,
            tables: Default::default(),
            reflection: Default::default(),
        };
        decoder.decode()?;
        Ok(decoder.reflection)
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Stage inputs in declaration order.
    #[inline]
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Stage outputs in declaration order.
    #[inline]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Bindable resources in declaration order.
    #[inline]
    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    #[inline]
    pub fn push_constants(&self) -> &[PushConstant] {
        &self.push_constants
    }
}

/// A variable or member type with arrays stripped and structs expanded.
#[derive(Debug)]
struct ResolvedType {
    /// The array-stripped type id; for structs this keys the member
    /// name/decoration tables.
    id: Id,
    format: Format,
    count: ArrayCount,
    members: Vec<ResolvedType>,
}

#[derive(Debug)]
struct Decoder<'data> {
    data: &'data [u32],
    tables: SymbolTables,
    reflection: Reflection,
}

impl<'data> Decoder<'data> {
    fn decode(&mut self) -> Result<()> {
        let header = parse_header(self.data)?;
        self.reflection.version = header.version;
        // The id bound is a capacity hint only; clamp it so a corrupt
        // header cannot force a huge allocation.
        self.tables.types.reserve(header.bound.min(1 << 16) as usize);

        for inst in Instructions::new(self.data, HEADER_LEN) {
            let inst = inst?;
            let op = match inst.op {
                Some(op) => op,
                // Unrecognized opcodes are skipped for forward
                // compatibility.
                None => continue,
            };
            match op {
                spv::Op::EntryPoint => self.entry_point(&inst)?,
                spv::Op::Name => {
                    let name = inst.string_at(2)?;
                    self.tables.names.insert(inst.operand(1)?, name);
                }
                spv::Op::MemberName => {
                    let name = inst.string_at(3)?;
                    self.tables
                        .member_names
                        .entry(inst.operand(1)?)
                        .or_default()
                        .insert(inst.operand(2)?, name);
                }
                spv::Op::Decorate => {
                    self.tables
                        .decorations
                        .entry(inst.operand(1)?)
                        .or_default()
                        .push(inst.offset);
                }
                spv::Op::MemberDecorate => {
                    self.tables
                        .member_decorations
                        .entry(inst.operand(1)?)
                        .or_default()
                        .push(inst.offset);
                }
                spv::Op::TypeArray
                | spv::Op::TypeRuntimeArray
                | spv::Op::TypePointer
                | spv::Op::TypeMatrix
                | spv::Op::TypeVector
                | spv::Op::TypeFloat
                | spv::Op::TypeInt
                | spv::Op::TypeStruct
                | spv::Op::TypeSampledImage => {
                    self.tables.types.entry(inst.operand(1)?).or_insert(inst.offset);
                }
                spv::Op::Constant => {
                    self.tables.types.entry(inst.operand(2)?).or_insert(inst.offset);
                }
                spv::Op::Variable => self.variable(&inst)?,
                // Everything reflection needs precedes executable code.
                spv::Op::Function => break,
                _ => {}
            }
        }

        Ok(())
    }

    fn entry_point(&mut self, inst: &Instruction<'data>) -> Result<()> {
        self.reflection.stage = match spv::ExecutionModel::from_u32(inst.operand(1)?) {
            Some(spv::ExecutionModel::Vertex) => ShaderStage::Vertex,
            Some(spv::ExecutionModel::Fragment) => ShaderStage::Fragment,
            Some(spv::ExecutionModel::GLCompute) => ShaderStage::Compute,
            _ => ShaderStage::Unknown,
        };
        self.reflection.entry_point = inst.string_at(3)?;
        Ok(())
    }

    fn variable(&mut self, inst: &Instruction<'data>) -> Result<()> {
        let id = inst.operand(2)?;
        self.tables.types.entry(id).or_insert(inst.offset);

        let class = match spv::StorageClass::from_u32(inst.operand(3)?) {
            Some(class) => class,
            None => return Ok(()),
        };
        match class {
            spv::StorageClass::Input
            | spv::StorageClass::Output
            | spv::StorageClass::Uniform
            | spv::StorageClass::UniformConstant
            | spv::StorageClass::PushConstant => {}
            _ => return Ok(()),
        }

        let resolved = self.resolve_variable(inst)?;
        if resolved.count == ArrayCount::Unbounded && resolved.format != Format::Buffer {
            return Err(Error::MisplacedRuntimeArray(id));
        }

        match class {
            spv::StorageClass::Input => {
                let input = self.build_input(id, &resolved)?;
                self.reflection.inputs.push(input);
            }
            spv::StorageClass::Output => {
                let output = self.build_output(id, &resolved)?;
                self.reflection.outputs.push(output);
            }
            spv::StorageClass::Uniform | spv::StorageClass::UniformConstant => {
                let uniform = self.build_uniform(id, &resolved)?;
                self.reflection.uniforms.push(uniform);
            }
            spv::StorageClass::PushConstant => {
                let block = self.build_push_constant(id, &resolved)?;
                self.reflection.push_constants.push(block);
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    /// The instruction that declared `id`.
    fn type_instruction(&self, id: Id) -> Result<Instruction<'data>> {
        let &offset = self.tables.types.get(&id).ok_or(Error::InvalidModule)?;
        instruction_at(self.data, offset)
    }

    /// A variable's declared type is always a pointer; resolution starts
    /// at its pointee.
    fn resolve_variable(&self, inst: &Instruction<'data>) -> Result<ResolvedType> {
        let pointer = self.type_instruction(inst.operand(1)?)?;
        if pointer.op != Some(spv::Op::TypePointer) {
            return Err(Error::InvalidModule);
        }
        self.resolve_type(pointer.operand(3)?, 0)
    }

    fn resolve_type(&self, id: Id, depth: usize) -> Result<ResolvedType> {
        if depth > MAX_TYPE_DEPTH {
            return Err(Error::LimitExceeded);
        }

        let inst = self.type_instruction(id)?;
        let (id, count, inst) = match inst.op {
            Some(spv::Op::TypeRuntimeArray) => {
                let element = inst.operand(2)?;
                (element, ArrayCount::Unbounded, self.type_instruction(element)?)
            }
            Some(spv::Op::TypeArray) => {
                let element = inst.operand(2)?;
                let length = self.constant_value(inst.operand(3)?)?;
                (element, ArrayCount::Fixed(length), self.type_instruction(element)?)
            }
            _ => (id, ArrayCount::Fixed(1), inst),
        };

        let format = self.classify(&inst, id)?;
        let mut members = Vec::new();
        if let Format::Structure | Format::Buffer = format {
            for &member in inst.words.get(2..).unwrap_or(&[]) {
                members.push(self.resolve_type(member, depth + 1)?);
            }
        }

        Ok(ResolvedType { id, format, count, members })
    }

    fn classify(&self, inst: &Instruction<'data>, id: Id) -> Result<Format> {
        Ok(match inst.op {
            Some(spv::Op::TypeFloat) => Format::Float,
            Some(spv::Op::TypeInt) => Format::Int,
            Some(spv::Op::TypeVector) => self.classify_vector(inst)?,
            Some(spv::Op::TypeMatrix) => self.classify_matrix(inst)?,
            Some(spv::Op::TypeStruct) => self.classify_struct(id)?,
            Some(spv::Op::TypeSampledImage) => Format::SampledImage,
            _ => Format::Unknown,
        })
    }

    fn classify_vector(&self, inst: &Instruction<'data>) -> Result<Format> {
        let component = self.type_instruction(inst.operand(2)?)?;
        let count = inst.operand(3)?;
        Ok(match (component.op, count) {
            (Some(spv::Op::TypeFloat), 2) => Format::Float2,
            (Some(spv::Op::TypeFloat), 3) => Format::Float3,
            (Some(spv::Op::TypeFloat), 4) => Format::Float4,
            (Some(spv::Op::TypeInt), 2) => Format::Int2,
            (Some(spv::Op::TypeInt), 3) => Format::Int3,
            (Some(spv::Op::TypeInt), 4) => Format::Int4,
            _ => Format::Unknown,
        })
    }

    fn classify_matrix(&self, inst: &Instruction<'data>) -> Result<Format> {
        let column = self.type_instruction(inst.operand(2)?)?;
        if column.op != Some(spv::Op::TypeVector) {
            return Ok(Format::Unknown);
        }
        let count = inst.operand(3)?;
        Ok(match (self.classify_vector(&column)?, count) {
            (Format::Float2, 2) => Format::Mat2,
            (Format::Float3, 3) => Format::Mat3,
            (Format::Float4, 4) => Format::Mat4,
            _ => Format::Unknown,
        })
    }

    fn classify_struct(&self, id: Id) -> Result<Format> {
        for deco in self.decorations(id) {
            let deco = deco?;
            if spv::Decoration::from_u32(deco.operand(2)?) == Some(spv::Decoration::BufferBlock) {
                return Ok(Format::Buffer);
            }
        }
        Ok(Format::Structure)
    }

    fn constant_value(&self, id: Id) -> Result<u32> {
        let inst = self.type_instruction(id)?;
        if inst.op != Some(spv::Op::Constant) {
            return Err(Error::NonConstantArrayLength(id));
        }
        inst.operand(3)
    }

    fn decorations(
        &self,
        id: Id,
    ) -> impl Iterator<Item = Result<Instruction<'data>>> + '_ {
        let data = self.data;
        self.tables
            .decorations
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&offset| instruction_at(data, offset))
    }

    fn member_decorations(
        &self,
        id: Id,
    ) -> impl Iterator<Item = Result<Instruction<'data>>> + '_ {
        let data = self.data;
        self.tables
            .member_decorations
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&offset| instruction_at(data, offset))
    }

    fn name(&self, id: Id) -> String {
        self.tables.names.get(&id).cloned().unwrap_or_default()
    }

    fn member_offset(&self, struct_id: Id, index: u32) -> Result<Option<u32>> {
        for deco in self.member_decorations(struct_id) {
            let deco = deco?;
            if deco.operand(2)? != index {
                continue;
            }
            if spv::Decoration::from_u32(deco.operand(3)?) == Some(spv::Decoration::Offset) {
                return Ok(Some(deco.operand(4)?));
            }
        }
        Ok(None)
    }

    fn build_input(&self, id: Id, resolved: &ResolvedType) -> Result<Input> {
        let mut input = Input {
            format: checked_format(resolved)?,
            name: self.name(id),
            ..Default::default()
        };
        for deco in self.decorations(id) {
            let deco = deco?;
            match spv::Decoration::from_u32(deco.operand(2)?) {
                Some(spv::Decoration::Location) => input.location = deco.operand(3)?,
                Some(spv::Decoration::DescriptorSet) => input.set = deco.operand(3)?,
                _ => {}
            }
        }
        Ok(input)
    }

    fn build_output(&self, id: Id, resolved: &ResolvedType) -> Result<Output> {
        let mut output = Output {
            format: checked_format(resolved)?,
            name: self.name(id),
            ..Default::default()
        };
        for deco in self.decorations(id) {
            let deco = deco?;
            if spv::Decoration::from_u32(deco.operand(2)?) == Some(spv::Decoration::Location) {
                output.location = deco.operand(3)?;
            }
        }
        Ok(output)
    }

    fn build_uniform(&self, id: Id, resolved: &ResolvedType) -> Result<Uniform> {
        let mut uniform = Uniform {
            format: checked_format(resolved)?,
            array_count: resolved.count,
            name: self.name(id),
            ..Default::default()
        };
        for deco in self.decorations(id) {
            let deco = deco?;
            match spv::Decoration::from_u32(deco.operand(2)?) {
                Some(spv::Decoration::Binding) => uniform.binding = deco.operand(3)?,
                Some(spv::Decoration::DescriptorSet) => uniform.set = deco.operand(3)?,
                _ => {}
            }
        }
        if let Format::Structure | Format::Buffer = uniform.format {
            uniform.members = self.build_members(resolved)?;
        }
        Ok(uniform)
    }

    fn build_push_constant(&self, id: Id, resolved: &ResolvedType) -> Result<PushConstant> {
        let mut block = PushConstant {
            format: checked_format(resolved)?,
            name: self.name(id),
            members: Vec::new(),
        };
        if let Format::Structure | Format::Buffer = block.format {
            block.members = self.build_members(resolved)?;
        }
        Ok(block)
    }

    fn build_members(&self, parent: &ResolvedType) -> Result<Vec<UniformMember>> {
        let mut members = Vec::with_capacity(parent.members.len());
        for (index, member) in parent.members.iter().enumerate() {
            let built = self.build_member(member, parent.id, index as u32)?;
            // A runtime-sized array is only meaningful as the tail of a
            // storage block.
            if built.size == MemberSize::Unbounded
                && !(parent.format == Format::Buffer && index + 1 == parent.members.len())
            {
                return Err(Error::MisplacedRuntimeArray(member.id));
            }
            members.push(built);
        }
        Ok(members)
    }

    fn build_member(
        &self,
        member: &ResolvedType,
        parent_id: Id,
        index: u32,
    ) -> Result<UniformMember> {
        let children = match member.format {
            Format::Structure | Format::Buffer => self.build_members(member)?,
            _ => Vec::new(),
        };

        let size = match member.count {
            ArrayCount::Unbounded => MemberSize::Unbounded,
            ArrayCount::Fixed(count) => {
                let element = match member.format {
                    Format::Structure | Format::Buffer => size_of_block(&children)
                        .ok_or(Error::MisplacedRuntimeArray(member.id))?,
                    format => format.size().ok_or(Error::UnsupportedType(member.id))?,
                };
                MemberSize::Bytes(element.checked_mul(count).ok_or(Error::LimitExceeded)?)
            }
        };

        let name = self
            .tables
            .member_names
            .get(&parent_id)
            .and_then(|names| names.get(&index))
            .cloned()
            .unwrap_or_default();
        let offset = self
            .member_offset(parent_id, index)?
            .ok_or(Error::MissingMemberOffset(parent_id, index))?;

        Ok(UniformMember {
            format: member.format,
            offset,
            size,
            name,
            members: children,
        })
    }
}

fn checked_format(resolved: &ResolvedType) -> Result<Format> {
    match resolved.format {
        Format::Unknown => Err(Error::UnsupportedType(resolved.id)),
        format => Ok(format),
    }
}
