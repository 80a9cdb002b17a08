//! Hand-assembly of synthetic modules for tests.

use spirv_headers as spv;

use crate::parser::HEADER_LEN;

/// Packs a string literal into null-terminated, word-aligned operand
/// words.
pub fn string_words(s: &str) -> Vec<u32> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Emits instructions in declaration order; [`finish`](Self::finish)
/// prepends a valid 5-word header.
///
/// Type helpers allocate and return fresh result ids. Variable ids must
/// be taken from [`reserve_id`](Self::reserve_id) up front so names and
/// decorations can be emitted before the declaration, the way compilers
/// lay out real modules.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    words: Vec<u32>,
    next_id: u32,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self { words: Vec::new(), next_id: 1 }
    }

    pub fn reserve_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn inst(&mut self, op: spv::Op, operands: &[u32]) -> &mut Self {
        self.words.push((((operands.len() + 1) as u32) << 16) | op as u32);
        self.words.extend_from_slice(operands);
        self
    }

    pub fn entry_point(
        &mut self,
        model: spv::ExecutionModel,
        function: u32,
        name: &str,
        interface: &[u32],
    ) -> &mut Self {
        let mut operands = vec![model as u32, function];
        operands.extend(string_words(name));
        operands.extend_from_slice(interface);
        self.inst(spv::Op::EntryPoint, &operands)
    }

    pub fn name(&mut self, target: u32, name: &str) -> &mut Self {
        let mut operands = vec![target];
        operands.extend(string_words(name));
        self.inst(spv::Op::Name, &operands)
    }

    pub fn member_name(&mut self, target: u32, member: u32, name: &str) -> &mut Self {
        let mut operands = vec![target, member];
        operands.extend(string_words(name));
        self.inst(spv::Op::MemberName, &operands)
    }

    pub fn decorate(
        &mut self,
        target: u32,
        decoration: spv::Decoration,
        operands: &[u32],
    ) -> &mut Self {
        let mut words = vec![target, decoration as u32];
        words.extend_from_slice(operands);
        self.inst(spv::Op::Decorate, &words)
    }

    pub fn member_decorate(
        &mut self,
        target: u32,
        member: u32,
        decoration: spv::Decoration,
        operands: &[u32],
    ) -> &mut Self {
        let mut words = vec![target, member, decoration as u32];
        words.extend_from_slice(operands);
        self.inst(spv::Op::MemberDecorate, &words)
    }

    pub fn type_float(&mut self) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypeFloat, &[id, 32]);
        id
    }

    pub fn type_int(&mut self) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypeInt, &[id, 32, 1]);
        id
    }

    pub fn type_vector(&mut self, component: u32, count: u32) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypeVector, &[id, component, count]);
        id
    }

    pub fn type_matrix(&mut self, column: u32, columns: u32) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypeMatrix, &[id, column, columns]);
        id
    }

    pub fn type_struct(&mut self, members: &[u32]) -> u32 {
        let id = self.reserve_id();
        let mut operands = vec![id];
        operands.extend_from_slice(members);
        self.inst(spv::Op::TypeStruct, &operands);
        id
    }

    pub fn type_sampled_image(&mut self, image: u32) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypeSampledImage, &[id, image]);
        id
    }

    /// `length` is the id of the length operand, normally an
    /// [`OpConstant`](Self::constant_u32).
    pub fn type_array(&mut self, element: u32, length: u32) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypeArray, &[id, element, length]);
        id
    }

    pub fn type_runtime_array(&mut self, element: u32) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypeRuntimeArray, &[id, element]);
        id
    }

    pub fn type_pointer(&mut self, class: spv::StorageClass, pointee: u32) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::TypePointer, &[id, class as u32, pointee]);
        id
    }

    pub fn constant_u32(&mut self, ty: u32, value: u32) -> u32 {
        let id = self.reserve_id();
        self.inst(spv::Op::Constant, &[ty, id, value]);
        id
    }

    pub fn variable(&mut self, id: u32, pointer: u32, class: spv::StorageClass) -> &mut Self {
        self.inst(spv::Op::Variable, &[pointer, id, class as u32])
    }

    /// An `OpFunction` header; the operands are never inspected.
    pub fn function(&mut self) -> &mut Self {
        self.inst(spv::Op::Function, &[0, 0, 0, 0])
    }

    pub fn finish(&self) -> Vec<u32> {
        let mut module = Vec::with_capacity(HEADER_LEN + self.words.len());
        module.push(0x0723_0203);
        module.push(0x0001_0000);
        module.push(0); // generator
        module.push(self.next_id); // id bound
        module.push(0); // schema
        module.extend_from_slice(&self.words);
        module
    }
}
