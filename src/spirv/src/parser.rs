use fnv::FnvHashMap;
use num_traits::FromPrimitive;
use spirv_headers as spv;

use crate::{Error, Id, Result, Version};

pub(crate) const HEADER_LEN: usize = 5;

const MAGIC: u32 = 0x0723_0203;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Header {
    pub version: Version,
    /// Upper bound on ids; used as a table capacity hint only.
    pub bound: u32,
}

pub(crate) fn parse_header(data: &[u32]) -> Result<Header> {
    let header = data.get(..HEADER_LEN).ok_or(Error::InvalidHeader)?;
    if header[0] != MAGIC {
        return Err(Error::InvalidHeader);
    }

    let byte = |word: u32, n: u32| ((word >> (8 * n)) & 0xff) as u8;
    Ok(Header {
        version: (byte(header[1], 2), byte(header[1], 1)),
        bound: header[3],
    })
}

// Returns `(None, _)` upon encountering an unrecognized opcode.
pub(crate) fn decode_op(word: u32) -> (Option<spv::Op>, usize) {
    let size = (word >> 16) & 0xffff;
    (spv::Op::from_u32(word & 0xffff), size as usize)
}

/// One instruction inside the word stream. `words` includes the leading
/// `(word_count << 16) | opcode` word, so operand indices match the
/// binary-format listings.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Instruction<'data> {
    pub offset: usize,
    pub op: Option<spv::Op>,
    pub words: &'data [u32],
}

impl<'data> Instruction<'data> {
    pub fn operand(&self, index: usize) -> Result<u32> {
        self.words.get(index).copied().ok_or(Error::InvalidModule)
    }

    /// Reads the null-terminated UTF-8 literal starting at word `index`.
    pub fn string_at(&self, index: usize) -> Result<String> {
        assert!(cfg!(target_endian = "little"));
        let words = self.words.get(index..).ok_or(Error::InvalidModule)?;
        let bytes = unsafe {
            std::slice::from_raw_parts(
                words.as_ptr() as *const u8,
                words.len() * std::mem::size_of::<u32>(),
            )
        };
        let len = bytes.iter().position(|&b| b == 0).ok_or(Error::InvalidModule)?;
        Ok(std::str::from_utf8(&bytes[..len])?.to_owned())
    }
}

pub(crate) fn instruction_at(data: &[u32], offset: usize) -> Result<Instruction<'_>> {
    let &first = data.get(offset).ok_or(Error::InvalidModule)?;
    let (op, size) = decode_op(first);
    if size == 0 {
        return Err(Error::InvalidModule);
    }
    let words = data.get(offset..offset + size).ok_or(Error::InvalidModule)?;
    Ok(Instruction { offset, op, words })
}

#[derive(Debug)]
pub(crate) struct Instructions<'data> {
    data: &'data [u32],
    offset: usize,
}

impl<'data> Instructions<'data> {
    pub fn new(data: &'data [u32], offset: usize) -> Self {
        Self { data, offset }
    }
}

impl<'data> Iterator for Instructions<'data> {
    type Item = Result<Instruction<'data>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }
        match instruction_at(self.data, self.offset) {
            Ok(inst) => {
                self.offset += inst.words.len();
                Some(Ok(inst))
            }
            Err(err) => {
                self.offset = self.data.len();
                Some(Err(err))
            }
        }
    }
}

/// Id-keyed lookups built during the linear scan. Entries are only ever
/// added; an id's declaring offset is never overwritten (ids are unique
/// per module).
#[derive(Debug, Default)]
pub(crate) struct SymbolTables {
    /// Declaring instruction offset for every type, constant, and
    /// variable id.
    pub types: FnvHashMap<Id, usize>,
    pub names: FnvHashMap<Id, String>,
    pub member_names: FnvHashMap<Id, FnvHashMap<u32, String>>,
    pub decorations: FnvHashMap<Id, Vec<usize>>,
    pub member_decorations: FnvHashMap<Id, Vec<usize>>,
}
