use derive_more::Display;

use crate::Id;

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ReflectError {
    /// The stream does not begin with a valid module header.
    #[display(fmt = "invalid module header")]
    InvalidHeader,
    /// The word stream is malformed: a truncated instruction, an
    /// unterminated string, or a dangling id.
    #[display(fmt = "invalid module")]
    InvalidModule,
    /// An array length operand does not name a compile-time constant.
    #[display(fmt = "array length of type %{} is not a compile-time constant", _0)]
    NonConstantArrayLength(Id),
    /// A type has no shape the binding model can represent.
    #[display(fmt = "unsupported type %{}", _0)]
    UnsupportedType(Id),
    /// A runtime-sized array somewhere other than the tail of a storage
    /// block.
    #[display(fmt = "misplaced runtime array of type %{}", _0)]
    MisplacedRuntimeArray(Id),
    /// A block member carries no offset decoration.
    #[display(fmt = "member {} of struct %{} has no offset", _1, _0)]
    MissingMemberOffset(Id, u32),
    /// A library limitation has been exceeded, such as the type nesting
    /// depth or an array length.
    #[display(fmt = "limit exceeded")]
    LimitExceeded,
}

pub type Error = ReflectError;
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Self::InvalidModule
    }
}
