//! Reflection of compiled SPIR-V shader modules.
//!
//! A module is decoded in a single pass over its word stream: the
//! declaration section is scanned into id-keyed symbol tables, each
//! `OpVariable` is resolved recursively through those tables, and the
//! results are exposed as plain [`Input`]/[`Output`]/[`Uniform`]/
//! [`PushConstant`] records for pipeline construction to consume.
//! Scanning stops at the first `OpFunction`; executable code is never
//! inspected.
//!
//! A module either reflects fully or not at all. Partial binding
//! metadata is worse than a clean failure, so any construct the decoder
//! cannot classify aborts the decode with a named error.

mod error;
mod parser;
mod reflect;
pub mod testing;
mod types;

pub use error::*;
pub use reflect::*;
pub use types::*;

pub use spirv_headers::ExecutionModel;
pub use spirv_headers::StorageClass;
