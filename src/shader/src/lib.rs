//! CPU-side shader toolkit.
//!
//! Wraps compiled modules with their reflected interface and derives the
//! descriptions pipeline construction needs from reflection alone:
//! descriptor-set and pipeline layouts, vertex-input layouts matched by
//! attribute name, and parameter blocks that write uniform and
//! push-constant memory through reflected member offsets.

mod error;
mod layout;
mod params;
mod shader;
mod vertex;

pub use error::*;
pub use layout::*;
pub use params::*;
pub use shader::*;
pub use vertex::*;
