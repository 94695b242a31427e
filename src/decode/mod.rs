//! Generic tree decoder.
//!
//! # Data Flow
//! ```text
//! structured file (TOML/YAML)        labels (dotted paths)
//!     → file.rs (parse by suffix)        → labels::parser
//!     → node.rs (untyped Node tree) ←────────┘
//!     → populate.rs (match names against schema.rs field tables)
//!     → typed value + unsupported keys + field errors
//! ```
//!
//! # Design Decisions
//! - Targets declare their fields explicitly; no runtime type introspection
//! - Decoding never aborts on a bad field
//! - Embedded members are promoted into the parent's name space

pub mod file;
pub mod node;
pub mod populate;
pub mod schema;

pub use file::{decode_file, LoadError};
pub use node::{decode, Node};
pub use populate::{populate, populate_from, populate_into, Decoded, Decoder, FieldError};
pub use schema::{field_names, promote, Field, FieldKind, Schema};
