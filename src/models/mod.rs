//! Data models for keycap parameters and resolved specifications.
//!
//! Models are independent of the CLI and of process execution.

pub mod field;
pub mod keycap;
pub mod value;

// Re-export all model types
pub use field::{Field, FieldKind, FIELDS};
pub use keycap::{KeycapSpec, Legend, RenderPart, RenderTarget};
pub use value::ParamValue;
