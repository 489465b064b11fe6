//! Hand-rolled JSON output with fixed field order and a capacity ceiling.

pub mod buffer;
pub mod escape;
pub mod record;

pub use buffer::{error_document, JsonBuffer, OwnedJson};
pub use escape::{escape, escape_into};
pub use record::{Field, Record, Value};
