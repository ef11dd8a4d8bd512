//! Vela runtime library.
//!
//! Native support code linked into compiled Vela programs:
//! - the dynamic array container backing every Vela array value
//! - C string helpers and numeric conversions
//! - `malloc`-backed allocation shared with generated code
//! - print, assert, and panic builtins
//!
//! Generated code reaches all of this through the `vela_*` C ABI. The Rust
//! core underneath reports faults as `RuntimeError` values; only the ABI
//! layer turns them into a diagnostic followed by process termination, since
//! compiled Vela programs have no recoverable-error channel.

pub mod array;
pub mod builtins;
pub mod error;
pub mod memory;
pub mod string;

pub use array::VelaArray;
pub use error::{RuntimeError, RuntimeResult};
