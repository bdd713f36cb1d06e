//! A WebAssembly module toolkit written in Rust.
//!
//! wasmkit reads, validates and writes WebAssembly in both its binary
//! encoding and its S-expression text encoding, and understands the script
//! dialect used by the conformance test suite. It is a library first; the
//! bundled `wasmkit` binary wraps it with `dump`, `validate` and `wasm2wat`
//! subcommands.
//!
//! # Modules
//!
//! - [`parser`] -- Streaming binary decoder: section framing, lazy typed
//!   entry readers, and the instruction reader.
//! - [`valid`] -- Validator: per-entity checks plus the stack-typing
//!   algorithm for code bodies.
//! - [`encoder`] -- Binary writer. Produces canonical (minimal-LEB) bytes.
//! - [`text`] -- Text writer. Pretty-prints a module as S-expressions.
//! - [`visitor`] -- Single-pass traversal with per-section callbacks.
//! - [`script`] -- Conformance-script model and its static checker.
//! - [`features`] -- Proposal flags gating opcodes, types and shapes.
//!
//! # Example
//!
//! Decode a module, validate it, and print it as text:
//!
//! ```
//! use wasmkit::error::ErrorList;
//! use wasmkit::features::Features;
//!
//! // (module (func))
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00,
//!     0x01, 0x04, 0x01, 0x60, 0x00, 0x00,
//!     0x03, 0x02, 0x01, 0x00,
//!     0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b,
//! ];
//!
//! let features = Features::all();
//! let module = wasmkit::parser::parse(&bytes, &features).unwrap();
//!
//! let mut errors = ErrorList::new();
//! assert!(wasmkit::valid::validate(&module, &features, &mut errors));
//!
//! let text = wasmkit::text::write_module(&module);
//! assert!(text.starts_with("(module"));
//!
//! // The canonical encoder reproduces the input bytes.
//! assert_eq!(wasmkit::encoder::encode(&module).unwrap(), bytes);
//! ```
//!
//! # Errors
//!
//! Diagnostics follow the standard's split between *malformed* (the bytes
//! do not parse) and *invalid* (the structure violates static semantics).
//! Readers yield errors as values; the validator reports everything it
//! finds to an [`error::ErrorSink`] and returns a `bool`.

pub mod encoder;
pub mod error;
pub mod features;
pub mod limits;
pub mod module;
pub mod parser;
pub mod script;
pub mod text;
pub mod types;
pub mod valid;
pub mod visitor;
