//! Purpose: Library crate behind the `jsonecho` binary.
//! Exports: `serve` (config + server), `echo` (handler + envelopes), `error`.
//! Role: Keeps the server testable in-process; the binary only parses args.
//! Invariants: No global state; everything flows from a `ServeConfig`.
pub mod echo;
pub mod error;
pub mod serve;

mod json;
