//! Purpose: Internal JSON decoding boundary for request bodies.
//! Exports: `parse` module with the decode entrypoint and failure categories.
//! Role: Single seam so handlers never call the decoder ad hoc.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
