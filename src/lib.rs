//! Purpose: Library backing the `slicer-bridge` CLI and any embedding host.
//! Exports: `api` (stable surface), `core` (action, collaborators, errors), `notice`, `testing`.
//! Role: Export a host selection to STEP and hand it to an external slicer.
//! Invariants: The action receives every collaborator explicitly; no global state.
//! Invariants: The slicer path env override is read fresh on every invocation.
pub mod api;
pub mod core;
pub mod notice;
pub mod testing;
