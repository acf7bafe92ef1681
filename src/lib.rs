//! Purpose: Shared library crate used by the `larder` CLI and tests.
//! Exports: `core` (records, loader, table, errors), `api` (public surface),
//! and `serve` (the HTTP boundary).
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: `api` is the only public path intended for external callers.
pub mod api;
pub mod core;
pub mod serve;
