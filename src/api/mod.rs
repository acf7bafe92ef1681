//! Purpose: Define the stable public Rust API boundary for larder.
//! Exports: Core types and operations needed by the CLI and tests.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path external callers rely on.

mod remote;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::loader::load_csv;
pub use crate::core::rating;
pub use crate::core::record::{coerce_scalar, Record};
pub use crate::core::table::{Envelope, Links, Pagination, Table};
pub use remote::{ListOptions, RemoteClient};
