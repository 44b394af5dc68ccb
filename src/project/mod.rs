//! Locating, loading and caching translation units.
//!
//! - [`PackageRootTable`] - package prefix → source directory
//! - [`Coordinator`] - parse-on-demand cache of every AST
//! - [`HashRegistry`] - frozen hashes from `current.txt`
//! - [`builtin`] - embedded root base interface

pub mod builtin;
mod coordinator;
mod hash_registry;
mod package_roots;

pub use coordinator::{Coordinator, Enforcement, sha256_hex};
pub use hash_registry::HashRegistry;
pub use package_roots::{PackageRoot, PackageRootTable};
