//! # halgen
//!
//! Compiler for versioned HAL interface definition files (`.hal`).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! driver    → One invocation: options, targets, fail-fast loop
//!   ↓
//! codegen   → Closed registry of output formats and their backends
//!   ↓
//! project   → Package roots, parse-on-demand coordinator, frozen hashes
//!   ↓
//! hir       → Resolved translation units, scopes, type graph, import graph
//!   ↓
//! syntax    → Raw declaration tree of one file
//!   ↓
//! parser    → Logos lexer, recursive-descent parser
//!   ↓
//! base      → Primitives (FqName, TextRange, domain constants)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → hir → project → codegen → driver)
// ============================================================================

/// Foundation types: FqName, Version, TextRange
pub mod base;

/// Parser: Logos lexer, recursive-descent parser, syntax errors
pub mod parser;

/// Syntax: raw declaration tree of a `.hal` file
pub mod syntax;

/// High-level IR: resolved ASTs, type graph, import queries
pub mod hir;

/// Project management: package roots, coordinator, hash registries
pub mod project;

/// Output formats and backends
pub mod codegen;

/// Command-line invocation
pub mod driver;

/// Error type shared by every phase
pub mod error;

// Re-export commonly needed items
pub use base::{FqName, TextRange, TextSize, Version};
pub use codegen::{FormatRegistry, GenerationContext, OutputMode};
pub use driver::{Driver, DriverOptions};
pub use error::{CompileError, Result};
pub use project::{Coordinator, Enforcement, PackageRootTable};
