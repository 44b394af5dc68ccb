//! Foundation types for the halgen toolchain.
//!
//! - [`FqName`], [`Version`] - Qualified names of packages, types and values
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - Domain constants (file extension, default package roots)
//!
//! This module has NO dependencies on other halgen modules.

pub mod constants;
mod fq_name;
mod span;

pub use fq_name::{FqName, FqNameError, TYPES_NAME, Version, is_identifier};
pub use span::{LineCol, LineIndex, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
