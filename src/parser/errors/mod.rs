//! Parser diagnostics: coded errors with context-aware messages.

mod codes;
mod context;
mod error;

pub use codes::ErrorCode;
pub use context::ParseContext;
pub use error::{SyntaxError, SyntaxErrorBuilder, unexpected_in_context};
