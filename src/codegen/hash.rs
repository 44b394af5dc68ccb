//! `current.txt` lines for a file or every member of a package.

use std::io::Write;

use crate::base::FqName;
use crate::error::{CompileError, Result};
use crate::project::Enforcement;

use super::GenerationContext;

/// Print `<sha256-hex> <fqname>` for each file. Files are parsed without
/// checking recorded hashes, so a changed frozen interface still prints its
/// new hash.
pub(super) fn generate(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let files = if target.is_fully_qualified() {
        vec![target.clone()]
    } else {
        context.coordinator.package_interfaces(target)?
    };

    for file in files {
        let id = context.coordinator.parse(&file, Enforcement::NoHash)?;
        let hash = context.coordinator.ast(id).content_hash();
        writeln!(context.stdout, "{hash} {file}")
            .map_err(|e| CompileError::generation_io("<stdout>", e))?;
    }
    Ok(())
}
