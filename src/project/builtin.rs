//! Embedded source of the root base interface.
//!
//! Every interface ultimately extends `android.hidl.base@1.0::IBase`. When
//! the package roots contain no file for it, this copy is used instead so
//! that interfaces compile outside a full source tree.

use crate::base::FqName;
use crate::base::constants::ROOT_INTERFACE;

pub const ROOT_INTERFACE_SOURCE: &str = r#"package android.hidl.base@1.0;

interface IBase {
    ping();

    interfaceChain() generates (vec<string> descriptors);

    interfaceDescriptor() generates (string descriptor);

    getHashChain() generates (vec<uint8_t[32]> hashchain);

    oneway notifySyspropsChanged();
};
"#;

/// Label used in place of a path for embedded sources.
pub const BUILTIN_PATH: &str = "<builtin>/IBase.hal";

/// The root base interface name.
pub fn root_interface() -> FqName {
    // ROOT_INTERFACE is a well-formed literal; the fallback is never taken.
    FqName::parse(ROOT_INTERFACE).unwrap_or_default()
}

pub fn is_root_interface(fq_name: &FqName) -> bool {
    fq_name.file_name() == root_interface()
}

/// Embedded source for `fq_name`, if one exists.
pub fn source_for(fq_name: &FqName) -> Option<&'static str> {
    is_root_interface(fq_name).then_some(ROOT_INTERFACE_SOURCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_embedded_root_parses() {
        let parsed = parse(ROOT_INTERFACE_SOURCE);
        assert!(parsed.ok(), "{:?}", parsed.errors);
        assert_eq!(parsed.file.interface().map(|d| d.name.as_str()), Some("IBase"));
    }

    #[test]
    fn test_only_root_has_embedded_source() {
        assert!(source_for(&FqName::parse(ROOT_INTERFACE).unwrap()).is_some());
        assert!(source_for(&FqName::parse("android.hidl.base@1.0::types").unwrap()).is_none());
    }
}
