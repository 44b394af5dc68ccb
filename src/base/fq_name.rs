//! Fully-qualified names for packages, interfaces, types and enum values.
//!
//! Textual form: `android.hardware.foo@1.0::IFoo.Inner:VALUE`. Every part is
//! optional, so the same type also represents the partial names written in
//! source files (`IFoo`, `@1.0::IFoo`, `Status:OK`) and bare package targets
//! given on the command line (`android.hardware.foo@1.0`).

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

/// Base name of the per-package file holding top-level types.
pub const TYPES_NAME: &str = "types";

/// A `major.minor` package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Version in identifier-safe form, e.g. `V1_0`.
    pub fn sanitized(&self) -> String {
        format!("V{}_{}", self.major, self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Why a string could not be turned into an [`FqName`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fully-qualified name '{input}': {reason}")]
pub struct FqNameError {
    pub input: String,
    pub reason: &'static str,
}

/// A (possibly partial) qualified name.
///
/// Field order matters: the derived `Ord` compares package, version, name,
/// nested path and value in that order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FqName {
    package: Vec<SmolStr>,
    version: Option<Version>,
    name: Option<SmolStr>,
    nested: Vec<SmolStr>,
    value: Option<SmolStr>,
}

impl FqName {
    /// Parse the textual form.
    pub fn parse(input: &str) -> Result<Self, FqNameError> {
        let err = |reason| FqNameError {
            input: input.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(err("empty name"));
        }

        let (head, tail) = match input.find("::") {
            Some(idx) => (&input[..idx], Some(&input[idx + 2..])),
            None => (input, None),
        };

        let mut fq = FqName::default();

        let local = match (head.find('@'), tail) {
            (Some(at), tail) => {
                let package = &head[..at];
                if !package.is_empty() {
                    fq.package = split_identifiers(package).ok_or_else(|| err("bad package"))?;
                }
                fq.version = Some(parse_version(&head[at + 1..]).ok_or_else(|| err("bad version"))?);
                tail
            }
            (None, Some(_)) => return Err(err("'::' requires a version")),
            (None, None) => Some(head),
        };

        if let Some(local) = local {
            if local.is_empty() {
                return Err(err("missing name after '::'"));
            }
            let (path, value) = match local.find(':') {
                Some(idx) => (&local[..idx], Some(&local[idx + 1..])),
                None => (local, None),
            };
            let mut components = split_identifiers(path).ok_or_else(|| err("bad name"))?;
            fq.name = Some(components.remove(0));
            fq.nested = components;
            if let Some(value) = value {
                if !is_identifier(value) {
                    return Err(err("bad enum value name"));
                }
                fq.value = Some(SmolStr::new(value));
            }
        }

        Ok(fq)
    }

    /// A package-and-version name (`pkg@M.m`).
    pub fn package_only(package: &[SmolStr], version: Version) -> Self {
        Self {
            package: package.to_vec(),
            version: Some(version),
            ..Self::default()
        }
    }

    /// A bare local name (`Name` or `Name.Nested`).
    pub fn local(name: impl Into<SmolStr>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn package(&self) -> &[SmolStr] {
        &self.package
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn nested(&self) -> &[SmolStr] {
        &self.nested
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn has_package(&self) -> bool {
        !self.package.is_empty()
    }

    /// Package, version and name are all present.
    pub fn is_fully_qualified(&self) -> bool {
        self.has_package() && self.version.is_some() && self.name.is_some()
    }

    /// Package and version present, no name: a whole-package target.
    pub fn is_package(&self) -> bool {
        self.has_package() && self.version.is_some() && self.name.is_none()
    }

    /// No package and no version.
    pub fn is_bare(&self) -> bool {
        !self.has_package() && self.version.is_none()
    }

    /// Name is `types` (or `types.X`, used for managed-language limits).
    pub fn is_types_file(&self) -> bool {
        self.name() == Some(TYPES_NAME)
    }

    /// Interface names start with `I` followed by an upper-case letter.
    pub fn is_interface_name(&self) -> bool {
        let mut chars = self.name().unwrap_or_default().chars();
        chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
    }

    /// Dotted package string, e.g. `android.hardware.foo`.
    pub fn package_string(&self) -> String {
        self.package.join(".")
    }

    /// Version string, e.g. `1.0`, or empty.
    pub fn version_string(&self) -> String {
        self.version.map(|v| v.to_string()).unwrap_or_default()
    }

    /// Sanitized version, e.g. `V1_0`, or empty.
    pub fn sanitized_version(&self) -> String {
        self.version.map(|v| v.sanitized()).unwrap_or_default()
    }

    /// `Name.Nested` without package, version or value.
    pub fn local_name(&self) -> String {
        let mut out = self.name.as_deref().unwrap_or_default().to_string();
        for component in &self.nested {
            out.push('.');
            out.push_str(component);
        }
        out
    }

    /// The innermost component: `Inner` for `IFoo.Inner`.
    pub fn simple_name(&self) -> &str {
        self.nested
            .last()
            .map(|s| s.as_str())
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// `pkg@M.m` (drops name, nested path and value).
    pub fn package_and_version(&self) -> FqName {
        Self {
            package: self.package.clone(),
            version: self.version,
            ..Self::default()
        }
    }

    /// `pkg@M.m::Name` (drops nested path and value): the translation unit
    /// this name lives in.
    pub fn file_name(&self) -> FqName {
        Self {
            package: self.package.clone(),
            version: self.version,
            name: self.name.clone(),
            ..Self::default()
        }
    }

    /// `pkg@M.m::types`.
    pub fn types_for_package(&self) -> FqName {
        self.package_and_version().with_name(TYPES_NAME)
    }

    /// Replace the name (dropping nested path and value).
    pub fn with_name(&self, name: impl Into<SmolStr>) -> FqName {
        Self {
            package: self.package.clone(),
            version: self.version,
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Append a nested component.
    pub fn nested_in(&self, component: impl Into<SmolStr>) -> FqName {
        let mut out = self.clone();
        out.value = None;
        if out.name.is_none() {
            out.name = Some(component.into());
        } else {
            out.nested.push(component.into());
        }
        out
    }

    /// The same name without its `:VALUE` suffix.
    pub fn without_value(&self) -> FqName {
        Self {
            value: None,
            ..self.clone()
        }
    }

    /// Fill in a missing package and/or version from `defaults`.
    ///
    /// Only applies when the name already carries at least one of the two,
    /// e.g. `@1.1::IFoo` picks up the current package.
    pub fn apply_defaults(&self, defaults: &FqName) -> FqName {
        let mut out = self.clone();
        if out.package.is_empty() {
            out.package = defaults.package.clone();
        }
        if out.version.is_none() {
            out.version = defaults.version;
        }
        out
    }

    /// True if this package equals `prefix` or lives below it.
    pub fn in_package(&self, prefix: &str) -> bool {
        let prefix: Vec<&str> = prefix.split('.').collect();
        self.package.len() >= prefix.len()
            && self
                .package
                .iter()
                .zip(&prefix)
                .all(|(component, expected)| component == expected)
    }

    /// Same package and version as `other`.
    pub fn same_package(&self, other: &FqName) -> bool {
        self.package == other.package && self.version == other.version
    }

    /// Package components followed by the version (`android`, `hardware`,
    /// `foo`, `1.0` / `V1_0`).
    pub fn package_and_version_components(&self, sanitized: bool) -> Vec<String> {
        let mut out: Vec<String> = self.package.iter().map(|c| c.to_string()).collect();
        if let Some(version) = self.version {
            out.push(if sanitized {
                version.sanitized()
            } else {
                version.to_string()
            });
        }
        out
    }

    /// Identifier-safe token for the package and version, e.g.
    /// `android_hardware_foo_V1_0`.
    pub fn token_name(&self) -> String {
        self.package_and_version_components(true).join("_")
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.package_string())?;
        if let Some(version) = self.version {
            write!(f, "@{version}")?;
            if self.name.is_some() {
                f.write_str("::")?;
            }
        }
        f.write_str(&self.local_name())?;
        if let Some(value) = &self.value {
            write!(f, ":{value}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for FqName {
    type Err = FqNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// XID identifier check.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || unicode_ident::is_xid_start(c) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

fn split_identifiers(s: &str) -> Option<Vec<SmolStr>> {
    s.split('.')
        .map(|component| is_identifier(component).then(|| SmolStr::new(component)))
        .collect()
}

fn parse_version(s: &str) -> Option<Version> {
    let (major, minor) = s.split_once('.')?;
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(major) || !digits(minor) {
        return None;
    }
    Some(Version::new(major.parse().ok()?, minor.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fully_qualified() {
        let fq = FqName::parse("android.hardware.nfc@1.0::INfc").unwrap();
        assert_eq!(fq.package_string(), "android.hardware.nfc");
        assert_eq!(fq.version(), Some(Version::new(1, 0)));
        assert_eq!(fq.name(), Some("INfc"));
        assert!(fq.is_fully_qualified());
        assert!(!fq.is_package());
        assert_eq!(fq.to_string(), "android.hardware.nfc@1.0::INfc");
    }

    #[test]
    fn test_parse_package_target() {
        let fq = FqName::parse("test@1.2").unwrap();
        assert!(fq.is_package());
        assert!(!fq.is_fully_qualified());
        assert_eq!(fq.to_string(), "test@1.2");
    }

    #[test]
    fn test_parse_nested_and_value() {
        let fq = FqName::parse("a.b@2.1::IFoo.Inner:VALUE").unwrap();
        assert_eq!(fq.name(), Some("IFoo"));
        assert_eq!(fq.nested(), &[SmolStr::new("Inner")]);
        assert_eq!(fq.value(), Some("VALUE"));
        assert_eq!(fq.local_name(), "IFoo.Inner");
        assert_eq!(fq.simple_name(), "Inner");
        assert_eq!(fq.file_name().to_string(), "a.b@2.1::IFoo");
        assert_eq!(fq.to_string(), "a.b@2.1::IFoo.Inner:VALUE");
    }

    #[test]
    fn test_parse_partial_forms() {
        let bare = FqName::parse("Status").unwrap();
        assert!(bare.is_bare());
        assert_eq!(bare.name(), Some("Status"));

        let versioned = FqName::parse("@1.1::IFoo").unwrap();
        assert!(!versioned.has_package());
        let current = FqName::parse("pkg@1.0").unwrap();
        assert_eq!(
            versioned.apply_defaults(&current).to_string(),
            "pkg@1.1::IFoo"
        );

        let value = FqName::parse("Color:RED").unwrap();
        assert_eq!(value.value(), Some("RED"));
        assert_eq!(value.without_value().to_string(), "Color");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "pkg::IFoo", "pkg@1::IFoo", "pkg@1.x", "pkg@1.0::", "9abc", "a..b"] {
            assert!(FqName::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut names: Vec<FqName> = ["b@1.0::A", "a@2.0::A", "a@1.0::B", "a@1.0::A"]
            .iter()
            .map(|s| FqName::parse(s).unwrap())
            .collect();
        names.sort();
        let rendered: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        assert_eq!(rendered, ["a@1.0::A", "a@1.0::B", "a@2.0::A", "b@1.0::A"]);
    }

    #[test]
    fn test_derived_forms() {
        let fq = FqName::parse("android.hardware.foo@1.0::IFoo").unwrap();
        assert_eq!(fq.token_name(), "android_hardware_foo_V1_0");
        assert_eq!(fq.types_for_package().to_string(), "android.hardware.foo@1.0::types");
        assert!(fq.in_package("android.hardware"));
        assert!(!fq.in_package("android.hard"));
        assert!(fq.is_interface_name());
        assert!(!FqName::local("Status").is_interface_name());
    }
}
