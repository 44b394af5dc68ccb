//! Nested symbol tables.
//!
//! Each AST owns an arena of scopes. Scope 0 is the file's root scope;
//! interfaces, structs and unions each open a child scope for their nested
//! declarations. Entries map a local name to the declaration's slot in the
//! same AST.

use indexmap::IndexMap;
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    /// Declaration that opened this scope; `None` for the root.
    owner: Option<u32>,
    symbols: IndexMap<SmolStr, u32>,
}

impl Scope {
    pub(crate) fn new(parent: Option<ScopeId>, owner: Option<u32>) -> Self {
        Self {
            parent,
            owner,
            symbols: IndexMap::new(),
        }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn owner(&self) -> Option<u32> {
        self.owner
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.symbols.get(name).copied()
    }

    /// Declarations in source order.
    pub fn symbols(&self) -> impl Iterator<Item = (&SmolStr, u32)> {
        self.symbols.iter().map(|(name, &index)| (name, index))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns `false` if the name is already taken.
    pub(crate) fn insert(&mut self, name: SmolStr, index: u32) -> bool {
        if self.symbols.contains_key(&name) {
            return false;
        }
        self.symbols.insert(name, index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates_and_keeps_order() {
        let mut scope = Scope::new(None, None);
        assert!(scope.insert("B".into(), 0));
        assert!(scope.insert("A".into(), 1));
        assert!(!scope.insert("B".into(), 2));
        let names: Vec<_> = scope.symbols().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(scope.get("B"), Some(0));
    }
}
