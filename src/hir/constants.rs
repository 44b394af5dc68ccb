//! Enumerator values.
//!
//! Values are computed on demand from the resolved [`ConstValue`]s. A value
//! is a literal, a reference to another enumerator (possibly of another enum
//! or file), or implicit: one more than its predecessor, where the first
//! value of a derived enum follows the last value of its parent.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::error::{CompileError, Result};
use crate::project::Coordinator;

use super::ast::Ast;
use super::types::{ConstValue, EnumDecl, Primitive, Type, TypeId};

pub(crate) fn evaluate_enum_value(coordinator: &Coordinator, ty: TypeId, index: usize) -> Result<i128> {
    Evaluator::new(coordinator).value(ty, index)
}

/// The integer type an enum is ultimately stored as.
pub fn storage_primitive(coordinator: &Coordinator, ty: TypeId) -> Option<Primitive> {
    let mut seen = FxHashSet::default();
    let mut current = ty;
    while seen.insert(current) {
        match &coordinator.named_type(current).enum_decl()?.storage {
            Type::Primitive(p) => return Some(*p),
            Type::Enum(parent) => current = *parent,
            _ => return None,
        }
    }
    None
}

/// Every value of an enum, parents' values first, with their numbers.
pub fn enum_values(coordinator: &Coordinator, ty: TypeId) -> Result<Vec<(SmolStr, i128)>> {
    let mut chain = vec![ty];
    let mut current = ty;
    while let Some(parent) = coordinator
        .named_type(current)
        .enum_decl()
        .and_then(EnumDecl::parent)
    {
        if chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }

    let mut evaluator = Evaluator::new(coordinator);
    let mut out = Vec::new();
    for link in chain.into_iter().rev() {
        if let Some(decl) = coordinator.named_type(link).enum_decl() {
            for (index, value) in decl.values.iter().enumerate() {
                out.push((value.name.clone(), evaluator.value(link, index)?));
            }
        }
    }
    Ok(out)
}

/// Evaluate every enumerator of `ast`, rejecting cycles and values that do
/// not fit the storage type.
pub fn check_enum_values(coordinator: &Coordinator, ast: &Ast) -> Result<()> {
    let mut evaluator = Evaluator::new(coordinator);
    for (id, named) in ast.types() {
        let Some(decl) = named.enum_decl() else {
            continue;
        };
        let storage = storage_primitive(coordinator, id);
        for (index, value) in decl.values.iter().enumerate() {
            let number = evaluator.value(id, index)?;
            if let Some(storage) = storage.filter(|p| !p.holds(number)) {
                return Err(CompileError::ConstantOutOfRange {
                    name: format!("{}:{}", named.fq_name(), value.name),
                    value: number,
                    storage: storage.keyword().to_string(),
                });
            }
        }
    }
    Ok(())
}

struct Evaluator<'a> {
    coordinator: &'a Coordinator,
    /// Enumerators being evaluated.
    pending: FxHashSet<(TypeId, usize)>,
    values: FxHashMap<(TypeId, usize), i128>,
}

impl<'a> Evaluator<'a> {
    fn new(coordinator: &'a Coordinator) -> Self {
        Self {
            coordinator,
            pending: FxHashSet::default(),
            values: FxHashMap::default(),
        }
    }

    fn value(&mut self, ty: TypeId, index: usize) -> Result<i128> {
        if let Some(&known) = self.values.get(&(ty, index)) {
            return Ok(known);
        }
        let coordinator = self.coordinator;
        let named = coordinator.named_type(ty);
        if self.pending.contains(&(ty, index)) {
            let name = named.value_names().get(index).cloned().unwrap_or_default();
            return Err(CompileError::ConstantCycle(format!("{}:{name}", named.fq_name())));
        }
        let decl = named.enum_decl().ok_or_else(|| CompileError::NotAnEnum {
            name: named.fq_name().to_string(),
            context: "enumerator evaluation".to_string(),
        })?;
        let value = decl.values.get(index).ok_or_else(|| CompileError::UnresolvedEnumValue {
            name: index.to_string(),
            context: named.fq_name().to_string(),
        })?;

        self.pending.insert((ty, index));
        let result = match value.expr {
            ConstValue::Literal(number) => Ok(number),
            ConstValue::Reference { ty, index } => self.value(ty, index),
            ConstValue::Implicit if index > 0 => self.value(ty, index - 1).map(|v| v + 1),
            ConstValue::Implicit => match decl.parent() {
                Some(parent) => self.last_value(parent).map(|last| last.map_or(0, |v| v + 1)),
                None => Ok(0),
            },
        };
        self.pending.remove(&(ty, index));
        let number = result?;
        self.values.insert((ty, index), number);
        Ok(number)
    }

    /// Last value along the parent chain, if any enum in it has values.
    fn last_value(&mut self, ty: TypeId) -> Result<Option<i128>> {
        let coordinator = self.coordinator;
        let Some(decl) = coordinator.named_type(ty).enum_decl() else {
            return Ok(None);
        };
        match decl.values.len() {
            0 => match decl.parent() {
                Some(parent) if parent != ty => self.last_value(parent),
                _ => Ok(None),
            },
            len => self.value(ty, len - 1).map(Some),
        }
    }
}
