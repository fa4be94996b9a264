use std::collections::{HashMap, HashSet};

use crate::diagnostics::CompileError;
use crate::parser::ast::MethodDecl;
use crate::typeck::ClassTable;

/// Resolved dispatch table for one class.
///
/// `slots` is the ordered list of lowered function labels; `offsets`
/// maps a method name to the slot a call through that name indexes.
/// Offsets form a dense `0..slots.len()` range.
#[derive(Clone, Debug)]
pub struct ClassVTable<'p> {
    pub slots: Vec<String>,
    pub offsets: HashMap<String, usize>,
    pub impls: HashMap<String, &'p MethodDecl>,
}

impl<'p> ClassVTable<'p> {
    fn empty() -> Self {
        Self {
            slots: Vec::new(),
            offsets: HashMap::new(),
            impls: HashMap::new(),
        }
    }

    pub fn offset_of(&self, method: &str, class: &str) -> Result<usize, CompileError> {
        self.offsets
            .get(method)
            .copied()
            .ok_or_else(|| CompileError::unknown_method(class, method))
    }
}

/// Computes and memoizes per-class dispatch tables.
///
/// A table is built at most once; ancestors are built on demand before
/// their descendants. The `building` set catches `extends` cycles that
/// slipped past validation.
pub struct VTableBuilder<'p> {
    memo: HashMap<String, ClassVTable<'p>>,
    building: HashSet<String>,
}

impl<'p> VTableBuilder<'p> {
    pub fn new() -> Self {
        Self {
            memo: HashMap::new(),
            building: HashSet::new(),
        }
    }

    pub fn is_built(&self, class: &str) -> bool {
        self.memo.contains_key(class)
    }

    /// Table for a class that has already been built.
    pub fn get(&self, class: &str) -> Result<&ClassVTable<'p>, CompileError> {
        self.memo
            .get(class)
            .ok_or_else(|| CompileError::codegen(format!("vtable for '{class}' was never built")))
    }

    pub fn build(
        &mut self,
        table: &ClassTable<'p>,
        class: &str,
    ) -> Result<&ClassVTable<'p>, CompileError> {
        if !self.memo.contains_key(class) {
            let built = self.compute(table, class)?;
            self.memo.insert(class.to_string(), built);
        }
        self.get(class)
    }

    fn compute(
        &mut self,
        table: &ClassTable<'p>,
        name: &str,
    ) -> Result<ClassVTable<'p>, CompileError> {
        if !self.building.insert(name.to_string()) {
            return Err(CompileError::cyclic_inheritance(name));
        }

        let class = table.resolve(name)?;

        // A subclass starts from a copy of its parent's table.
        let mut vt = match table.parent(class)? {
            Some(parent) => self.build(table, &parent.name.node)?.clone(),
            None => ClassVTable::empty(),
        };

        for method in &class.methods {
            let method_name = &method.node.name.node;
            let label = format!("{}_{}", name, method_name);

            let overrides = vt
                .impls
                .get(method_name.as_str())
                .is_some_and(|prev| prev.same_signature(&method.node));

            if overrides {
                // Same name, same signature: replace the inherited slot
                // in place, keeping its offset stable.
                let offset = vt.offset_of(method_name, name)?;
                vt.slots[offset] = label;
                vt.impls.insert(method_name.clone(), &method.node);
            } else {
                // New name, or a name collision with a different
                // signature: append a fresh slot and rebind the name's
                // offset to it. A collision leaves the old slot in the
                // array, reachable only through ancestor tables.
                vt.slots.push(label);
                vt.offsets.insert(method_name.clone(), vt.slots.len() - 1);
                vt.impls.insert(method_name.clone(), &method.node);
            }
        }

        self.building.remove(name);
        Ok(vt)
    }
}
