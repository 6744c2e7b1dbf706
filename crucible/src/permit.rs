//! Restricted binding sources: a qualifier or concrete type can demand that
//! only modules carrying a matching permit (or matching an exemption regex)
//! bind it directly (§4.D).
//!
//! Rust has no reflection over "annotations on an annotation type", so a
//! restriction is registered explicitly via
//! `Binder::restrict_binding_source::<T>(..)` rather than discovered by
//! scanning `T`'s definition — see DESIGN.md OQ-3. The same substitution
//! applies to permits themselves: a module grants one by overriding
//! [`crate::recorder::Module::permits`] instead of being annotated.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;

use crate::key::TypeLiteral;
use crate::source::ModuleSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestrictionLevel {
    Warning,
    Error,
}

/// A restriction attached to a qualifier annotation type or a concrete type:
/// only modules whose accumulated permit set intersects `acceptable_permits`,
/// or whose module-chain name matches `exempt_modules`, may bind it.
#[derive(Clone)]
pub struct RestrictedBindingSource {
    pub acceptable_permits: Vec<TypeLiteral>,
    pub exempt_modules: Option<Arc<Regex>>,
    pub level: RestrictionLevel,
}

impl RestrictedBindingSource {
    pub fn new(acceptable_permits: Vec<TypeLiteral>) -> Self {
        Self {
            acceptable_permits,
            exempt_modules: None,
            level: RestrictionLevel::Error,
        }
    }

    pub fn exempting(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.exempt_modules = Some(Arc::new(Regex::new(pattern)?));
        Ok(self)
    }

    pub fn as_warning(mut self) -> Self {
        self.level = RestrictionLevel::Warning;
        self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The accumulated permit set for every [`ModuleSource`] node visited during
/// recording, keyed by node identity. Built incrementally as modules are
/// pushed; read only during the compiler's validation pass, then dropped —
/// nothing after injector construction needs it, which is this crate's
/// equivalent of Guice's explicit `PermitMap.clear()`.
#[derive(Default)]
pub struct PermitMap {
    effective: HashMap<usize, HashSet<TypeId>>,
}

impl PermitMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the effective (parent ∪ local) permit set for `node` and
    /// returns it. Idempotent: re-recording the same node is a no-op.
    pub fn record(&mut self, node: &Arc<ModuleSource>) -> &HashSet<TypeId> {
        let id = node.identity();
        if !self.effective.contains_key(&id) {
            let mut set = match &node.parent {
                Some(parent) if !node.scanner_reset => {
                    self.record(parent);
                    self.effective[&parent.identity()].clone()
                }
                _ => HashSet::new(),
            };
            set.extend(node.local_permits.iter().map(|t| t.type_id()));
            self.effective.insert(id, set);
        }
        self.effective.get(&id).unwrap()
    }

    pub fn effective_for(&self, node: &Arc<ModuleSource>) -> HashSet<TypeId> {
        self.effective.get(&node.identity()).cloned().unwrap_or_default()
    }

    /// Checks `node`'s effective permits (and its module-chain names) against
    /// a restriction, returning `Ok(())` if the binding is allowed.
    pub fn check(&self, node: &Arc<ModuleSource>, restriction: &RestrictedBindingSource) -> Result<(), String> {
        if let Some(re) = &restriction.exempt_modules {
            if node.chain_names().iter().any(|name| re.is_match(name)) {
                return Ok(());
            }
        }
        let effective = self.effective_for(node);
        let allowed = restriction
            .acceptable_permits
            .iter()
            .any(|p| effective.contains(&p.type_id()));
        if allowed {
            Ok(())
        } else {
            Err(format!(
                "module chain {:?} lacks a required permit ({} accepted)",
                node.chain_names(),
                restriction
                    .acceptable_permits
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PermitA;
    struct PermitB;

    #[test]
    fn child_inherits_parent_permit() {
        let root = ModuleSource::root("root", vec![TypeLiteral::of::<PermitA>()]);
        let child = root.child("child", vec![]);
        let mut map = PermitMap::new();
        let effective = map.record(&child).clone();
        assert!(effective.contains(&TypeId::of::<PermitA>()));
    }

    #[test]
    fn restriction_rejects_missing_permit() {
        let root = ModuleSource::root("root", vec![TypeLiteral::of::<PermitA>()]);
        let mut map = PermitMap::new();
        map.record(&root);
        let restriction = RestrictedBindingSource::new(vec![TypeLiteral::of::<PermitB>()]);
        assert!(map.check(&root, &restriction).is_err());
    }

    #[test]
    fn exempt_module_bypasses_restriction() {
        let root = ModuleSource::root("test::FixtureModule", vec![]);
        let map = PermitMap::new();
        let restriction = RestrictedBindingSource::new(vec![TypeLiteral::of::<PermitA>()])
            .exempting("^test::")
            .unwrap();
        assert!(map.check(&root, &restriction).is_ok());
    }
}
