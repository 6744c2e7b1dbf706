//! Scopes: unary operators over an unscoped provider that add caching or
//! lifetime semantics (§3, §4.E step 1, §4.F point 3, §5).

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::binding::{Injectable, InjectionPoint};
use crate::error::ProvisionError;
use crate::key::TypeLiteral;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Per-binding memoisation cell. Each compiled [`crate::binding::Binding`]
/// owns exactly one of these; scopes never share cells across bindings, so a
/// `Singleton`-scoped binding caches independently of every other singleton.
pub struct ScopeCell(Mutex<Option<Arc<dyn Any + Send + Sync>>>);

impl ScopeCell {
    pub fn new() -> Self {
        Self(Mutex::new(None))
    }

    pub fn is_populated(&self) -> bool {
        self.0.lock().unwrap().is_some()
    }
}

impl Default for ScopeCell {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type UnscopedFactory<'a> = dyn Fn() -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> + 'a;

/// Transforms an unscoped provider into one with defined caching/lifetime
/// semantics. `cell` is the calling binding's private memoisation slot.
pub trait Scope: Send + Sync {
    fn name(&self) -> &'static str;

    fn get_or_create(
        &self,
        cell: &ScopeCell,
        create: &UnscopedFactory<'_>,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError>;
}

impl fmt::Debug for dyn Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// NoScope
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Pass-through: every request invokes the underlying provider again.
pub struct NoScope;

impl Scope for NoScope {
    fn name(&self) -> &'static str {
        "NoScope"
    }

    fn get_or_create(
        &self,
        _cell: &ScopeCell,
        create: &UnscopedFactory<'_>,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        create()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// SingletonScope
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// At-most-one construction per injector. The first caller to observe an
/// empty cell constructs the value while holding the lock; every later
/// caller (same thread or not) sees a fully published clone of the `Arc`.
pub struct SingletonScope;

impl Scope for SingletonScope {
    fn name(&self) -> &'static str {
        "Singleton"
    }

    fn get_or_create(
        &self,
        cell: &ScopeCell,
        create: &UnscopedFactory<'_>,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        let mut guard = cell.0.lock().unwrap();
        if let Some(inst) = guard.as_ref() {
            return Ok(inst.clone());
        }
        let inst = create()?;
        *guard = Some(inst.clone());
        Ok(inst)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// How a [`crate::element::Element::Binding`] participates in scoping.
/// `ScopeAnnotation` is resolved against the compiler's scope-registration
/// map during compilation (§4.E step 2); by the time a [`crate::binding::Binding`]
/// exists only `Unscoped` or `Explicit` remain, annotated by whether eager
/// promotion applied.
#[derive(Clone)]
pub enum Scoping {
    Unscoped,
    ScopeAnnotation(std::any::TypeId, &'static str),
    Explicit(Arc<dyn Scope>),
    /// Singleton promoted to construct at injector-creation time (§4.E step 6).
    EagerSingleton,
}

impl Scoping {
    pub fn is_singleton_like(&self) -> bool {
        matches!(self, Scoping::EagerSingleton)
            || matches!(self, Scoping::Explicit(s) if s.name() == "Singleton")
    }
}

impl fmt::Debug for Scoping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoping::Unscoped => write!(f, "Unscoped"),
            Scoping::ScopeAnnotation(_, name) => write!(f, "@{name}"),
            Scoping::Explicit(s) => write!(f, "{}", s.name()),
            Scoping::EagerSingleton => write!(f, "EagerSingleton"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The injector-wide posture seeded at `Key::of::<Stage>()` by every
/// [`crate::compiler::compile`] pass (§4.E step 1), driving how eagerly
/// singletons are constructed at injector creation (§4.E step 6, §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Stage {
    /// Eager construction is limited to bindings explicitly marked
    /// `as_eager_singleton()`. The default for `Injector::create`.
    #[default]
    Development,
    /// Every `Singleton`-scoped binding is constructed at injector-creation
    /// time, not just ones explicitly marked eager.
    Production,
    /// Eager construction is suppressed entirely, even for bindings marked
    /// `as_eager_singleton()` — for introspection tooling (graph dumps,
    /// validation) that configures an injector without wanting to run any
    /// constructor's side effects.
    Tool,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Development => "DEVELOPMENT",
            Stage::Production => "PRODUCTION",
            Stage::Tool => "TOOL",
        };
        f.write_str(s)
    }
}

impl Injectable for Stage {
    /// Never actually invoked: `Stage` is seeded directly into the compiled
    /// graph rather than constructed, but it still needs an `Injectable`
    /// impl so it can be requested through the ordinary `get_instance::<Stage>()`
    /// surface like any other dependency.
    fn injection_point() -> Arc<InjectionPoint> {
        InjectionPoint::new("stage", TypeLiteral::of::<Stage>(), Vec::new())
    }

    fn construct(_args: Vec<Option<Arc<dyn Any + Send + Sync>>>) -> Result<Self, ProvisionError> {
        unreachable!("Stage is seeded by the compiler, never constructed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn singleton_constructs_once() {
        let calls = AtomicUsize::new(0);
        let cell = ScopeCell::new();
        let scope = SingletonScope;
        let make = || -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(42u32))
        };
        let a = scope.get_or_create(&cell, &make).unwrap();
        let b = scope.get_or_create(&cell, &make).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn no_scope_constructs_every_time() {
        let calls = AtomicUsize::new(0);
        let cell = ScopeCell::new();
        let scope = NoScope;
        let make = || -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(42u32))
        };
        scope.get_or_create(&cell, &make).unwrap();
        scope.get_or_create(&cell, &make).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
