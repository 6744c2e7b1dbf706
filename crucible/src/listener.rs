//! Type and provision listeners: hooks invoked as the injector learns about
//! a type's injectable members, and each time it provisions an instance
//! (§4.F point 7).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::binding::InjectionPoint;
use crate::error::ProvisionError;
use crate::key::{Key, TypeLiteral};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Matches against a [`TypeLiteral`] to decide whether a listener applies.
/// Kept as a boxed predicate rather than a matcher-combinator tree — Rust's
/// lack of runtime annotation introspection makes most of Guice's
/// `Matchers.annotatedWith(...)` family inexpressible, so modules match on
/// the type name or `TypeId` directly.
#[derive(Clone)]
pub struct TypeMatcher(Arc<dyn Fn(&TypeLiteral) -> bool + Send + Sync>);

impl TypeMatcher {
    pub fn new(f: impl Fn(&TypeLiteral) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn any() -> Self {
        Self::new(|_| true)
    }

    pub fn exact<T: 'static>() -> Self {
        let target = TypeLiteral::of::<T>();
        Self::new(move |t| t.type_id() == target.type_id())
    }

    pub fn matches(&self, t: &TypeLiteral) -> bool {
        (self.0)(t)
    }
}

impl fmt::Debug for TypeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeMatcher")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Observes a type the first time the injector encounters its injection
/// point, mirroring Guice's `TypeListener.hear`.
pub trait TypeListener: Send + Sync {
    fn hear(&self, type_literal: &TypeLiteral, injection_point: &Arc<InjectionPoint>);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// What a `ProvisionListener` observes about one provisioning call.
pub struct ProvisionInvocation<'a> {
    pub key: &'a Key,
    pub binding_source: &'a crate::source::ElementSource,
}

type ProvisionThunk<'a> = dyn FnMut() -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> + 'a;

/// Observes every provisioning call for a matching key, wrapping the
/// underlying factory call. A listener that never calls `provision` simply
/// suppresses construction for that call.
pub trait ProvisionListener: Send + Sync {
    fn on_provision(
        &self,
        invocation: &ProvisionInvocation<'_>,
        provision: &mut ProvisionThunk<'_>,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError>;
}
