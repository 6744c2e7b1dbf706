//! Method interceptors: opaque AOP-style wrapping of a method call, matched
//! by declaring type and method name (§4.F point 7, §9 "opaque interceptor
//! invocation").
//!
//! Rust has no bytecode-level method interception, so a bound type opts in
//! explicitly by calling [`Invocation::proceed`] from a hand-written wrapper
//! method rather than having the injector instrument an arbitrary vtable
//! entry — a narrower mechanism than Guice's, recorded as DESIGN.md OQ-4.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::TypeLiteral;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Matches a declaring type and method name pair.
#[derive(Clone)]
pub struct InterceptorMatcher {
    type_matches: Arc<dyn Fn(&TypeLiteral) -> bool + Send + Sync>,
    method_matches: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl InterceptorMatcher {
    pub fn new(
        type_matches: impl Fn(&TypeLiteral) -> bool + Send + Sync + 'static,
        method_matches: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            type_matches: Arc::new(type_matches),
            method_matches: Arc::new(method_matches),
        }
    }

    pub fn any_method_on<T: 'static>() -> Self {
        let target = TypeLiteral::of::<T>();
        Self::new(move |t| t.type_id() == target.type_id(), |_| true)
    }

    pub fn matches(&self, t: &TypeLiteral, method: &str) -> bool {
        (self.type_matches)(t) && (self.method_matches)(method)
    }
}

impl fmt::Debug for InterceptorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InterceptorMatcher")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One intercepted call: the method name, the boxed argument tuple, and the
/// chain of remaining interceptors plus the original method, all reachable
/// only through [`Invocation::proceed`].
pub struct Invocation<'a> {
    pub method_name: &'static str,
    pub arguments: Vec<Arc<dyn Any + Send + Sync>>,
    chain: &'a mut dyn FnMut(&mut Invocation<'_>) -> Result<Arc<dyn Any + Send + Sync>, crate::error::ProvisionError>,
}

impl<'a> Invocation<'a> {
    pub fn new(
        method_name: &'static str,
        arguments: Vec<Arc<dyn Any + Send + Sync>>,
        chain: &'a mut dyn FnMut(&mut Invocation<'_>) -> Result<Arc<dyn Any + Send + Sync>, crate::error::ProvisionError>,
    ) -> Self {
        Self {
            method_name,
            arguments,
            chain,
        }
    }

    pub fn proceed(&mut self) -> Result<Arc<dyn Any + Send + Sync>, crate::error::ProvisionError> {
        (self.chain)(self)
    }
}

/// Wraps one matched method call. Registered alongside an
/// [`InterceptorMatcher`]; several interceptors matching the same call chain
/// in registration order.
pub trait MethodInterceptor: Send + Sync {
    fn invoke(&self, invocation: &mut Invocation<'_>) -> Result<Arc<dyn Any + Send + Sync>, crate::error::ProvisionError>;
}
