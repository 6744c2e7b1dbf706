//! The injection phase: resolves keys against a compiled [`BindingGraph`],
//! applying scopes, provision listeners, and just-in-time construction
//! (§4.F).

use std::any::Any;
use std::sync::Arc;

use tracing::{instrument, trace};

use crate::binding::{Binding, Dependency, Injectable};
use crate::compiler::{self, BindingGraph};
use crate::context::{self, ContextGuard};
use crate::element::Element;
use crate::error::{CreationException, ProvisionError};
use crate::interceptor::{Invocation, MethodInterceptor};
use crate::key::{Key, TypeLiteral};
use crate::listener::ProvisionInvocation;
use crate::recorder::{Elements, Module};
use crate::scope::{NoScope, Scope, SingletonScope, Stage};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A compiled, ready-to-use injection graph. Cheap to clone: internally an
/// `Arc` around the compiled state, mirroring the teacher's `Catalog`.
pub struct Injector {
    graph: BindingGraph,
    parent: Option<Arc<Injector>>,
    no_scope: Arc<dyn Scope>,
    singleton_scope: Arc<dyn Scope>,
}

impl Injector {
    /// Records every module's elements and compiles them into a ready
    /// injector in [`Stage::Development`], running eager singletons before
    /// returning (§4.E step 6). Use [`Injector::create_in_stage`] to run in
    /// `Production` (promotes every singleton to eager) or `Tool` (suppresses
    /// eager construction entirely).
    pub fn create(modules: Vec<Arc<dyn Module>>) -> Result<Arc<Self>, CreationException> {
        Self::create_in_stage(modules, Stage::Development)
    }

    /// Stage-aware counterpart of [`Injector::create`] (§6 named `Injector`
    /// constructor surface).
    pub fn create_in_stage(modules: Vec<Arc<dyn Module>>, stage: Stage) -> Result<Arc<Self>, CreationException> {
        let elements = Elements::get_elements(modules);
        Self::create_from_elements_in_stage(elements, stage)
    }

    pub fn create_from_elements(elements: Vec<Element>) -> Result<Arc<Self>, CreationException> {
        Self::create_from_elements_in_stage(elements, Stage::Development)
    }

    pub fn create_from_elements_in_stage(elements: Vec<Element>, stage: Stage) -> Result<Arc<Self>, CreationException> {
        let graph = compiler::compile(elements, stage)?;
        let injector = Self::from_graph(graph, None);
        injector.construct_eager_singletons()?;
        Ok(injector)
    }

    /// The stage this injector was compiled in (§6).
    pub fn stage(&self) -> Stage {
        self.graph.stage
    }

    pub(crate) fn from_graph(graph: BindingGraph, parent: Option<Arc<Injector>>) -> Arc<Self> {
        Arc::new(Self {
            graph,
            parent,
            no_scope: Arc::new(NoScope),
            singleton_scope: Arc::new(SingletonScope),
        })
    }

    fn construct_eager_singletons(self: &Arc<Self>) -> Result<(), CreationException> {
        let mut messages = Vec::new();
        for key in &self.graph.eager_singletons {
            let dependency = Dependency::new(key.clone());
            if let Err(e) = self.resolve_any(key, &dependency) {
                messages.push(e.message);
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(CreationException::new(messages))
        }
    }

    fn lookup(&self, key: &Key) -> Option<Arc<Binding>> {
        self.graph
            .bindings
            .get(key)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.lookup(key)))
    }

    pub(crate) fn binding_for(&self, key: &Key) -> Option<Arc<Binding>> {
        self.lookup(key)
    }

    pub fn no_scope(&self) -> &dyn Scope {
        self.no_scope.as_ref()
    }

    pub fn singleton_scope(&self) -> &dyn Scope {
        self.singleton_scope.as_ref()
    }

    /// Resolves `key` to a type-erased instance, following linked and
    /// exposed bindings, applying scoping and provision listeners, and
    /// detecting cycles against the calling thread's stack (§4.F, §5). A
    /// cycle through an interface-typed binding (`bind_interface`) reports a
    /// clearer diagnostic than a concrete-type cycle, since Guice would
    /// normally proxy the former — see [`ProvisionError::cyclic_interface_proxy_unavailable`]
    /// and DESIGN.md OQ-6.
    #[instrument(level = "trace", skip(self, dependency))]
    pub fn resolve_any(&self, key: &Key, dependency: &Dependency) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        let binding = self
            .lookup(key)
            .ok_or_else(|| ProvisionError::missing_binding(key, context::snapshot()))?;
        if context::is_on_stack(key) {
            let chain = context::snapshot();
            return Err(if binding.is_interface && !self.graph.options.disable_circular_proxies {
                ProvisionError::cyclic_interface_proxy_unavailable(chain, key)
            } else {
                ProvisionError::cyclic(chain)
            });
        }
        let _guard = ContextGuard::push(dependency.clone());
        self.provision(key, &binding, dependency)
    }

    fn provision(
        &self,
        key: &Key,
        binding: &Arc<Binding>,
        dependency: &Dependency,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        let listeners: Vec<_> = self
            .graph
            .provision_listeners
            .iter()
            .filter(|(matcher, _)| matcher.matches(&key.type_literal()))
            .map(|(_, listener)| listener.clone())
            .collect();
        self.provision_chain(key, binding, dependency, &listeners)
    }

    fn provision_chain(
        &self,
        key: &Key,
        binding: &Arc<Binding>,
        dependency: &Dependency,
        listeners: &[Arc<dyn crate::listener::ProvisionListener>],
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        match listeners.split_first() {
            None => binding.resolve_any(self, dependency),
            Some((head, rest)) => {
                let invocation = ProvisionInvocation {
                    key,
                    binding_source: &binding.source,
                };
                let mut thunk = || self.provision_chain(key, binding, dependency, rest);
                head.on_provision(&invocation, &mut thunk)
            }
        }
    }

    /// Resolves a statically-known, [`Injectable`] type, falling back to
    /// just-in-time construction when no module bound it explicitly. JIT
    /// construction only works at a call site where `T` is concrete — this
    /// port has no mechanism to construct an arbitrary unbound type reached
    /// only through a type-erased [`Key`] partway through someone else's
    /// dependency graph; see DESIGN.md OQ-1.
    pub fn get_instance<T: Injectable>(self: &Arc<Self>) -> Result<Arc<T>, ProvisionError> {
        self.get_instance_keyed(Key::of::<T>())
    }

    pub fn get_instance_keyed<T: Injectable>(self: &Arc<Self>, key: Key) -> Result<Arc<T>, ProvisionError> {
        let dependency = Dependency::new(key.clone());
        if let Some(binding) = self.lookup(&key) {
            let _guard = ContextGuard::push(dependency.clone());
            return binding.resolve::<T>(self, &dependency);
        }
        if self.graph.options.require_explicit_bindings {
            return Err(ProvisionError::missing_binding(&key, context::snapshot()));
        }
        self.construct_jit::<T>(dependency)
    }

    fn construct_jit<T: Injectable>(self: &Arc<Self>, dependency: Dependency) -> Result<Arc<T>, ProvisionError> {
        if context::is_on_stack(&dependency.key) {
            return Err(ProvisionError::cyclic(context::snapshot()));
        }
        trace!(key = ?dependency.key, "just-in-time construction");
        let _guard = ContextGuard::push(dependency.clone());
        let point = T::injection_point();
        let mut args = Vec::with_capacity(point.dependency_keys.len());
        for dep in point.dependencies() {
            match self.resolve_any(&dep.key, &dep) {
                Ok(v) => args.push(Some(v)),
                Err(_) if dep.nullable => args.push(None),
                Err(e) => return Err(e),
            }
        }
        let instance = T::construct(args)?;
        let scope: &dyn Scope = match T::scoping() {
            crate::scope::Scoping::EagerSingleton | crate::scope::Scoping::Explicit(_) => self.singleton_scope(),
            _ => self.no_scope(),
        };
        let cell = crate::scope::ScopeCell::new();
        let erased = scope.get_or_create(&cell, &|| Ok(Arc::new(instance) as Arc<dyn Any + Send + Sync>))?;
        Ok(erased
            .downcast()
            .unwrap_or_else(|_| panic!("JIT construct() returned the wrong concrete type for {}", std::any::type_name::<T>())))
    }

    /// Returns a cloneable provider for `key`, deferring resolution to each
    /// call of the returned closure (§4.F `get_provider`).
    pub fn get_provider<T: 'static + Send + Sync>(
        self: &Arc<Self>,
        key: Key,
    ) -> impl Fn() -> Result<Arc<T>, ProvisionError> + Send + Sync + 'static {
        let injector = self.clone();
        move || {
            let dependency = Dependency::new(key.clone());
            let binding = injector
                .lookup(&key)
                .ok_or_else(|| ProvisionError::missing_binding(&key, context::snapshot()))?;
            binding.resolve::<T>(&injector, &dependency)
        }
    }

    /// Spawns a child injector layered on top of `self`, the runtime
    /// counterpart of a private environment created outside module
    /// recording (§4.G).
    pub fn create_child_injector(self: &Arc<Self>, modules: Vec<Arc<dyn Module>>) -> Result<Arc<Self>, CreationException> {
        let elements = Elements::get_elements(modules);
        let graph = compiler::compile(elements, self.graph.stage)?;
        let child = Self::from_graph(graph, Some(self.clone()));
        child.construct_eager_singletons()?;
        Ok(child)
    }

    pub fn all_bindings(&self) -> impl Iterator<Item = &Arc<Binding>> {
        self.graph.bindings.values()
    }

    /// Runs every registered [`MethodInterceptor`] matching `(type_literal,
    /// method_name)`, in registration order, wrapping `body` — the actual
    /// method call. A bound type opts in by calling this from a
    /// hand-written wrapper method instead of the call being woven in
    /// automatically (§9, DESIGN.md OQ-4).
    pub fn invoke_intercepted(
        &self,
        type_literal: TypeLiteral,
        method_name: &'static str,
        arguments: Vec<Arc<dyn Any + Send + Sync>>,
        body: &mut dyn FnMut(Vec<Arc<dyn Any + Send + Sync>>) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError>,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        let matched: Vec<Arc<dyn MethodInterceptor>> = self
            .graph
            .interceptors
            .iter()
            .filter(|(matcher, _)| matcher.matches(&type_literal, method_name))
            .map(|(_, interceptor)| interceptor.clone())
            .collect();
        Self::run_interceptor_chain(&matched, method_name, arguments, body)
    }

    fn run_interceptor_chain(
        interceptors: &[Arc<dyn MethodInterceptor>],
        method_name: &'static str,
        arguments: Vec<Arc<dyn Any + Send + Sync>>,
        body: &mut dyn FnMut(Vec<Arc<dyn Any + Send + Sync>>) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError>,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        match interceptors.split_first() {
            None => body(arguments),
            Some((head, rest)) => {
                let mut proceed = |invocation: &mut Invocation<'_>| {
                    let args = std::mem::take(&mut invocation.arguments);
                    Self::run_interceptor_chain(rest, method_name, args, &mut *body)
                };
                let mut invocation = Invocation::new(method_name, arguments, &mut proceed);
                head.invoke(&mut invocation)
            }
        }
    }
}
