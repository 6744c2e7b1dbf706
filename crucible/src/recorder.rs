//! The configuration phase: `Module::configure` appends [`Element`]s to a
//! `Binder` instead of mutating shared state (§3, §4.B).
//!
//! Module installation is deduplicated by pointer identity so that the same
//! module instance installed twice (directly, or transitively through two
//! other modules) contributes its elements only once — mirrors Guice's
//! `Binder.install` de-duplication.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::marker::Unsize;
use std::sync::Arc;

use tracing::trace;

use crate::element::{BindingTarget, Element, ModuleOption};
use crate::error::Message;
use crate::interceptor::{InterceptorMatcher, MethodInterceptor};
use crate::key::{Key, Qualifier, TypeLiteral};
use crate::listener::{ProvisionListener, TypeListener, TypeMatcher};
use crate::permit::RestrictedBindingSource;
use crate::scope::{Scope, Scoping};
use crate::source::{DeclaringSource, ElementSource, ModuleSource};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A unit of configuration. `permits()` stands in for annotation-based
/// permit grants (§4.D) — see DESIGN.md OQ-3.
pub trait Module: Send + Sync {
    fn configure(&self, binder: &mut Binder<'_>);

    fn permits(&self) -> Vec<TypeLiteral> {
        Vec::new()
    }

    /// Used only for install-once de-duplication and error messages; override
    /// if several instances of the same module type should be treated as
    /// distinct (rare).
    fn module_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Accumulates [`Element`]s for the module currently being configured.
/// Handed to `Module::configure` by [`Elements::get_elements`].
pub struct Binder<'a> {
    elements: &'a mut Vec<Element>,
    module_source: Arc<ModuleSource>,
}

impl<'m> Binder<'m> {
    fn source(&self) -> ElementSource {
        ElementSource::new(DeclaringSource::here(), self.module_source.clone())
    }

    #[track_caller]
    pub fn bind<T: 'static + Send + Sync>(&mut self) -> BindingBuilder<'_, 'm, T> {
        BindingBuilder::new(self, Key::of::<T>())
    }

    #[track_caller]
    pub fn bind_key<T: 'static + Send + Sync>(&mut self, key: Key) -> BindingBuilder<'_, 'm, T> {
        BindingBuilder::new(self, key)
    }

    /// Binds a trait object key to a concrete implementation type, the
    /// equivalent of Guice's `bind(Iface.class).to(Impl.class)` for an
    /// interface. `Impl: Unsize<Iface>` is how the teacher's own
    /// `CatalogBuilder::bind` expresses "Impl implements Iface" generically
    /// without knowing either type at the point this method is defined.
    #[track_caller]
    pub fn bind_interface<Iface, Impl>(&mut self) -> InterfaceBindingBuilder<'_, 'm, Iface>
    where
        Iface: 'static + ?Sized,
        Impl: Unsize<Iface> + 'static + Send + Sync,
    {
        InterfaceBindingBuilder {
            binder: self,
            key: Key::of::<Iface>(),
            caster: Arc::new(crate::binding::TypeCaster::<Iface>::upcast::<Impl>()),
            _marker: std::marker::PhantomData,
        }
    }

    #[track_caller]
    pub fn bind_scope(&mut self, annotation: TypeLiteral, scope: Arc<dyn Scope>) {
        let source = self.source();
        self.elements.push(Element::ScopeRegistration {
            annotation: annotation.type_id(),
            annotation_name: annotation.name(),
            scope,
            source,
        });
    }

    #[track_caller]
    pub fn convert_to_types(&mut self, converter: Arc<dyn crate::convert::TypeConverter>) {
        let source = self.source();
        self.elements.push(Element::TypeConverterRegistration { converter, source });
    }

    #[track_caller]
    pub fn bind_interceptor(&mut self, matcher: InterceptorMatcher, interceptor: Arc<dyn MethodInterceptor>) {
        let source = self.source();
        self.elements.push(Element::InterceptorRegistration {
            interceptor,
            matcher,
            source,
        });
    }

    #[track_caller]
    pub fn require_injection(&mut self, key: Key) {
        let source = self.source();
        self.elements.push(Element::InjectionRequest { key, source });
    }

    #[track_caller]
    pub fn get_provider(&mut self, key: Key) {
        let source = self.source();
        self.elements.push(Element::ProviderLookup { key, source });
    }

    #[track_caller]
    pub fn bind_listener(&mut self, matcher: TypeMatcher, listener: Arc<dyn TypeListener>) {
        let source = self.source();
        self.elements.push(Element::TypeListenerRegistration { matcher, listener, source });
    }

    #[track_caller]
    pub fn bind_provision_listener(&mut self, matcher: TypeMatcher, listener: Arc<dyn ProvisionListener>) {
        let source = self.source();
        self.elements.push(Element::ProvisionListenerRegistration { matcher, listener, source });
    }

    #[track_caller]
    pub fn add_message(&mut self, message: Message) {
        let source = self.source();
        self.elements.push(Element::Message { message, source });
    }

    #[track_caller]
    pub fn restrict_binding_source(&mut self, target: TypeLiteral, restriction: RestrictedBindingSource) {
        let source = self.source();
        self.elements.push(Element::RestrictionRegistration {
            target: target.type_id(),
            target_name: target.name(),
            restriction,
            source,
        });
    }

    #[track_caller]
    pub fn set_option(&mut self, option: ModuleOption) {
        let source = self.source();
        self.elements.push(Element::ModuleOption { option, source });
    }

    /// Appends a previously recorded element verbatim. The primitive
    /// `Elements::get_module`'s round-trip module replays a stream with
    /// (§6 Element API round-trip contract).
    pub fn push_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Installs `module` as a sub-module of the one currently configuring,
    /// unless an install with the same name has already happened anywhere in
    /// this `get_elements` call (§4.B install-once semantics).
    pub fn install(&mut self, module: &dyn Module, seen: &mut HashSet<&'static str>) {
        if !seen.insert(module.module_name()) {
            trace!(module = module.module_name(), "skipping duplicate module install");
            return;
        }
        let child_source = self
            .module_source
            .child(module.module_name(), module.permits());
        let mut child_binder = Binder {
            elements: self.elements,
            module_source: child_source,
        };
        module.configure(&mut child_binder);
    }

    /// Records `elements` (built by a fully independent recording pass) as a
    /// private environment nested under the current source (§3, §4.G).
    pub fn install_private(&mut self, elements: Vec<Element>, exposed_keys: Vec<Key>) {
        let source = self.source();
        let exposed_keys = exposed_keys.into_iter().map(|k| (k, source.clone())).collect();
        self.elements.push(Element::PrivateEnvironment {
            elements,
            exposed_keys,
            source,
        });
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Fluent continuation of `Binder::bind`.
pub struct BindingBuilder<'a, 'b, T> {
    binder: &'a mut Binder<'b>,
    key: Key,
    scoping: Scoping,
    _marker: std::marker::PhantomData<T>,
}

/// Fluent continuation of `Binder::bind_interface`.
pub struct InterfaceBindingBuilder<'a, 'b, Iface: ?Sized> {
    binder: &'a mut Binder<'b>,
    key: Key,
    caster: Arc<dyn Any + Send + Sync>,
    _marker: std::marker::PhantomData<Iface>,
}

impl<'a, 'b, Iface: 'static + ?Sized> InterfaceBindingBuilder<'a, 'b, Iface> {
    pub fn annotated_with(mut self, qualifier: Qualifier) -> Self {
        self.key = self.key.with_qualifier(qualifier);
        self
    }

    /// Links the interface key to `impl_key`, usually the key under which
    /// the implementation type was separately bound with `Binder::bind`.
    pub fn to(self, impl_key: Key) {
        let source = self.binder.source();
        self.binder.elements.push(Element::Binding {
            key: self.key,
            target: BindingTarget::LinkedKey(impl_key),
            scoping: Scoping::Unscoped,
            caster: self.caster,
            source,
            is_interface: true,
        });
    }
}

impl<'a, 'b, T: 'static + Send + Sync> BindingBuilder<'a, 'b, T> {
    fn new(binder: &'a mut Binder<'b>, key: Key) -> Self {
        Self {
            binder,
            key,
            scoping: Scoping::Unscoped,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn annotated_with(mut self, qualifier: Qualifier) -> Self {
        self.key = self.key.with_qualifier(qualifier);
        self
    }

    pub fn in_scope(mut self, scope: Arc<dyn Scope>) -> Self {
        self.scoping = Scoping::Explicit(scope);
        self
    }

    pub fn in_scope_annotation<Q: 'static>(mut self) -> Self {
        self.scoping = Scoping::ScopeAnnotation(TypeId::of::<Q>(), std::any::type_name::<Q>());
        self
    }

    pub fn as_eager_singleton(mut self) -> Self {
        self.scoping = Scoping::EagerSingleton;
        self
    }

    fn push(self, target: BindingTarget, caster: Arc<dyn Any + Send + Sync>) {
        let source = self.binder.source();
        self.binder.elements.push(Element::Binding {
            key: self.key,
            target,
            scoping: self.scoping,
            caster,
            source,
            is_interface: false,
        });
    }

    pub fn to_key(self, target: Key) {
        let caster = Arc::new(crate::binding::TypeCaster::<T>::identity());
        self.push(BindingTarget::LinkedKey(target), caster);
    }

    pub fn to_instance(self, instance: T) {
        let caster = Arc::new(crate::binding::TypeCaster::<T>::identity());
        self.push(BindingTarget::Instance(Arc::new(instance)), caster);
    }

    pub fn to_provider<F>(self, factory: F)
    where
        F: Fn(&crate::injector::Injector, &crate::binding::Dependency) -> Result<Arc<T>, crate::error::ProvisionError>
            + Send
            + Sync
            + 'static,
    {
        let caster = Arc::new(crate::binding::TypeCaster::<T>::identity());
        let wrapped = move |injector: &crate::injector::Injector, dep: &crate::binding::Dependency| {
            factory(injector, dep).map(|v| v as Arc<dyn Any + Send + Sync>)
        };
        self.push(BindingTarget::Provider(Arc::new(wrapped)), caster);
    }

    pub fn to_constant(self, text: impl Into<String>) {
        let caster = Arc::new(crate::binding::TypeCaster::<T>::identity());
        self.push(BindingTarget::Constant(text.into()), caster);
    }
}

impl<'a, 'b, T: crate::binding::Injectable> BindingBuilder<'a, 'b, T> {
    /// Binds `T` to its own [`Injectable::construct`], resolving each
    /// constructor dependency through the owning injector. This is the
    /// explicit counterpart of just-in-time construction (§4.F point 4):
    /// unlike the JVM original, a key reached only through another binding's
    /// dependency list is never constructed reflectively, so any `Injectable`
    /// type that participates in the graph below the top level needs this
    /// call somewhere in a module (see DESIGN.md OQ-1).
    pub fn to_self(self) {
        if !matches!(self.scoping, Scoping::Unscoped) {
            let scoping = self.scoping.clone();
            self.to_provider_with_scoping(scoping);
            return;
        }
        let scoping = T::scoping();
        self.to_provider_with_scoping(scoping);
    }

    fn to_provider_with_scoping(mut self, scoping: Scoping) {
        self.scoping = scoping;
        self.to_provider(|injector, _dependency| {
            let point = T::injection_point();
            let mut args = Vec::with_capacity(point.dependency_keys.len());
            for dep in point.dependencies() {
                match injector.resolve_any(&dep.key, &dep) {
                    Ok(v) => args.push(Some(v)),
                    Err(_) if dep.nullable => args.push(None),
                    Err(e) => return Err(e),
                }
            }
            T::construct(args).map(Arc::new)
        });
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Runs every module's `configure` exactly once, producing the flat element
/// stream the compiler consumes (§4.B).
pub struct Elements;

impl Elements {
    pub fn get_elements(modules: Vec<Arc<dyn Module>>) -> Vec<Element> {
        let mut elements = Vec::new();
        let mut seen = HashSet::new();
        for module in modules {
            if !seen.insert(module.module_name()) {
                continue;
            }
            let module_source = ModuleSource::root(module.module_name(), module.permits());
            let mut binder = Binder {
                elements: &mut elements,
                module_source,
            };
            module.configure(&mut binder);
        }
        elements
    }

    /// The round-trip counterpart of [`Elements::get_elements`] (§6 Element
    /// API round-trip contract): wraps a previously recorded element stream
    /// back into a [`Module`] whose `configure` replays it verbatim, so
    /// `get_elements(vec![get_module(elements)])` reproduces `elements`.
    /// Element equality itself isn't checkable (several variants carry
    /// `Arc<dyn Trait>` factories with no meaningful `PartialEq`), so callers
    /// compare the *compiled* `BindingGraph`s the two streams produce rather
    /// than the element lists themselves.
    pub fn get_module(elements: Vec<Element>) -> Arc<dyn Module> {
        Arc::new(ReplayModule { elements })
    }
}

struct ReplayModule {
    elements: Vec<Element>,
}

impl Module for ReplayModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        for element in &self.elements {
            binder.push_element(element.clone());
        }
    }

    fn module_name(&self) -> &'static str {
        "crucible::recorder::ReplayModule"
    }
}
