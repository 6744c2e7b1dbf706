//! Turns the flat element stream into an immutable binding map (§4.E).
//!
//! The six passes described in the specification — seed, register, validate,
//! private-environment compilation, constant conversion, eager-singleton
//! collection — run in that order, each accumulating into the same
//! [`Message`] list rather than stopping at the first failure, so a single
//! `create_injector` call reports every configuration problem at once.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binding::{Binding, BindingKind};
use crate::convert::TypeConverterRegistry;
use crate::element::{BindingTarget, Element, ModuleOption};
use crate::error::{CreationException, ErrorCode, Message};
use crate::injector::Injector;
use crate::interceptor::{InterceptorMatcher, MethodInterceptor};
use crate::key::{Key, Qualifier};
use crate::listener::{ProvisionListener, TypeListener, TypeMatcher};
use crate::permit::{PermitMap, RestrictedBindingSource};
use crate::scope::{Scope, Scoping, Stage};
use crate::source::ElementSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default, Clone, Copy)]
pub struct ModuleOptions {
    pub require_explicit_bindings: bool,
    pub require_at_inject_on_constructors: bool,
    pub require_exact_binding_annotations: bool,
    pub disable_circular_proxies: bool,
}

/// The product of compilation: an immutable binding map plus everything an
/// [`Injector`] needs to resolve, scope, and provision from it.
pub struct BindingGraph {
    pub bindings: HashMap<Key, Arc<Binding>>,
    pub scopes: HashMap<TypeId, Arc<dyn Scope>>,
    pub converters: TypeConverterRegistry,
    pub interceptors: Vec<(InterceptorMatcher, Arc<dyn MethodInterceptor>)>,
    pub type_listeners: Vec<(TypeMatcher, Arc<dyn TypeListener>)>,
    pub provision_listeners: Vec<(TypeMatcher, Arc<dyn ProvisionListener>)>,
    pub eager_singletons: Vec<Key>,
    pub options: ModuleOptions,
    pub stage: Stage,
}

/// Holds the working state across the passes below; consumed into a
/// [`BindingGraph`] once validation finishes.
struct Compiler {
    bindings: HashMap<Key, Arc<Binding>>,
    scopes: HashMap<TypeId, Arc<dyn Scope>>,
    converters: TypeConverterRegistry,
    interceptors: Vec<(InterceptorMatcher, Arc<dyn MethodInterceptor>)>,
    type_listeners: Vec<(TypeMatcher, Arc<dyn TypeListener>)>,
    provision_listeners: Vec<(TypeMatcher, Arc<dyn ProvisionListener>)>,
    eager_singletons: Vec<Key>,
    options: ModuleOptions,
    stage: Stage,
    restrictions: HashMap<TypeId, RestrictedBindingSource>,
    binding_sources: HashMap<Key, ElementSource>,
    permit_map: PermitMap,
    messages: Vec<Message>,
    pending_constants: Vec<(Key, String)>,
}

impl Compiler {
    fn new(stage: Stage) -> Self {
        Self {
            bindings: HashMap::new(),
            scopes: HashMap::new(),
            converters: TypeConverterRegistry::with_builtins(),
            interceptors: Vec::new(),
            type_listeners: Vec::new(),
            provision_listeners: Vec::new(),
            eager_singletons: Vec::new(),
            options: ModuleOptions::default(),
            stage,
            restrictions: HashMap::new(),
            binding_sources: HashMap::new(),
            permit_map: PermitMap::new(),
            messages: Vec::new(),
            pending_constants: Vec::new(),
        }
    }

    /// Seeds `Key::of::<Stage>()` with the injector's stage (§4.E step 1),
    /// so it can be requested through `get_instance::<Stage>()` like any
    /// other binding. Recorded before any module's elements are registered,
    /// so a module cannot collide with it except by also binding `Stage`
    /// itself, which correctly fails as a duplicate binding.
    fn seed_stage(&mut self, stage: Stage) {
        let key = Key::of::<Stage>();
        let source = ElementSource::new(
            crate::source::DeclaringSource::described("built-in Stage seed"),
            crate::source::ModuleSource::root("<built-in>", Vec::new()),
        );
        self.binding_sources.insert(key.clone(), source.clone());
        let caster = Arc::new(crate::binding::TypeCaster::<Stage>::identity());
        let binding = Binding::new(
            key.clone(),
            source,
            Scoping::Unscoped,
            BindingKind::Direct(Arc::new(move |_, _| Ok(Arc::new(stage) as Arc<dyn std::any::Any + Send + Sync>))),
            caster,
            false,
            false,
        );
        self.bindings.insert(key, binding);
    }

    fn register(&mut self, elements: Vec<Element>) {
        for element in elements {
            self.permit_map.record(&element.source().module_source.clone());
            match element {
                Element::Binding {
                    key,
                    target,
                    scoping,
                    caster,
                    source,
                    is_interface,
                } => self.register_binding(key, target, scoping, caster, source, is_interface),
                Element::ScopeRegistration {
                    annotation,
                    annotation_name,
                    scope,
                    source,
                } => {
                    if self.scopes.insert(annotation, scope).is_some() {
                        self.messages.push(
                            Message::new(
                                ErrorCode::DuplicateScopeRegistration,
                                format!("scope already registered for @{annotation_name}"),
                            )
                            .at(source),
                        );
                    }
                }
                Element::TypeConverterRegistration { converter, .. } => {
                    self.converters.register(converter);
                }
                Element::InterceptorRegistration {
                    interceptor, matcher, ..
                } => self.interceptors.push((matcher, interceptor)),
                Element::TypeListenerRegistration { matcher, listener, .. } => {
                    self.type_listeners.push((matcher, listener));
                }
                Element::ProvisionListenerRegistration { matcher, listener, .. } => {
                    self.provision_listeners.push((matcher, listener));
                }
                Element::Message { message, source } => self.messages.push(message.at(source)),
                Element::RestrictionRegistration {
                    target, restriction, ..
                } => {
                    self.restrictions.insert(target, restriction);
                }
                Element::PrivateEnvironment {
                    elements,
                    exposed_keys,
                    source,
                } => self.register_private_environment(elements, exposed_keys, source),
                Element::ModuleOption { option, .. } => match option {
                    ModuleOption::RequireExplicitBindings => self.options.require_explicit_bindings = true,
                    ModuleOption::RequireAtInjectOnConstructors => {
                        self.options.require_at_inject_on_constructors = true
                    }
                    ModuleOption::RequireExactBindingAnnotations => {
                        self.options.require_exact_binding_annotations = true
                    }
                    ModuleOption::DisableCircularProxies => self.options.disable_circular_proxies = true,
                },
                Element::InjectionRequest { .. }
                | Element::ProviderLookup { .. }
                | Element::StaticInjectionRequest { .. }
                | Element::MembersInjectorLookup { .. } => {
                    // Without reflection these are advisory only; the
                    // lookups they describe are satisfied the same way any
                    // other key lookup is, at the call site.
                }
            }
        }
    }

    fn register_binding(
        &mut self,
        key: Key,
        target: BindingTarget,
        scoping: Scoping,
        caster: Arc<dyn std::any::Any + Send + Sync>,
        source: ElementSource,
        is_interface: bool,
    ) {
        if let Some(existing) = self.binding_sources.get(&key) {
            self.messages.push(
                Message::new(
                    ErrorCode::BindingAlreadySet,
                    format!("a binding for {key:?} was already configured at {existing}"),
                )
                .at(source),
            );
            return;
        }
        self.binding_sources.insert(key.clone(), source.clone());

        if let Some(restriction) = self
            .restrictions
            .get(&key.type_literal().type_id())
            .or_else(|| key.qualifier().and_then(|q| self.restrictions.get(&q.annotation_type().type_id())))
        {
            if let Err(reason) = self.permit_map.check(&source.module_source, restriction) {
                let msg = Message::new(ErrorCode::RestrictionViolation, reason).at(source.clone());
                match restriction.level {
                    crate::permit::RestrictionLevel::Error => self.messages.push(msg),
                    crate::permit::RestrictionLevel::Warning => warn!("{msg}"),
                }
            }
        }

        match target {
            BindingTarget::Constant(text) => {
                self.pending_constants.push((key.clone(), text));
                // Placeholder until the conversion pass replaces it; never
                // observed because conversion always runs before `finish`.
                let binding = Binding::new(
                    key.clone(),
                    source,
                    scoping,
                    BindingKind::Direct(Arc::new(|_, _| {
                        unreachable!("constant binding not converted")
                    })),
                    caster,
                    false,
                    is_interface,
                );
                self.bindings.insert(key, binding);
            }
            BindingTarget::Instance(instance) => {
                let binding = Binding::new(
                    key.clone(),
                    source,
                    scoping,
                    BindingKind::Direct(Arc::new(move |_, _| Ok(instance.clone()))),
                    caster,
                    false,
                    is_interface,
                );
                self.bindings.insert(key, binding);
            }
            BindingTarget::Provider(factory) => {
                let binding = Binding::new(
                    key.clone(),
                    source,
                    scoping,
                    BindingKind::Direct(factory),
                    caster,
                    false,
                    is_interface,
                );
                self.bindings.insert(key, binding);
            }
            BindingTarget::LinkedKey(target_key) => {
                let binding = Binding::new(
                    key.clone(),
                    source,
                    scoping,
                    BindingKind::Linked(target_key),
                    caster,
                    false,
                    is_interface,
                );
                self.bindings.insert(key, binding);
            }
        }
    }

    fn register_private_environment(
        &mut self,
        elements: Vec<Element>,
        exposed_keys: Vec<(Key, ElementSource)>,
        source: ElementSource,
    ) {
        let graph = match compile(elements, self.stage) {
            Ok(g) => g,
            Err(exc) => {
                self.messages.extend(exc.messages);
                return;
            }
        };
        let child = Injector::from_graph(graph, None);
        for (key, expose_source) in exposed_keys {
            let Some(child_binding) = child.binding_for(&key) else {
                self.messages.push(
                    Message::new(
                        ErrorCode::MissingBinding,
                        format!("{key:?} exposed from a private environment has no binding inside it"),
                    )
                    .at(expose_source),
                );
                continue;
            };
            // Elements are registered in installation order (§4.B), so by
            // construction any pre-existing entry in `binding_sources` for
            // this key was installed before the private environment being
            // compiled right now. Per the documented override semantics for
            // private exposure (§8 scenario 5), the later-installed exposed
            // binding wins rather than erroring.
            if let Some(shadowed) = self.binding_sources.get(&key) {
                debug!(key = ?key, shadowed = %shadowed, "exposed private binding overrides an earlier outer binding");
            }
            self.binding_sources.insert(key.clone(), source.clone());
            let binding = Binding::new(
                key.clone(),
                source.clone(),
                Scoping::Unscoped,
                BindingKind::Exposed(child.clone(), key.clone()),
                child_binding.caster.clone(),
                false,
                child_binding.is_interface,
            );
            self.bindings.insert(key, binding);
        }
    }

    fn resolve_scope_annotations(&mut self) {
        let keys: Vec<Key> = self.bindings.keys().cloned().collect();
        for key in keys {
            let binding = self.bindings.get(&key).unwrap();
            if let Scoping::ScopeAnnotation(id, name) = &binding.scoping {
                match self.scopes.get(id).cloned() {
                    Some(scope) => {
                        let old = self.bindings.remove(&key).unwrap();
                        let rebuilt = rebind_scoping(&old, Scoping::Explicit(scope));
                        self.bindings.insert(key, rebuilt);
                    }
                    None => {
                        let source = self.binding_sources.get(&key).cloned();
                        let mut msg = Message::new(ErrorCode::ScopeNotFound, format!("no scope registered for @{name}"));
                        if let Some(s) = source {
                            msg = msg.at(s);
                        }
                        self.messages.push(msg);
                    }
                }
            }
        }
    }

    fn convert_constants(&mut self) {
        let pending = std::mem::take(&mut self.pending_constants);
        for (key, text) in pending {
            match self.converters.convert(&text, &key.type_literal()) {
                Ok(value) => {
                    let old = self.bindings.remove(&key).unwrap();
                    let rebuilt = Binding::new(
                        key.clone(),
                        old.source.clone(),
                        old.scoping.clone(),
                        BindingKind::Direct(Arc::new(move |_, _| Ok(value.clone()))),
                        old.caster.clone(),
                        false,
                        old.is_interface,
                    );
                    self.bindings.insert(key, rebuilt);
                }
                Err(mut msg) => {
                    if let Some(source) = self.binding_sources.get(&key) {
                        msg = msg.at(source.clone());
                    }
                    self.messages.push(msg);
                }
            }
        }
    }

    fn validate_explicit_bindings(&mut self) {
        if !self.options.require_explicit_bindings {
            return;
        }
        let linked_targets: Vec<(Key, Key, ElementSource)> = self
            .bindings
            .values()
            .filter_map(|b| match &b.kind {
                BindingKind::Linked(target) => Some((b.key.clone(), target.clone(), b.source.clone())),
                _ => None,
            })
            .collect();
        for (from, to, source) in linked_targets {
            if !self.bindings.contains_key(&to) {
                self.messages.push(
                    Message::new(
                        ErrorCode::MissingBinding,
                        format!("{from:?} links to {to:?}, which has no explicit binding and requireExplicitBindings is set"),
                    )
                    .at(source),
                );
            }
        }
    }

    /// §4.E step 6. In `Development`, only bindings explicitly marked
    /// `as_eager_singleton()` are constructed at injector-creation time. In
    /// `Production`, every `Singleton`-scoped binding is promoted, matching
    /// real Guice's "everything is eager in production" behavior. In `Tool`,
    /// eager construction is suppressed entirely so introspection doesn't run
    /// constructor side effects.
    fn collect_eager_singletons(&mut self) {
        self.eager_singletons = match self.stage {
            Stage::Tool => Vec::new(),
            Stage::Production => self
                .bindings
                .iter()
                .filter(|(_, b)| b.scoping.is_singleton_like())
                .map(|(k, _)| k.clone())
                .collect(),
            Stage::Development => self
                .bindings
                .iter()
                .filter(|(_, b)| matches!(b.scoping, Scoping::EagerSingleton))
                .map(|(k, _)| k.clone())
                .collect(),
        };
    }

    /// `requireExactBindingAnnotations` (§6): rejects the shortcut of using a
    /// bare marker qualifier (`Qualifier::Marker`, matched by annotation type
    /// alone) instead of a value-carrying one, the nearest equivalent this
    /// reflection-free design has to Guice's "binding annotation members must
    /// match exactly" requirement.
    fn validate_binding_annotations(&mut self) {
        if !self.options.require_exact_binding_annotations {
            return;
        }
        for (key, source) in &self.binding_sources {
            if matches!(key.qualifier(), Some(Qualifier::Marker(_))) {
                self.messages.push(
                    Message::new(
                        ErrorCode::IllegalQualifierPlacement,
                        format!(
                            "{key:?} is bound with a marker qualifier, but requireExactBindingAnnotations is set: \
                             use a value-carrying qualifier instead"
                        ),
                    )
                    .at(source.clone()),
                );
            }
        }
    }
}

fn rebind_scoping(old: &Binding, scoping: Scoping) -> Arc<Binding> {
    let kind = match &old.kind {
        BindingKind::Linked(k) => BindingKind::Linked(k.clone()),
        BindingKind::Exposed(child, k) => BindingKind::Exposed(child.clone(), k.clone()),
        BindingKind::Direct(factory) => BindingKind::Direct(factory.clone()),
    };
    Binding::new(
        old.key.clone(),
        old.source.clone(),
        scoping,
        kind,
        old.caster.clone(),
        old.is_jit,
        old.is_interface,
    )
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Compiles one element stream (top-level, or a private environment's
/// sub-stream) into a [`BindingGraph`], or a [`CreationException`] carrying
/// every problem found.
pub fn compile(elements: Vec<Element>, stage: Stage) -> Result<BindingGraph, CreationException> {
    let mut compiler = Compiler::new(stage);
    debug!(count = elements.len(), ?stage, "compiling element stream");
    compiler.seed_stage(stage);
    compiler.register(elements);
    compiler.resolve_scope_annotations();
    compiler.convert_constants();
    compiler.validate_explicit_bindings();
    compiler.validate_binding_annotations();
    compiler.collect_eager_singletons();

    if !compiler.messages.is_empty() {
        return Err(CreationException::new(compiler.messages));
    }

    Ok(BindingGraph {
        bindings: compiler.bindings,
        scopes: compiler.scopes,
        converters: compiler.converters,
        interceptors: compiler.interceptors,
        type_listeners: compiler.type_listeners,
        provision_listeners: compiler.provision_listeners,
        eager_singletons: compiler.eager_singletons,
        options: compiler.options,
        stage: compiler.stage,
    })
}
