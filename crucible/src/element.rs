//! The element stream: every `Binder` call during the configuration phase
//! produces one [`Element`] rather than mutating shared state directly
//! (§3 Element, §4.A, §4.B). The compiler (§4.E) is the only consumer that
//! turns this stream into a binding map.

use std::any::TypeId;
use std::sync::Arc;

use crate::key::Key;
use crate::permit::RestrictedBindingSource;
use crate::scope::Scoping;
use crate::source::ElementSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The right-hand side of a binding: what a key resolves to (§3 BindingTarget).
#[derive(Clone)]
pub enum BindingTarget {
    /// Bind to another key; the compiler resolves it at lookup time rather
    /// than eagerly, so linked chains may point forward.
    LinkedKey(Key),
    /// A caller-supplied factory invoked with the owning injector at
    /// resolution time.
    Provider(
        Arc<dyn Fn(&crate::injector::Injector, &crate::binding::Dependency)
            -> Result<Arc<dyn std::any::Any + Send + Sync>, crate::error::ProvisionError>
            + Send
            + Sync>,
    ),
    /// A fixed instance, bound directly with no factory and no scope.
    Instance(Arc<dyn std::any::Any + Send + Sync>),
    /// A textual constant, deferred to a [`crate::convert::TypeConverter`]
    /// during compilation (§4.E step 4).
    Constant(String),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One record of the configuration-phase stream (§3 Element). `Binder`
/// methods append to this list instead of mutating a binding map directly —
/// see [`crate::recorder`].
#[derive(Clone)]
pub enum Element {
    Binding {
        key: Key,
        target: BindingTarget,
        scoping: Scoping,
        caster: Arc<dyn std::any::Any + Send + Sync>,
        source: ElementSource,
        /// True for bindings recorded through `Binder::bind_interface`.
        is_interface: bool,
    },
    ScopeRegistration {
        annotation: TypeId,
        annotation_name: &'static str,
        scope: Arc<dyn crate::scope::Scope>,
        source: ElementSource,
    },
    TypeConverterRegistration {
        converter: Arc<dyn crate::convert::TypeConverter>,
        source: ElementSource,
    },
    InterceptorRegistration {
        interceptor: Arc<dyn crate::interceptor::MethodInterceptor>,
        matcher: crate::interceptor::InterceptorMatcher,
        source: ElementSource,
    },
    InjectionRequest {
        key: Key,
        source: ElementSource,
    },
    StaticInjectionRequest {
        target: TypeId,
        target_name: &'static str,
        injector: Arc<dyn Fn() + Send + Sync>,
        source: ElementSource,
    },
    ProviderLookup {
        key: Key,
        source: ElementSource,
    },
    MembersInjectorLookup {
        target: TypeId,
        target_name: &'static str,
        source: ElementSource,
    },
    TypeListenerRegistration {
        matcher: crate::listener::TypeMatcher,
        listener: Arc<dyn crate::listener::TypeListener>,
        source: ElementSource,
    },
    ProvisionListenerRegistration {
        matcher: crate::listener::TypeMatcher,
        listener: Arc<dyn crate::listener::ProvisionListener>,
        source: ElementSource,
    },
    Message {
        message: crate::error::Message,
        source: ElementSource,
    },
    /// A nested sub-stream compiled into its own environment, visible to the
    /// parent only through `exposed_keys` (§3, §4.G).
    PrivateEnvironment {
        elements: Vec<Element>,
        exposed_keys: Vec<(Key, ElementSource)>,
        source: ElementSource,
    },
    /// A qualifier or concrete type marked restricted-for-binding (§4.D),
    /// recorded explicitly since Rust has no readable meta-annotation on an
    /// annotation type — see DESIGN.md OQ-3.
    RestrictionRegistration {
        target: TypeId,
        target_name: &'static str,
        restriction: RestrictedBindingSource,
        source: ElementSource,
    },
    /// `requireExplicitBindings` / `requireAtInjectOnConstructors` /
    /// `requireExactBindingAnnotations` / `disableCircularProxies` toggles
    /// (§4.C). Modelled as a flag element rather than injector-builder state
    /// so that later-installed modules can still observe/toggle them through
    /// the same stream the compiler reads.
    ModuleOption {
        option: ModuleOption,
        source: ElementSource,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleOption {
    RequireExplicitBindings,
    RequireAtInjectOnConstructors,
    RequireExactBindingAnnotations,
    DisableCircularProxies,
}

impl Element {
    pub fn source(&self) -> &ElementSource {
        match self {
            Element::Binding { source, .. }
            | Element::ScopeRegistration { source, .. }
            | Element::TypeConverterRegistration { source, .. }
            | Element::InterceptorRegistration { source, .. }
            | Element::InjectionRequest { source, .. }
            | Element::StaticInjectionRequest { source, .. }
            | Element::ProviderLookup { source, .. }
            | Element::MembersInjectorLookup { source, .. }
            | Element::TypeListenerRegistration { source, .. }
            | Element::ProvisionListenerRegistration { source, .. }
            | Element::Message { source, .. }
            | Element::PrivateEnvironment { source, .. }
            | Element::RestrictionRegistration { source, .. }
            | Element::ModuleOption { source, .. } => source,
        }
    }
}
