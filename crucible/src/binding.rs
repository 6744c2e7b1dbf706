//! Dependencies, injection points, and the compiled, immutable [`Binding`]
//! (§3 Data model: Dependency, InjectionPoint, Binding).

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::ProvisionError;
use crate::injector::Injector;
use crate::key::{Key, TypeLiteral};
use crate::scope::{Scope, ScopeCell, Scoping};
use crate::source::ElementSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A single injection site: `(Key, injectionPoint?, parameterIndex, nullable)`.
#[derive(Clone)]
pub struct Dependency {
    pub key: Key,
    pub injection_point: Option<Arc<InjectionPoint>>,
    pub parameter_index: usize,
    pub nullable: bool,
}

impl Dependency {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            injection_point: None,
            parameter_index: 0,
            nullable: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn at(mut self, point: Arc<InjectionPoint>, index: usize) -> Self {
        self.injection_point = Some(point);
        self.parameter_index = index;
        self
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency({:?}, nullable={})", self.key, self.nullable)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The reflective location receiving a value: a constructor parameter list,
/// a method parameter list, or a single field. In a language without runtime
/// reflection this is authored by hand or by `#[derive(Injectable)]`
/// (`crucible-macros`) rather than discovered by inspecting bytecode.
pub struct InjectionPoint {
    pub member_name: &'static str,
    pub declaring_type: TypeLiteral,
    pub dependency_keys: Vec<(Key, bool)>,
    pub is_optional: bool,
}

impl InjectionPoint {
    pub fn new(
        member_name: &'static str,
        declaring_type: TypeLiteral,
        dependency_keys: Vec<(Key, bool)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            member_name,
            declaring_type,
            dependency_keys,
            is_optional: false,
        })
    }

    /// Dependencies produced by this point, each tagged with a back-pointer
    /// to `self` and its positional index.
    pub fn dependencies(self: &Arc<Self>) -> Vec<Dependency> {
        self.dependency_keys
            .iter()
            .enumerate()
            .map(|(i, (key, nullable))| {
                let mut d = Dependency::new(key.clone());
                d.nullable = *nullable;
                d.at(self.clone(), i)
            })
            .collect()
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.member_name)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A type whose constructor injection point is known statically. Implemented
/// by hand or via `#[derive(Injectable)]`. This is the practical replacement
/// for "locate an `@Inject` constructor via reflection" (§4.F just-in-time
/// resolution step 4) — see DESIGN.md OQ-1.
pub trait Injectable: Any + Send + Sync + Sized {
    /// Describes the constructor's parameter dependencies.
    fn injection_point() -> Arc<InjectionPoint>;

    /// The scope a just-in-time binding for this type should run under;
    /// defaults to unscoped. Stands in for a `@Singleton`-on-the-class
    /// annotation, which Rust cannot read back at runtime.
    fn scoping() -> Scoping {
        Scoping::Unscoped
    }

    /// Builds an instance given already-resolved constructor arguments, one
    /// slot per entry in [`Self::injection_point`]'s dependencies, in the
    /// same order. A `None` slot means a nullable dependency had no binding.
    fn construct(args: Vec<Option<Arc<dyn Any + Send + Sync>>>) -> Result<Self, ProvisionError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Casts the type-erased instance produced by a binding's factory back to
/// the caller-requested `T` (which may be a trait object). One `TypeCaster<T>`
/// is produced per `(key, T)` pair at registration time, when `T` is still a
/// concrete generic parameter, then stored type-erased on the [`Binding`] and
/// recovered via `downcast_ref` at lookup time, when `T` is concrete again.
/// Mirrors the teacher's `dill::typecast_builder::TypeCaster`.
pub struct TypeCaster<T: ?Sized> {
    pub cast: fn(Arc<dyn Any + Send + Sync>) -> Arc<T>,
}

impl<T: 'static + Send + Sync> TypeCaster<T> {
    pub fn identity() -> Self {
        Self {
            cast: |v| v.downcast().unwrap_or_else(|_| panic!("caster/value type mismatch")),
        }
    }
}

impl<Iface: 'static + ?Sized> TypeCaster<Iface> {
    /// Builds a caster from a concrete `Impl` to the trait object `Iface`,
    /// for interface bindings (§3 "Binding to an interface"). `Impl` is
    /// concrete at the `bind_interface::<Iface, Impl>()` call site even
    /// though `Iface` is not, which is exactly the case nightly's `Unsize`
    /// exists to let us express generically.
    pub fn upcast<Impl>() -> Self
    where
        Impl: std::marker::Unsize<Iface> + 'static + Send + Sync,
    {
        Self {
            cast: |v| {
                let concrete: Arc<Impl> = v.downcast().unwrap_or_else(|_| panic!("caster/value type mismatch"));
                concrete as Arc<Iface>
            },
        }
    }
}

pub type AnyTypeCaster = dyn Any + Send + Sync;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub enum BindingKind {
    /// Owns construction: the unscoped factory plus this binding's private
    /// memoisation cell.
    Direct(InternalFactory),
    /// Redirects to another key in the same injector — linked bindings and
    /// interface bindings layered over a concrete impl binding.
    Linked(Key),
    /// Redirects to a key exposed by a child (private-environment) injector
    /// (§4.G). Distinct from `Linked` because resolution must continue in
    /// the child injector, not `self`'s owner.
    Exposed(Arc<crate::injector::Injector>, Key),
}

pub type InternalFactory =
    Arc<dyn Fn(&Injector, &Dependency) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> + Send + Sync>;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A compiled, immutable binding: `key`, `source`, `scoping`, and the recipe
/// (`internalFactory`) for producing instances (§3).
pub struct Binding {
    pub key: Key,
    pub source: ElementSource,
    pub scoping: Scoping,
    pub kind: BindingKind,
    pub caster: Arc<AnyTypeCaster>,
    pub is_jit: bool,
    /// Set for bindings recorded through `Binder::bind_interface` (§3
    /// "Binding to an interface"). A cyclic dependency on one of these is
    /// the case Guice resolves with a dynamic proxy; see
    /// `Injector::resolve_any` and DESIGN.md OQ-6 for why this port can only
    /// partially honor that here.
    pub is_interface: bool,
    cell: ScopeCell,
}

impl Binding {
    pub fn new(
        key: Key,
        source: ElementSource,
        scoping: Scoping,
        kind: BindingKind,
        caster: Arc<AnyTypeCaster>,
        is_jit: bool,
        is_interface: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            key,
            source,
            scoping,
            kind,
            caster,
            is_jit,
            is_interface,
            cell: ScopeCell::new(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.key.type_literal().name()
    }

    /// Resolves this binding to a type-erased instance, applying its scope
    /// and following `Linked` redirection through the owning injector.
    pub fn resolve_any(
        &self,
        injector: &Injector,
        dependency: &Dependency,
    ) -> Result<Arc<dyn Any + Send + Sync>, ProvisionError> {
        match &self.kind {
            BindingKind::Linked(target) => injector.resolve_any(target, dependency),
            BindingKind::Exposed(child, target) => child.resolve_any(target, dependency),
            BindingKind::Direct(factory) => {
                let scope: &dyn Scope = match &self.scoping {
                    Scoping::Explicit(s) => s.as_ref(),
                    Scoping::EagerSingleton => injector.singleton_scope(),
                    Scoping::Unscoped | Scoping::ScopeAnnotation(..) => injector.no_scope(),
                };
                scope.get_or_create(&self.cell, &|| factory(injector, dependency))
            }
        }
    }

    /// Resolves and casts to the caller's requested `T`.
    pub fn resolve<T: 'static + ?Sized>(
        &self,
        injector: &Injector,
        dependency: &Dependency,
    ) -> Result<Arc<T>, ProvisionError> {
        let any = self.resolve_any(injector, dependency)?;
        let caster = self
            .caster
            .downcast_ref::<TypeCaster<T>>()
            .unwrap_or_else(|| {
                panic!(
                    "binding for {:?} has no caster registered for {}",
                    self.key,
                    type_name::<T>()
                )
            });
        Ok((caster.cast)(any))
    }

    pub fn is_populated(&self) -> bool {
        self.cell.is_populated()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding({:?} <{:?}>)", self.key, self.scoping)
    }
}
