use std::sync::Arc;

use crucible::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Injectable)]
struct Engine {
    name: String,
}

#[derive(Injectable)]
struct Car {
    engine: Arc<Engine>,
}

struct GarageModule;

impl Module for GarageModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<String>().to_constant("V8");
        binder.bind::<Engine>().to_self();
        binder.bind::<Car>().to_self();
    }
}

#[test]
fn resolves_a_constructor_dependency_chain() {
    let injector = Injector::create(vec![Arc::new(GarageModule) as Arc<dyn Module>]).unwrap();
    let car = injector.get_instance::<Car>().unwrap();
    assert_eq!(car.engine.name, "V8");
}

#[test]
fn unscoped_bindings_construct_a_fresh_instance_each_time() {
    let injector = Injector::create(vec![Arc::new(GarageModule) as Arc<dyn Module>]).unwrap();
    let a = injector.get_instance::<Car>().unwrap();
    let b = injector.get_instance::<Car>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Injectable)]
struct ConnectionPool;

struct SingletonModule;

impl Module for SingletonModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<ConnectionPool>().in_scope(Arc::new(SingletonScope)).to_self();
    }
}

#[test]
fn explicit_singleton_scope_reuses_the_same_instance() {
    let injector = Injector::create(vec![Arc::new(SingletonModule) as Arc<dyn Module>]).unwrap();
    let a = injector.get_instance::<ConnectionPool>().unwrap();
    let b = injector.get_instance::<ConnectionPool>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct EagerModule;

impl Module for EagerModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder
            .bind::<ConnectionPool>()
            .in_scope(Arc::new(SingletonScope))
            .as_eager_singleton()
            .to_self();
    }
}

#[test]
fn eager_singletons_are_constructed_at_injector_creation() {
    let injector = Injector::create(vec![Arc::new(EagerModule) as Arc<dyn Module>]).unwrap();
    let binding = injector
        .all_bindings()
        .find(|b| b.type_name() == std::any::type_name::<ConnectionPool>())
        .unwrap();
    assert!(binding.is_populated());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Injectable)]
struct Cache {
    backing: Option<Arc<ConnectionPool>>,
}

struct NullableModule;

impl Module for NullableModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<Cache>().to_self();
    }
}

#[test]
fn nullable_dependency_resolves_to_none_when_unbound() {
    let injector = Injector::create(vec![Arc::new(NullableModule) as Arc<dyn Module>]).unwrap();
    let cache = injector.get_instance::<Cache>().unwrap();
    assert!(cache.backing.is_none());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn missing_required_binding_fails_with_require_explicit_bindings() {
    struct StrictModule;
    impl Module for StrictModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder.set_option(ModuleOption::RequireExplicitBindings);
        }
    }
    let injector = Injector::create(vec![Arc::new(StrictModule) as Arc<dyn Module>]).unwrap();
    let err = injector.get_instance::<Engine>().unwrap_err();
    assert_eq!(err.message.code, ErrorCode::MissingBinding);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn marker_qualified_binding_fails_with_require_exact_binding_annotations() {
    struct Loud;

    struct ExactAnnotationsModule;
    impl Module for ExactAnnotationsModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder.set_option(ModuleOption::RequireExactBindingAnnotations);
            binder
                .bind::<String>()
                .annotated_with(Qualifier::marker::<Loud>())
                .to_constant("HELLO");
        }
    }

    let err = Injector::create(vec![Arc::new(ExactAnnotationsModule) as Arc<dyn Module>]).unwrap_err();
    assert!(err.messages.iter().any(|m| m.code == ErrorCode::IllegalQualifierPlacement));
}

#[test]
fn value_qualified_binding_is_unaffected_by_require_exact_binding_annotations() {
    struct ExactAnnotationsModule;
    impl Module for ExactAnnotationsModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder.set_option(ModuleOption::RequireExactBindingAnnotations);
            binder
                .bind::<String>()
                .annotated_with(Qualifier::named("greeting"))
                .to_constant("hello");
        }
    }

    let injector = Injector::create(vec![Arc::new(ExactAnnotationsModule) as Arc<dyn Module>]).unwrap();
    let key = Key::of::<String>().with_qualifier(Qualifier::named("greeting"));
    assert_eq!(*injector.get_provider::<String>(key)().unwrap(), "hello");
}
