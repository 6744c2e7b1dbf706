use std::sync::Arc;

use crucible::*;

#[derive(Injectable)]
struct Ping {
    pong: Arc<Pong>,
}

#[derive(Injectable)]
struct Pong {
    ping: Arc<Ping>,
}

struct CyclicModule;

impl Module for CyclicModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<Ping>().to_self();
        binder.bind::<Pong>().to_self();
    }
}

#[test]
fn circular_dependency_is_reported_not_stack_overflowed() {
    let injector = Injector::create(vec![Arc::new(CyclicModule) as Arc<dyn Module>]).unwrap();
    let err = injector.get_instance::<Ping>().unwrap_err();
    assert_eq!(err.message.code, ErrorCode::CyclicDependency);
    assert!(err.dependency_chain.iter().any(|k| k.type_literal().name().contains("Ping")));
}

trait SelfReferential: Send + Sync {}

struct SelfImpl {
    _self_ref: Arc<dyn SelfReferential>,
}

impl SelfReferential for SelfImpl {}

impl Injectable for SelfImpl {
    fn injection_point() -> Arc<InjectionPoint> {
        InjectionPoint::new(
            "new",
            TypeLiteral::of::<SelfImpl>(),
            vec![(Key::of::<dyn SelfReferential>(), false)],
        )
    }

    fn construct(_args: Vec<Option<Arc<dyn std::any::Any + Send + Sync>>>) -> Result<Self, ProvisionError> {
        unreachable!("the cycle is caught before construction ever runs")
    }
}

struct InterfaceCyclicModule;

impl Module for InterfaceCyclicModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<SelfImpl>().to_self();
        binder.bind_interface::<dyn SelfReferential, SelfImpl>().to(Key::of::<SelfImpl>());
    }
}

#[test]
fn circular_dependency_through_an_interface_binding_names_the_lazy_escape_hatch() {
    let injector = Injector::create(vec![Arc::new(InterfaceCyclicModule) as Arc<dyn Module>]).unwrap();
    let provider = injector.get_provider::<dyn SelfReferential>(Key::of::<dyn SelfReferential>());
    let err = provider().unwrap_err();
    assert_eq!(err.message.code, ErrorCode::CyclicDependency);
    assert!(err.message.text.contains("Lazy"), "expected the interface-cycle message to point at Lazy<T>, got: {}", err.message.text);
}

#[derive(Injectable)]
struct Widget;

#[test]
fn lazy_defers_a_provider_lookup_until_first_use() {
    struct WidgetModule;
    impl Module for WidgetModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder.bind::<Widget>().to_self();
        }
    }

    let injector = Injector::create(vec![Arc::new(WidgetModule) as Arc<dyn Module>]).unwrap();
    let widget_provider = injector.get_provider::<Widget>(Key::of::<Widget>());
    let lazy = Lazy::new(move || widget_provider());
    let _widget = lazy.get().unwrap();
}
