use std::sync::Arc;

use crucible::*;

struct RequestScoped;

#[derive(Injectable)]
struct RequestContext;

struct AnnotatedModule;
impl Module for AnnotatedModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind_scope(TypeLiteral::of::<RequestScoped>(), Arc::new(SingletonScope));
        binder
            .bind::<RequestContext>()
            .in_scope_annotation::<RequestScoped>()
            .to_self();
    }
}

#[test]
fn a_scope_annotation_resolves_to_its_registered_scope() {
    let injector = Injector::create(vec![Arc::new(AnnotatedModule) as Arc<dyn Module>]).unwrap();
    let a = injector.get_instance::<RequestContext>().unwrap();
    let b = injector.get_instance::<RequestContext>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn an_unregistered_scope_annotation_fails_at_creation() {
    struct UnregisteredModule;
    impl Module for UnregisteredModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder
                .bind::<RequestContext>()
                .in_scope_annotation::<RequestScoped>()
                .to_self();
        }
    }

    let err = Injector::create(vec![Arc::new(UnregisteredModule) as Arc<dyn Module>]).unwrap_err();
    assert!(err.messages.iter().any(|m| m.code == ErrorCode::ScopeNotFound));
}
