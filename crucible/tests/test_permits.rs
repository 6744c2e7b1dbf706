use std::sync::Arc;

use crucible::*;

struct ProdPermit;

struct UnprivilegedModule;

impl Module for UnprivilegedModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<String>().to_constant("unsafe override");
    }
}

struct RootModule;

impl Module for RootModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.restrict_binding_source(
            TypeLiteral::of::<String>(),
            RestrictedBindingSource::new(vec![TypeLiteral::of::<ProdPermit>()]),
        );
        let mut seen = std::collections::HashSet::new();
        binder.install(&UnprivilegedModule, &mut seen);
    }
}

#[test]
fn binding_without_the_required_permit_is_rejected() {
    let err = Injector::create(vec![Arc::new(RootModule) as Arc<dyn Module>]).unwrap_err();
    assert!(err.messages.iter().any(|m| m.code == ErrorCode::RestrictionViolation));
}

struct PermittedModule;

impl Module for PermittedModule {
    fn permits(&self) -> Vec<TypeLiteral> {
        vec![TypeLiteral::of::<ProdPermit>()]
    }

    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<String>().to_constant("trusted value");
    }
}

struct GrantingRootModule;

impl Module for GrantingRootModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.restrict_binding_source(
            TypeLiteral::of::<String>(),
            RestrictedBindingSource::new(vec![TypeLiteral::of::<ProdPermit>()]),
        );
        let mut seen = std::collections::HashSet::new();
        binder.install(&PermittedModule, &mut seen);
    }
}

#[test]
fn binding_with_a_granted_permit_succeeds() {
    let injector = Injector::create(vec![Arc::new(GrantingRootModule) as Arc<dyn Module>]).unwrap();
    assert_eq!(*injector.get_instance::<String>().unwrap(), "trusted value");
}

#[test]
fn exempt_module_pattern_bypasses_the_restriction() {
    struct ExemptRootModule;
    impl Module for ExemptRootModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder.restrict_binding_source(
                TypeLiteral::of::<String>(),
                RestrictedBindingSource::new(vec![TypeLiteral::of::<ProdPermit>()])
                    .exempting("UnprivilegedModule")
                    .unwrap(),
            );
            let mut seen = std::collections::HashSet::new();
            binder.install(&UnprivilegedModule, &mut seen);
        }
    }

    let injector = Injector::create(vec![Arc::new(ExemptRootModule) as Arc<dyn Module>]).unwrap();
    assert_eq!(*injector.get_instance::<String>().unwrap(), "unsafe override");
}
