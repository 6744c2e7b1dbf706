use std::sync::Arc;

use crucible::*;

#[derive(Injectable)]
struct PublicService {
    secret: String,
}

struct OuterModule;

impl Module for OuterModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        struct InnerModule;
        impl Module for InnerModule {
            fn configure(&self, binder: &mut Binder<'_>) {
                binder.bind::<String>().to_constant("hidden");
                binder.bind::<PublicService>().to_self();
            }
        }

        let inner_elements = Elements::get_elements(vec![Arc::new(InnerModule) as Arc<dyn Module>]);
        binder.install_private(inner_elements, vec![Key::of::<PublicService>()]);
    }
}

#[test]
fn only_exposed_keys_are_visible_outside_the_private_environment() {
    let injector = Injector::create(vec![Arc::new(OuterModule) as Arc<dyn Module>]).unwrap();

    let service = injector.get_instance::<PublicService>().unwrap();
    assert_eq!(service.secret, "hidden");

    let provider = injector.get_provider::<String>(Key::of::<String>());
    let err = provider().unwrap_err();
    assert_eq!(err.message.code, ErrorCode::MissingBinding);
}

struct Setting {
    value: &'static str,
}

struct OverrideModule;

impl Module for OverrideModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        let key = Key::of::<Setting>().with_qualifier(Qualifier::named("x"));

        // Installed first: a top-level binding for the same key the private
        // environment below will expose.
        binder.bind_key::<Setting>(key.clone()).to_instance(Setting { value: "outer" });

        struct InnerModule;
        impl Module for InnerModule {
            fn configure(&self, binder: &mut Binder<'_>) {
                let key = Key::of::<Setting>().with_qualifier(Qualifier::named("x"));
                binder.bind_key::<Setting>(key).to_instance(Setting { value: "private" });
            }
        }

        let inner_elements = Elements::get_elements(vec![Arc::new(InnerModule) as Arc<dyn Module>]);
        binder.install_private(inner_elements, vec![key]);
    }
}

#[test]
fn a_later_installed_exposed_private_binding_overrides_an_earlier_top_level_binding() {
    let injector = Injector::create(vec![Arc::new(OverrideModule) as Arc<dyn Module>]).unwrap();

    let key = Key::of::<Setting>().with_qualifier(Qualifier::named("x"));
    let value = injector.get_provider::<Setting>(key)().unwrap();
    assert_eq!(value.value, "private");
}
