use std::sync::Arc;

use crucible::*;

#[derive(Injectable)]
struct Greeting {
    text: String,
}

struct LinkedModule;

impl Module for LinkedModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<String>().to_constant("bonjour");
        binder.bind::<Greeting>().to_self();
        binder.bind_key::<Greeting>(Key::of::<Greeting>().with_qualifier(Qualifier::named("default"))).to_key(Key::of::<Greeting>());
    }
}

#[test]
fn a_linked_key_binding_resolves_to_the_same_instance_as_its_target() {
    let injector = Injector::create(vec![Arc::new(LinkedModule) as Arc<dyn Module>]).unwrap();
    let direct = injector.get_instance::<Greeting>().unwrap();

    let aliased_key = Key::of::<Greeting>().with_qualifier(Qualifier::named("default"));
    let provider = injector.get_provider::<Greeting>(aliased_key);
    let aliased = provider().unwrap();

    assert_eq!(direct.text, aliased.text);
}

struct EnglishModule;
impl Module for EnglishModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder
            .bind::<String>()
            .annotated_with(Qualifier::named("greeting"))
            .to_constant("hello");
    }
}

struct FrenchModule;
impl Module for FrenchModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder
            .bind::<String>()
            .annotated_with(Qualifier::named("greeting"))
            .to_constant("bonjour");
    }
}

#[test]
fn qualified_bindings_coexist_and_are_selected_by_qualifier() {
    let english = Injector::create(vec![Arc::new(EnglishModule) as Arc<dyn Module>]).unwrap();
    let french = Injector::create(vec![Arc::new(FrenchModule) as Arc<dyn Module>]).unwrap();

    let key = Key::of::<String>().with_qualifier(Qualifier::named("greeting"));
    assert_eq!(*english.get_provider::<String>(key.clone())().unwrap(), "hello");
    assert_eq!(*french.get_provider::<String>(key)().unwrap(), "bonjour");
}

struct ParentModule;
impl Module for ParentModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<String>().to_constant("from parent");
    }
}

#[derive(Injectable)]
struct ChildOnly;

struct ChildModule;
impl Module for ChildModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<ChildOnly>().to_self();
    }
}

#[test]
fn a_child_injector_falls_back_to_its_parent_for_unbound_keys() {
    let parent = Injector::create(vec![Arc::new(ParentModule) as Arc<dyn Module>]).unwrap();
    let child = parent.create_child_injector(vec![Arc::new(ChildModule) as Arc<dyn Module>]).unwrap();

    child.get_instance::<ChildOnly>().unwrap();
    let inherited = child.get_provider::<String>(Key::of::<String>())().unwrap();
    assert_eq!(*inherited, "from parent");
}
