use std::collections::BTreeSet;
use std::sync::Arc;

use crucible::*;

#[derive(Injectable)]
struct Leaf;

#[derive(Injectable)]
struct Root {
    leaf: Arc<Leaf>,
}

struct TreeModule;

impl Module for TreeModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<String>().to_constant("hello");
        binder.bind::<Leaf>().to_self();
        binder.bind::<Root>().to_self();
    }
}

fn sorted_debug_keys(injector: &Injector) -> BTreeSet<String> {
    injector.all_bindings().map(|b| format!("{:?}", b.key)).collect()
}

/// §6 Element API round-trip contract: `Elements::get_module` wraps a
/// recorded element stream back into a `Module`. Element-level equality
/// isn't checkable (several variants carry `Arc<dyn Trait>` factories with
/// no `PartialEq`), so this compares the key sets of the two compiled graphs
/// instead.
#[test]
fn replaying_a_recorded_element_stream_reproduces_the_same_bindings() {
    let original_elements = Elements::get_elements(vec![Arc::new(TreeModule) as Arc<dyn Module>]);
    let replayed_module = Elements::get_module(original_elements.clone());
    let replayed_elements = Elements::get_elements(vec![replayed_module]);

    assert_eq!(original_elements.len(), replayed_elements.len());

    let original_injector = Injector::create_from_elements(original_elements).unwrap();
    let replayed_injector = Injector::create_from_elements(replayed_elements).unwrap();

    assert_eq!(sorted_debug_keys(&original_injector), sorted_debug_keys(&replayed_injector));

    let root = replayed_injector.get_instance::<Root>().unwrap();
    let _ = &root.leaf;
}
