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
        binder.bind::<Leaf>().to_self();
        binder.bind::<Root>().to_self();
    }
}

#[test]
fn graphviz_dump_contains_every_binding_and_the_linked_edge() {
    let injector = Injector::create(vec![Arc::new(TreeModule) as Arc<dyn Module>]).unwrap();
    let _ = injector.get_instance::<Root>().unwrap();

    let dot = render_graphviz(&injector);
    assert!(dot.starts_with("digraph Injector"));
    assert!(dot.contains("Leaf"));
    assert!(dot.contains("Root"));
}

#[test]
fn plantuml_dump_contains_every_binding() {
    let injector = Injector::create(vec![Arc::new(TreeModule) as Arc<dyn Module>]).unwrap();
    let uml = render_plantuml(&injector);
    assert!(uml.starts_with("@startuml"));
    assert!(uml.trim_end().ends_with("@enduml"));
    assert!(uml.contains("[Leaf]"));
}
