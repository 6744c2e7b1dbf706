use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crucible::*;

#[derive(Injectable)]
struct Counted;
struct EagerMarker;

struct StageModule {
    regular: Arc<AtomicUsize>,
    eager: Arc<AtomicUsize>,
}

impl Module for StageModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        let regular = self.regular.clone();
        binder
            .bind::<Counted>()
            .in_scope(Arc::new(SingletonScope))
            .to_provider(move |_injector, _dep| {
                regular.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Counted))
            });

        let eager = self.eager.clone();
        binder.bind::<EagerMarker>().as_eager_singleton().to_provider(move |_injector, _dep| {
            eager.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(EagerMarker))
        });
    }
}

#[test]
fn development_stage_only_constructs_explicitly_eager_singletons() {
    let regular = Arc::new(AtomicUsize::new(0));
    let eager = Arc::new(AtomicUsize::new(0));
    let module = StageModule {
        regular: regular.clone(),
        eager: eager.clone(),
    };

    let injector = Injector::create_in_stage(vec![Arc::new(module) as Arc<dyn Module>], Stage::Development).unwrap();
    assert_eq!(injector.stage(), Stage::Development);
    assert_eq!(eager.load(Ordering::SeqCst), 1);
    assert_eq!(regular.load(Ordering::SeqCst), 0);

    injector.get_instance::<Counted>().unwrap();
    assert_eq!(regular.load(Ordering::SeqCst), 1);
}

#[test]
fn production_stage_eagerly_constructs_every_singleton_scoped_binding() {
    let regular = Arc::new(AtomicUsize::new(0));
    let eager = Arc::new(AtomicUsize::new(0));
    let module = StageModule {
        regular: regular.clone(),
        eager: eager.clone(),
    };

    let injector = Injector::create_in_stage(vec![Arc::new(module) as Arc<dyn Module>], Stage::Production).unwrap();
    assert_eq!(injector.stage(), Stage::Production);
    assert_eq!(eager.load(Ordering::SeqCst), 1);
    assert_eq!(regular.load(Ordering::SeqCst), 1);
}

#[test]
fn tool_stage_suppresses_eager_construction_entirely() {
    let regular = Arc::new(AtomicUsize::new(0));
    let eager = Arc::new(AtomicUsize::new(0));
    let module = StageModule {
        regular: regular.clone(),
        eager: eager.clone(),
    };

    let injector = Injector::create_in_stage(vec![Arc::new(module) as Arc<dyn Module>], Stage::Tool).unwrap();
    assert_eq!(injector.stage(), Stage::Tool);
    assert_eq!(eager.load(Ordering::SeqCst), 0);
    assert_eq!(regular.load(Ordering::SeqCst), 0);
}

#[test]
fn stage_itself_resolves_as_an_ordinary_binding() {
    let injector = Injector::create_in_stage(Vec::<Arc<dyn Module>>::new(), Stage::Production).unwrap();
    let stage = injector.get_instance::<Stage>().unwrap();
    assert_eq!(*stage, Stage::Production);
}
