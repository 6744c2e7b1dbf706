use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crucible::*;

#[derive(Injectable)]
struct Widget;

struct CountingListener {
    count: Arc<AtomicUsize>,
}

impl ProvisionListener for CountingListener {
    fn on_provision(
        &self,
        _invocation: &ProvisionInvocation<'_>,
        provision: &mut (dyn FnMut() -> Result<Arc<dyn std::any::Any + Send + Sync>, ProvisionError> + '_),
    ) -> Result<Arc<dyn std::any::Any + Send + Sync>, ProvisionError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        provision()
    }
}

#[test]
fn provision_listener_observes_every_provisioning_call() {
    let count = Arc::new(AtomicUsize::new(0));
    let listener_count = count.clone();

    struct CountingModule {
        count: Arc<AtomicUsize>,
    }
    impl Module for CountingModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder.bind::<Widget>().to_self();
            binder.bind_provision_listener(
                TypeMatcher::exact::<Widget>(),
                Arc::new(CountingListener { count: self.count.clone() }),
            );
        }
    }

    let injector = Injector::create(vec![Arc::new(CountingModule { count: listener_count }) as Arc<dyn Module>]).unwrap();
    injector.get_instance::<Widget>().unwrap();
    injector.get_instance::<Widget>().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn converter_failure_on_a_malformed_constant_is_reported() {
    struct BadConstantModule;
    impl Module for BadConstantModule {
        fn configure(&self, binder: &mut Binder<'_>) {
            binder.bind::<i32>().to_constant("not-a-number");
        }
    }

    let err = Injector::create(vec![Arc::new(BadConstantModule) as Arc<dyn Module>]).unwrap_err();
    assert!(err.messages.iter().any(|m| m.code == ErrorCode::ConverterFailed));
}
