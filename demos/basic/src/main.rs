use std::sync::Arc;

use crucible::*;

#[derive(Injectable)]
struct Database {
    dsn: String,
}

#[derive(Injectable)]
struct Cache;

#[derive(Injectable)]
struct Greeter {
    database: Arc<Database>,
    cache: Option<Arc<Cache>>,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        let cache_note = if self.cache.is_some() { "warm" } else { "cold" };
        format!("Hello, {name}! (db={}, cache={cache_note})", self.database.dsn)
    }
}

struct AppModule;

impl Module for AppModule {
    fn configure(&self, binder: &mut Binder<'_>) {
        binder.bind::<String>().to_constant("postgres://localhost/app");
        binder.bind::<Database>().in_scope(Arc::new(SingletonScope)).to_self();
        binder.bind::<Greeter>().to_self();
    }
}

fn main() -> Result<(), CreationException> {
    tracing_subscriber::fmt::init();

    let injector = Injector::create(vec![Arc::new(AppModule) as Arc<dyn Module>])?;

    let greeter = injector.get_instance::<Greeter>().expect("Greeter is bound");
    println!("{}", greeter.greet("world"));

    // Database is a singleton: the instance handed to Greeter is the same one
    // a direct lookup returns.
    let database = injector.get_instance::<Database>().expect("Database is bound");
    assert!(Arc::ptr_eq(&database, &greeter.database));

    println!("{}", render_graphviz(&injector));
    Ok(())
}
