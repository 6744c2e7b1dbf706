#![feature(unsize)]

//! Runtime, reflection-free dependency injection.
//!
//! A [`Module`] records configuration as a stream of [`Element`]s instead of
//! mutating shared state; [`Injector::create`] compiles that stream into an
//! immutable binding map and lets you pull instances out of it.
//!
//! # Examples
//!
//! ## Basic dependency resolution
//!
//! ```
//! use crucible::*;
//! use std::sync::Arc;
//!
//! struct A {
//!     b: Arc<B>,
//! }
//!
//! impl Injectable for A {
//!     fn injection_point() -> Arc<InjectionPoint> {
//!         InjectionPoint::new("new", TypeLiteral::of::<A>(), vec![(Key::of::<B>(), false)])
//!     }
//!     fn construct(mut args: Vec<Option<Arc<dyn std::any::Any + Send + Sync>>>) -> Result<Self, ProvisionError> {
//!         let b = args.remove(0).unwrap().downcast::<B>().unwrap();
//!         Ok(A { b })
//!     }
//! }
//!
//! struct B;
//! impl Injectable for B {
//!     fn injection_point() -> Arc<InjectionPoint> {
//!         InjectionPoint::new("new", TypeLiteral::of::<B>(), vec![])
//!     }
//!     fn construct(_args: Vec<Option<Arc<dyn std::any::Any + Send + Sync>>>) -> Result<Self, ProvisionError> {
//!         Ok(B)
//!     }
//! }
//!
//! let injector = Injector::create(Vec::<Arc<dyn Module>>::new()).unwrap();
//! let a = injector.get_instance::<A>().unwrap();
//! let _ = &a.b;
//! ```
//!
//! ## Scoping
//!
//! ```
//! use crucible::*;
//! use std::sync::Arc;
//!
//! struct ConnectionPool;
//! impl Injectable for ConnectionPool {
//!     fn injection_point() -> Arc<InjectionPoint> {
//!         InjectionPoint::new("new", TypeLiteral::of::<ConnectionPool>(), vec![])
//!     }
//!     fn scoping() -> Scoping {
//!         Scoping::Explicit(Arc::new(SingletonScope))
//!     }
//!     fn construct(_args: Vec<Option<Arc<dyn std::any::Any + Send + Sync>>>) -> Result<Self, ProvisionError> {
//!         Ok(ConnectionPool)
//!     }
//! }
//!
//! let injector = Injector::create(Vec::<Arc<dyn Module>>::new()).unwrap();
//! let a = injector.get_instance::<ConnectionPool>().unwrap();
//! let b = injector.get_instance::<ConnectionPool>().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

pub use crucible_macros::*;

mod binding;
pub use binding::*;

mod compiler;
pub use compiler::{BindingGraph, ModuleOptions};

mod context;

mod convert;
pub use convert::*;

mod element;
pub use element::*;

mod error;
pub use error::*;

mod graph;
pub use graph::*;

mod injector;
pub use injector::*;

mod interceptor;
pub use interceptor::*;

mod key;
pub use key::*;

mod lazy;
pub use lazy::*;

mod listener;
pub use listener::*;

mod permit;
pub use permit::*;

mod recorder;
pub use recorder::*;

mod scope;
pub use scope::*;

mod source;
pub use source::*;
