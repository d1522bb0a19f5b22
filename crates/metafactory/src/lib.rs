//! `metafactory`: Reflective accessor synthesis for Rust
//!
//! `metafactory` resolves a property of a registered type by the
//! `get`/`is`/`set` naming conventions and binds the resulting method once
//! into a reusable accessor. It provides:
//!
//! - **Class Registry** with single inheritance by composition
//! - **Property Resolution** walking the class hierarchy under an explicit
//!   access context
//! - **Accessor Synthesis** into statically linked thunks or plain typed
//!   `fn` pointers
//! - **Reflective Invocation** as the per-call checked comparison path
//!
//! # Architecture
//!
//! - **Metadata Layer**: classes and methods, immutable once registered
//! - **Resolution Layer**: naming conventions, access checks, descriptors
//! - **Binding Layer**: preflight at bind time, no checks on the hot path
//!
//! # Example
//!
//! ```rust
//! use metafactory::runtime::{ClassBuilder, Lookup, Registry, Value};
//! use metafactory::runtime::synthesis::{create_getter, create_setter};
//! use std::sync::Arc;
//!
//! struct Pojo {
//!     field: String,
//! }
//!
//! impl Pojo {
//!     fn field(&self) -> String {
//!         self.field.clone()
//!     }
//!
//!     fn set_field(&mut self, field: String) {
//!         self.field = field;
//!     }
//! }
//!
//! let registry = Arc::new(Registry::new());
//! let class = registry
//!     .register(
//!         ClassBuilder::<Pojo>::new("Pojo")
//!             .getter("getField", Pojo::field)
//!             .setter("setField", Pojo::set_field),
//!     )
//!     .unwrap();
//! let lookup = Lookup::public(registry);
//!
//! let getter = create_getter(&lookup, &class, "field").unwrap();
//! let setter = create_setter(&lookup, &class, "field").unwrap();
//!
//! let mut pojo = Pojo { field: "_initial".to_string() };
//! setter.accept(&mut pojo, &Value::from("updated")).unwrap();
//! assert_eq!(getter.apply(&pojo).unwrap().as_str(), Some("updated"));
//! ```

pub mod config;
pub mod error;
pub mod runtime;

// Re-export commonly used types
pub use config::RuntimeConfig;
pub use error::{
    AccessorKind, Error, InvocationError, PropertyResolutionError, ResolutionFailure, Result,
    SynthesisError, SynthesisFailure,
};
pub use runtime::{
    Class, ClassBuilder, Lookup, Method, MethodRef, Reflect, Registry, SyntheticGetter,
    SyntheticSetter, TypedGetter, TypedSetter, Value,
};
