//! `metafactory` runtime module.
//!
//! This module provides the class model and the accessor machinery built on
//! top of it:
//!
//! - [`encoding`]: Compact method signature encodings
//! - [`value`]: Boxed values at the erased call boundary
//! - [`method`]: Method metadata and resolved method references
//! - [`class`]: Classes, class builders and the registry
//! - [`lookup`]: Access context for resolution and binding
//! - [`introspection`]: Property resolution by naming convention
//! - [`synthesis`]: Binding resolved methods into accessors
//!
//! # Architecture
//!
//! Classes are described once through a [`ClassBuilder`] and frozen in a
//! [`Registry`]. A [`Lookup`] resolves a property of a class into a
//! [`MethodRef`]; a [`synthesis::Binder`] then turns the reference into a
//! [`SyntheticGetter`] or [`SyntheticSetter`] that is called many times.
//!
//! # Example
//!
//! ```rust
//! use metafactory::runtime::{ClassBuilder, Lookup, Registry, Value};
//! use metafactory::runtime::introspection::resolve_getter_method;
//! use metafactory::runtime::synthesis::synthesize_getter;
//! use std::sync::Arc;
//!
//! struct Temperature {
//!     celsius: f64,
//! }
//!
//! impl Temperature {
//!     fn celsius(&self) -> f64 {
//!         self.celsius
//!     }
//!
//!     fn set_celsius(&mut self, celsius: f64) {
//!         self.celsius = celsius;
//!     }
//! }
//!
//! let registry = Arc::new(Registry::new());
//! let class = registry
//!     .register(
//!         ClassBuilder::<Temperature>::new("Temperature")
//!             .getter("getCelsius", Temperature::celsius)
//!             .setter("setCelsius", Temperature::set_celsius),
//!     )
//!     .unwrap();
//!
//! let lookup = Lookup::public(registry);
//! let method = resolve_getter_method(&lookup, &class, "celsius").unwrap();
//! let getter = synthesize_getter(&lookup, &method).unwrap();
//!
//! let t = Temperature { celsius: 21.5 };
//! assert_eq!(getter.apply(&t).unwrap(), Value::Double(21.5));
//! ```

pub mod class;
pub mod encoding;
pub mod introspection;
pub mod lookup;
pub mod method;
pub mod synthesis;
pub mod value;

pub use class::{Class, ClassBuilder, Reflect, Registry};
pub use introspection::{PropertyDescriptor, PropertyInfo};
pub use lookup::Lookup;
pub use method::{Method, MethodRef, Visibility};
pub use synthesis::{
    Binder, DirectBinder, ReflectiveBinder, SyntheticGetter, SyntheticSetter, TypedGetter,
    TypedSetter,
};
pub use value::{Value, ValueType};
