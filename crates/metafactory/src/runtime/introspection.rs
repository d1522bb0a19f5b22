//! Property resolution by accessor naming conventions.
//!
//! A property `name` is read by `isName` (boolean) or `getName` and written
//! by `setName`. Resolution walks the class and then its superclasses, and
//! only considers methods the [`Lookup`] can reach.
//!
//! # Example
//!
//! ```
//! use metafactory::runtime::{ClassBuilder, Lookup, Registry};
//! use metafactory::runtime::introspection::{resolve_getter_method, resolve_setter_method};
//! use std::sync::Arc;
//!
//! struct User {
//!     name: String,
//! }
//!
//! impl User {
//!     fn name(&self) -> String {
//!         self.name.clone()
//!     }
//!
//!     fn set_name(&mut self, name: String) {
//!         self.name = name;
//!     }
//! }
//!
//! let registry = Arc::new(Registry::new());
//! let class = registry
//!     .register(
//!         ClassBuilder::<User>::new("User")
//!             .getter("getName", User::name)
//!             .setter("setName", User::set_name),
//!     )
//!     .unwrap();
//! let lookup = Lookup::public(registry);
//!
//! let getter = resolve_getter_method(&lookup, &class, "name").unwrap();
//! let setter = resolve_setter_method(&lookup, &class, "name").unwrap();
//! assert_eq!(getter.name(), "getName");
//! assert_eq!(setter.name(), "setName");
//! ```

use crate::error::{AccessorKind, PropertyResolutionError, ResolutionFailure};
use crate::runtime::class::Class;
use crate::runtime::encoding::types;
use crate::runtime::lookup::Lookup;
use crate::runtime::method::{Method, MethodRef};
use std::collections::BTreeMap;
use tracing::debug;

/// Prefix of non-boolean readers.
pub const GET_PREFIX: &str = "get";

/// Prefix of boolean readers.
pub const IS_PREFIX: &str = "is";

/// Prefix of writers.
pub const SET_PREFIX: &str = "set";

/// Upper-cases the first character.
///
/// ```
/// use metafactory::runtime::introspection::capitalize;
///
/// assert_eq!(capitalize("field"), "Field");
/// assert_eq!(capitalize(""), "");
/// ```
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the first character, unless the first two are both upper case.
///
/// ```
/// use metafactory::runtime::introspection::decapitalize;
///
/// assert_eq!(decapitalize("Field"), "field");
/// assert_eq!(decapitalize("URL"), "URL");
/// ```
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    if first.is_uppercase() && chars.clone().next().is_some_and(char::is_uppercase) {
        return name.to_string();
    }

    first.to_lowercase().chain(chars).collect()
}

fn strip_accessor_prefix<'a>(method: &'a str, prefix: &str) -> Option<&'a str> {
    method
        .strip_prefix(prefix)
        .filter(|rest| rest.chars().next().is_some_and(|c| !c.is_lowercase()))
}

/// Property name an accessor method refers to, if it follows the
/// `is`/`get`/`set` convention.
///
/// ```
/// use metafactory::runtime::introspection::property_name_of;
///
/// assert_eq!(property_name_of("getField").as_deref(), Some("field"));
/// assert_eq!(property_name_of("isActive").as_deref(), Some("active"));
/// assert_eq!(property_name_of("issue"), None);
/// ```
#[must_use]
pub fn property_name_of(method: &str) -> Option<String> {
    [IS_PREFIX, GET_PREFIX, SET_PREFIX]
        .iter()
        .find_map(|prefix| strip_accessor_prefix(method, prefix))
        .map(decapitalize)
}

/// The resolved read/write pair of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: String,
    property_type: char,
    read: MethodRef,
    write: MethodRef,
}

impl PropertyDescriptor {
    /// Resolves both accessors of `property` on `class`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyResolutionError`] naming the side that failed:
    /// - [`ResolutionFailure::EmptyName`] for an empty property,
    /// - [`ResolutionFailure::MethodNotFound`] if no reachable reader or
    ///   writer has the conventional name and shape,
    /// - [`ResolutionFailure::TypeMismatch`] if the writer's argument type
    ///   differs from the reader's return type.
    pub fn new(
        lookup: &Lookup,
        class: &Class,
        property: &str,
    ) -> Result<Self, PropertyResolutionError> {
        let fail = |accessor, cause| PropertyResolutionError {
            type_name: class.name().to_string(),
            property: property.to_string(),
            accessor,
            cause,
        };

        if property.is_empty() {
            return Err(fail(AccessorKind::Getter, ResolutionFailure::EmptyName));
        }

        let cap = capitalize(property);
        let get_name = format!("{GET_PREFIX}{cap}");
        let is_name = format!("{IS_PREFIX}{cap}");
        let set_name = format!("{SET_PREFIX}{cap}");
        let strict = lookup.config().strict_boolean_prefix;

        let is_reader = |m: &Method| {
            lookup.is_reachable(m)
                && m.signature().is_getter_shape()
                && (!strict || m.signature().return_type() == types::BOOL)
        };
        let is_getter = |m: &Method| lookup.is_reachable(m) && m.signature().is_getter_shape();
        let is_writer = |m: &Method| lookup.is_reachable(m) && m.signature().is_setter_shape();

        let (read, read_path) = class
            .find_method(&is_name, is_reader)
            .or_else(|| class.find_method(&get_name, is_getter))
            .ok_or_else(|| {
                fail(
                    AccessorKind::Getter,
                    ResolutionFailure::MethodNotFound { method: get_name },
                )
            })?;

        let (write, write_path) = class.find_method(&set_name, is_writer).ok_or_else(|| {
            fail(
                AccessorKind::Setter,
                ResolutionFailure::MethodNotFound { method: set_name },
            )
        })?;

        let property_type = read.signature().return_type();
        let write_type = write.signature().arg_types()[0];
        if write_type != property_type {
            return Err(fail(
                AccessorKind::Setter,
                ResolutionFailure::TypeMismatch {
                    read: property_type,
                    write: write_type,
                },
            ));
        }

        debug!(
            class = class.name(),
            property,
            read = read.name(),
            read_declared_by = read.declaring_class(),
            write = write.name(),
            write_declared_by = write.declaring_class(),
            "resolved property"
        );

        Ok(Self {
            name: property.to_string(),
            property_type,
            read: MethodRef::new(read, class, property.to_string(), read_path),
            write: MethodRef::new(write, class, property.to_string(), write_path),
        })
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type encoding shared by both accessors.
    #[must_use]
    pub fn property_type(&self) -> char {
        self.property_type
    }

    /// The reader.
    #[must_use]
    pub fn read_method(&self) -> &MethodRef {
        &self.read
    }

    /// The writer.
    #[must_use]
    pub fn write_method(&self) -> &MethodRef {
        &self.write
    }

    /// Splits into `(read, write)`.
    #[must_use]
    pub fn into_methods(self) -> (MethodRef, MethodRef) {
        (self.read, self.write)
    }
}

fn relabel(mut err: PropertyResolutionError, accessor: AccessorKind) -> PropertyResolutionError {
    err.accessor = accessor;
    err
}

/// Resolves the reader of `property`.
///
/// The property must also have a matching writer.
///
/// # Errors
///
/// See [`PropertyDescriptor::new`]. The error reports
/// [`AccessorKind::Getter`] whichever side failed.
pub fn resolve_getter_method(
    lookup: &Lookup,
    class: &Class,
    property: &str,
) -> Result<MethodRef, PropertyResolutionError> {
    PropertyDescriptor::new(lookup, class, property)
        .map(|descriptor| descriptor.into_methods().0)
        .map_err(|err| relabel(err, AccessorKind::Getter))
}

/// Resolves the writer of `property`.
///
/// The property must also have a matching reader.
///
/// # Errors
///
/// See [`PropertyDescriptor::new`]. The error reports
/// [`AccessorKind::Setter`] whichever side failed.
pub fn resolve_setter_method(
    lookup: &Lookup,
    class: &Class,
    property: &str,
) -> Result<MethodRef, PropertyResolutionError> {
    PropertyDescriptor::new(lookup, class, property)
        .map(|descriptor| descriptor.into_methods().1)
        .map_err(|err| relabel(err, AccessorKind::Setter))
}

/// One property found by [`bean_properties`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Property name.
    pub name: String,
    /// Type encoding.
    pub property_type: char,
    /// Reader, if any.
    pub read: Option<MethodRef>,
    /// Writer, if any.
    pub write: Option<MethodRef>,
}

impl PropertyInfo {
    #[must_use]
    pub fn is_read_write(&self) -> bool {
        self.read.is_some() && self.write.is_some()
    }
}

/// Lists every property `class` exposes to `lookup`, sorted by name.
///
/// One-sided properties are included. A writer whose type differs from the
/// reader's is left out.
#[must_use]
pub fn bean_properties(lookup: &Lookup, class: &Class) -> Vec<PropertyInfo> {
    let strict = lookup.config().strict_boolean_prefix;
    let mut readers: BTreeMap<String, (MethodRef, bool)> = BTreeMap::new();
    let mut writers: BTreeMap<String, MethodRef> = BTreeMap::new();

    for (method, path) in class.walk_methods(|m| lookup.is_reachable(m)) {
        let signature = method.signature();

        if signature.is_getter_shape() {
            let boolean = signature.return_type() == types::BOOL;
            let (rest, from_is) = match strip_accessor_prefix(method.name(), IS_PREFIX) {
                Some(rest) if boolean || !strict => (rest, true),
                Some(_) => continue,
                None => match strip_accessor_prefix(method.name(), GET_PREFIX) {
                    Some(rest) => (rest, false),
                    None => continue,
                },
            };
            let name = decapitalize(rest);
            // `is` readers win over `get` readers
            if readers.get(&name).is_some_and(|(_, is)| *is) && !from_is {
                continue;
            }
            let reference = MethodRef::new(method.clone(), class, name.clone(), path);
            readers.insert(name, (reference, from_is));
        } else if signature.is_setter_shape() {
            if let Some(rest) = strip_accessor_prefix(method.name(), SET_PREFIX) {
                let name = decapitalize(rest);
                let reference = MethodRef::new(method.clone(), class, name.clone(), path);
                writers.insert(name, reference);
            }
        }
    }

    let mut properties: BTreeMap<String, PropertyInfo> = readers
        .into_iter()
        .map(|(name, (read, _))| {
            let info = PropertyInfo {
                name: name.clone(),
                property_type: read.method().signature().return_type(),
                read: Some(read),
                write: None,
            };
            (name, info)
        })
        .collect();

    for (name, write) in writers {
        let write_type = write.method().signature().arg_types()[0];
        match properties.get_mut(&name) {
            Some(info) if info.property_type == write_type => info.write = Some(write),
            Some(_) => {}
            None => {
                properties.insert(
                    name.clone(),
                    PropertyInfo {
                        name,
                        property_type: write_type,
                        read: None,
                        write: Some(write),
                    },
                );
            }
        }
    }

    properties.into_values().collect()
}
