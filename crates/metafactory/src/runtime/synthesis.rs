//! Accessor synthesis.
//!
//! Turns a resolved [`MethodRef`] into a callable bound once to that method:
//!
//! - [`SyntheticGetter`] / [`SyntheticSetter`] take an erased receiver and
//!   [`Value`]s. Built by a [`Binder`]; [`DirectBinder`] links the method's
//!   typed entry point, [`ReflectiveBinder`] goes through reflective
//!   invocation on every call.
//! - [`TypedGetter`] / [`TypedSetter`] expose the typed `fn` pointer itself.
//!
//! All checks (shape, access, linkage) happen at bind time. A bound direct
//! accessor does one virtual call and one `TypeId` comparison per call.
//!
//! # Example
//!
//! ```
//! use metafactory::runtime::{ClassBuilder, Lookup, Registry, Value};
//! use metafactory::runtime::synthesis::{create_getter, create_setter};
//! use std::sync::Arc;
//!
//! struct Pojo {
//!     field: Arc<str>,
//! }
//!
//! impl Pojo {
//!     fn field(&self) -> Arc<str> {
//!         Arc::clone(&self.field)
//!     }
//!
//!     fn set_field(&mut self, field: Arc<str>) {
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
//! let mut pojo = Pojo { field: Arc::from("_initial") };
//! setter.accept(&mut pojo, &Value::from("abcdefgh")).unwrap();
//! assert_eq!(getter.apply(&pojo).unwrap(), Value::from("abcdefgh"));
//! ```

use crate::error::{AccessorKind, InvocationError, SynthesisError, SynthesisFailure};
use crate::runtime::class::{Class, UpcastPath};
use crate::runtime::introspection::{resolve_getter_method, resolve_setter_method};
use crate::runtime::lookup::Lookup;
use crate::runtime::method::{Method, MethodRef, downcast, downcast_mut, unbox};
use crate::runtime::value::{Value, ValueType};
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

const GETTER_SHAPE: &str = "zero arguments and a non-void return";
const SETTER_SHAPE: &str = "one argument and a void return";

/// A bound read call over an erased receiver.
pub trait GetterThunk: Send + Sync {
    /// Reads from `instance`.
    ///
    /// # Errors
    ///
    /// [`InvocationError`] if `instance` is not of the bound type.
    fn apply(&self, instance: &dyn Any) -> Result<Value, InvocationError>;
}

/// A bound write call over an erased receiver.
pub trait SetterThunk: Send + Sync {
    /// Writes `value` into `instance`.
    ///
    /// # Errors
    ///
    /// [`InvocationError`] if `instance` or `value` has the wrong type.
    fn accept(&self, instance: &mut dyn Any, value: &Value) -> Result<(), InvocationError>;
}

/// Output of an entry point's link routine.
pub(crate) enum Thunk {
    Getter(Arc<dyn GetterThunk>),
    Setter(Arc<dyn SetterThunk>),
}

struct DirectGetter<T, V> {
    target: fn(&T) -> V,
}

impl<T: Any, V: ValueType> GetterThunk for DirectGetter<T, V> {
    #[inline]
    fn apply(&self, instance: &dyn Any) -> Result<Value, InvocationError> {
        Ok((self.target)(downcast::<T>(instance)?).into_value())
    }
}

struct DirectSetter<T, V> {
    target: fn(&mut T, V),
}

impl<T: Any, V: ValueType> SetterThunk for DirectSetter<T, V> {
    #[inline]
    fn accept(&self, instance: &mut dyn Any, value: &Value) -> Result<(), InvocationError> {
        let value = unbox::<V>(value, 0)?;
        (self.target)(downcast_mut::<T>(instance)?, value);
        Ok(())
    }
}

pub(crate) fn link_getter<T: Any, V: ValueType>(target: &(dyn Any + Send + Sync)) -> Option<Thunk> {
    let target = *target.downcast_ref::<fn(&T) -> V>()?;
    Some(Thunk::Getter(Arc::new(DirectGetter { target })))
}

pub(crate) fn link_setter<T: Any, V: ValueType>(target: &(dyn Any + Send + Sync)) -> Option<Thunk> {
    let target = *target.downcast_ref::<fn(&mut T, V)>()?;
    Some(Thunk::Setter(Arc::new(DirectSetter { target })))
}

struct UpcastGetter {
    path: UpcastPath,
    expected: &'static str,
    inner: Arc<dyn GetterThunk>,
}

impl GetterThunk for UpcastGetter {
    fn apply(&self, mut instance: &dyn Any) -> Result<Value, InvocationError> {
        for step in self.path.iter() {
            instance = step.upcast(instance).ok_or(InvocationError::ReceiverMismatch {
                expected: self.expected,
            })?;
        }
        self.inner.apply(instance)
    }
}

struct UpcastSetter {
    path: UpcastPath,
    expected: &'static str,
    inner: Arc<dyn SetterThunk>,
}

impl SetterThunk for UpcastSetter {
    fn accept(&self, mut instance: &mut dyn Any, value: &Value) -> Result<(), InvocationError> {
        for step in self.path.iter() {
            instance = match step.upcast_mut(instance) {
                Some(parent) => parent,
                None => {
                    return Err(InvocationError::ReceiverMismatch {
                        expected: self.expected,
                    });
                }
            };
        }
        self.inner.accept(instance, value)
    }
}

struct ReflectiveGetter {
    method: MethodRef,
    lookup: Lookup,
}

impl GetterThunk for ReflectiveGetter {
    fn apply(&self, instance: &dyn Any) -> Result<Value, InvocationError> {
        self.method.invoke(&self.lookup, instance, &[])
    }
}

struct ReflectiveSetter {
    method: MethodRef,
    lookup: Lookup,
}

impl SetterThunk for ReflectiveSetter {
    fn accept(&self, instance: &mut dyn Any, value: &Value) -> Result<(), InvocationError> {
        self.method
            .invoke_mut(&self.lookup, instance, std::slice::from_ref(value))
            .map(drop)
    }
}

/// A synthesized read accessor.
///
/// Immutable, `Send + Sync`, and always bound to the method it was built
/// from.
#[derive(Clone)]
pub struct SyntheticGetter {
    target: MethodRef,
    thunk: Arc<dyn GetterThunk>,
}

impl SyntheticGetter {
    /// Pairs a bound thunk with the method it calls.
    #[must_use]
    pub fn new(target: MethodRef, thunk: Arc<dyn GetterThunk>) -> Self {
        Self { target, thunk }
    }

    /// Reads the property from `instance`.
    ///
    /// # Errors
    ///
    /// [`InvocationError::ReceiverMismatch`] if `instance` is not of the
    /// resolved type.
    #[inline]
    pub fn apply(&self, instance: &dyn Any) -> Result<Value, InvocationError> {
        self.thunk.apply(instance)
    }

    /// The bound method reference.
    #[must_use]
    pub fn target(&self) -> &MethodRef {
        &self.target
    }

    /// The bound method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.target.method()
    }

    #[must_use]
    pub fn property(&self) -> &str {
        self.target.property()
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.target.type_name()
    }
}

impl fmt::Debug for SyntheticGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticGetter")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A synthesized write accessor.
///
/// Immutable, `Send + Sync`, and always bound to the method it was built
/// from.
#[derive(Clone)]
pub struct SyntheticSetter {
    target: MethodRef,
    thunk: Arc<dyn SetterThunk>,
}

impl SyntheticSetter {
    /// Pairs a bound thunk with the method it calls.
    #[must_use]
    pub fn new(target: MethodRef, thunk: Arc<dyn SetterThunk>) -> Self {
        Self { target, thunk }
    }

    /// Writes `value` into `instance`.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::ReceiverMismatch`] if `instance` is not of the
    ///   resolved type
    /// - [`InvocationError::ArgumentTypeMismatch`] if `value` does not fit
    ///   the property type
    #[inline]
    pub fn accept(&self, instance: &mut dyn Any, value: &Value) -> Result<(), InvocationError> {
        self.thunk.accept(instance, value)
    }

    /// The bound method reference.
    #[must_use]
    pub fn target(&self) -> &MethodRef {
        &self.target
    }

    /// The bound method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.target.method()
    }

    #[must_use]
    pub fn property(&self) -> &str {
        self.target.property()
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.target.type_name()
    }
}

impl fmt::Debug for SyntheticSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticSetter")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A read accessor with no erasure: a copy of the registered `fn` pointer.
pub struct TypedGetter<T, V> {
    target: fn(&T) -> V,
}

impl<T, V> TypedGetter<T, V> {
    #[inline]
    pub fn get(&self, instance: &T) -> V {
        (self.target)(instance)
    }

    /// The underlying function pointer.
    #[must_use]
    pub fn as_fn(&self) -> fn(&T) -> V {
        self.target
    }
}

impl<T, V> Clone for TypedGetter<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for TypedGetter<T, V> {}

impl<T, V> fmt::Debug for TypedGetter<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedGetter")
            .field("receiver", &type_name::<T>())
            .field("value", &type_name::<V>())
            .finish()
    }
}

/// A write accessor with no erasure: a copy of the registered `fn` pointer.
pub struct TypedSetter<T, V> {
    target: fn(&mut T, V),
}

impl<T, V> TypedSetter<T, V> {
    #[inline]
    pub fn set(&self, instance: &mut T, value: V) {
        (self.target)(instance, value);
    }

    /// The underlying function pointer.
    #[must_use]
    pub fn as_fn(&self) -> fn(&mut T, V) {
        self.target
    }
}

impl<T, V> Clone for TypedSetter<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for TypedSetter<T, V> {}

impl<T, V> fmt::Debug for TypedSetter<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSetter")
            .field("receiver", &type_name::<T>())
            .field("value", &type_name::<V>())
            .finish()
    }
}

/// Strategy that binds a resolved method into a synthetic accessor.
pub trait Binder {
    /// Binds `method` as a reader.
    ///
    /// # Errors
    ///
    /// [`SynthesisError`] if the method has the wrong shape, is not
    /// reachable, or cannot be linked by this binder.
    fn bind_getter(&self, lookup: &Lookup, method: &MethodRef)
    -> Result<SyntheticGetter, SynthesisError>;

    /// Binds `method` as a writer.
    ///
    /// # Errors
    ///
    /// See [`bind_getter`](Self::bind_getter).
    fn bind_setter(&self, lookup: &Lookup, method: &MethodRef)
    -> Result<SyntheticSetter, SynthesisError>;
}

/// Links the method's typed entry point. The default binder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectBinder;

/// Delegates every call to [`MethodRef::invoke`] / [`MethodRef::invoke_mut`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectiveBinder;

fn failure(method: &MethodRef, accessor: AccessorKind, cause: SynthesisFailure) -> SynthesisError {
    SynthesisError {
        type_name: method.type_name().to_string(),
        property: method.property().to_string(),
        accessor,
        cause,
    }
}

fn preflight(
    lookup: &Lookup,
    method: &MethodRef,
    accessor: AccessorKind,
) -> Result<(), SynthesisError> {
    let target = method.method();
    let signature = target.signature();
    let (fits, expected) = match accessor {
        AccessorKind::Getter => (signature.is_getter_shape(), GETTER_SHAPE),
        AccessorKind::Setter => (signature.is_setter_shape(), SETTER_SHAPE),
    };
    if !fits {
        return Err(failure(
            method,
            accessor,
            SynthesisFailure::ShapeMismatch {
                method: target.name().to_string(),
                encoding: target.encoding().to_string(),
                expected,
            },
        ));
    }

    if !lookup.is_accessible(target) {
        if !lookup.config().access_override {
            return Err(failure(
                method,
                accessor,
                SynthesisFailure::AccessDenied {
                    method: target.name().to_string(),
                },
            ));
        }
        debug!(
            class = method.type_name(),
            method = target.name(),
            "overriding access check"
        );
    }

    Ok(())
}

fn link(method: &MethodRef, accessor: AccessorKind) -> Result<Thunk, SynthesisError> {
    let target = method.method();
    let entry = target.entry().ok_or_else(|| {
        failure(
            method,
            accessor,
            SynthesisFailure::NoEntryPoint {
                method: target.name().to_string(),
            },
        )
    })?;

    (entry.link)(&*entry.target).ok_or_else(|| linkage_mismatch(method, accessor))
}

fn linkage_mismatch(method: &MethodRef, accessor: AccessorKind) -> SynthesisError {
    failure(
        method,
        accessor,
        SynthesisFailure::LinkageMismatch {
            method: method.name().to_string(),
        },
    )
}

impl Binder for DirectBinder {
    fn bind_getter(
        &self,
        lookup: &Lookup,
        method: &MethodRef,
    ) -> Result<SyntheticGetter, SynthesisError> {
        preflight(lookup, method, AccessorKind::Getter)?;

        let Thunk::Getter(direct) = link(method, AccessorKind::Getter)? else {
            return Err(linkage_mismatch(method, AccessorKind::Getter));
        };

        let thunk: Arc<dyn GetterThunk> = if method.is_inherited() {
            Arc::new(UpcastGetter {
                path: Arc::clone(method.path()),
                expected: method.receiver_type(),
                inner: direct,
            })
        } else {
            direct
        };

        trace!(
            class = method.type_name(),
            method = method.name(),
            declared_by = method.method().declaring_class(),
            hops = method.path().len(),
            "linked getter entry point"
        );
        debug!(
            class = method.type_name(),
            property = method.property(),
            binder = "direct",
            "synthesized getter"
        );

        Ok(SyntheticGetter::new(method.clone(), thunk))
    }

    fn bind_setter(
        &self,
        lookup: &Lookup,
        method: &MethodRef,
    ) -> Result<SyntheticSetter, SynthesisError> {
        preflight(lookup, method, AccessorKind::Setter)?;

        let Thunk::Setter(direct) = link(method, AccessorKind::Setter)? else {
            return Err(linkage_mismatch(method, AccessorKind::Setter));
        };

        let thunk: Arc<dyn SetterThunk> = if method.is_inherited() {
            Arc::new(UpcastSetter {
                path: Arc::clone(method.path()),
                expected: method.receiver_type(),
                inner: direct,
            })
        } else {
            direct
        };

        trace!(
            class = method.type_name(),
            method = method.name(),
            declared_by = method.method().declaring_class(),
            hops = method.path().len(),
            "linked setter entry point"
        );
        debug!(
            class = method.type_name(),
            property = method.property(),
            binder = "direct",
            "synthesized setter"
        );

        Ok(SyntheticSetter::new(method.clone(), thunk))
    }
}

impl Binder for ReflectiveBinder {
    fn bind_getter(
        &self,
        lookup: &Lookup,
        method: &MethodRef,
    ) -> Result<SyntheticGetter, SynthesisError> {
        preflight(lookup, method, AccessorKind::Getter)?;

        debug!(
            class = method.type_name(),
            property = method.property(),
            binder = "reflective",
            "synthesized getter"
        );

        let thunk = Arc::new(ReflectiveGetter {
            method: method.clone(),
            lookup: lookup.clone(),
        });
        Ok(SyntheticGetter::new(method.clone(), thunk))
    }

    fn bind_setter(
        &self,
        lookup: &Lookup,
        method: &MethodRef,
    ) -> Result<SyntheticSetter, SynthesisError> {
        preflight(lookup, method, AccessorKind::Setter)?;

        debug!(
            class = method.type_name(),
            property = method.property(),
            binder = "reflective",
            "synthesized setter"
        );

        let thunk = Arc::new(ReflectiveSetter {
            method: method.clone(),
            lookup: lookup.clone(),
        });
        Ok(SyntheticSetter::new(method.clone(), thunk))
    }
}

/// Binds `method` as a reader with the [`DirectBinder`].
///
/// # Errors
///
/// See [`Binder::bind_getter`].
pub fn synthesize_getter(
    lookup: &Lookup,
    method: &MethodRef,
) -> Result<SyntheticGetter, SynthesisError> {
    DirectBinder.bind_getter(lookup, method)
}

/// Binds `method` as a writer with the [`DirectBinder`].
///
/// # Errors
///
/// See [`Binder::bind_setter`].
pub fn synthesize_setter(
    lookup: &Lookup,
    method: &MethodRef,
) -> Result<SyntheticSetter, SynthesisError> {
    DirectBinder.bind_setter(lookup, method)
}

/// Extracts the typed reader behind `method`.
///
/// `T` must be the declaring type and `V` the exact return type.
///
/// # Errors
///
/// [`SynthesisError`] for the preflight failures of [`Binder::bind_getter`],
/// or [`SynthesisFailure::LinkageMismatch`] when `T`/`V` do not match the
/// registered `fn` pointer or the method is inherited.
pub fn synthesize_typed_getter<T: Any, V: ValueType>(
    lookup: &Lookup,
    method: &MethodRef,
) -> Result<TypedGetter<T, V>, SynthesisError> {
    let target = typed_entry::<fn(&T) -> V>(lookup, method, AccessorKind::Getter)?;
    Ok(TypedGetter { target })
}

/// Extracts the typed writer behind `method`.
///
/// # Errors
///
/// See [`synthesize_typed_getter`].
pub fn synthesize_typed_setter<T: Any, V: ValueType>(
    lookup: &Lookup,
    method: &MethodRef,
) -> Result<TypedSetter<T, V>, SynthesisError> {
    let target = typed_entry::<fn(&mut T, V)>(lookup, method, AccessorKind::Setter)?;
    Ok(TypedSetter { target })
}

fn typed_entry<F: Any + Copy>(
    lookup: &Lookup,
    method: &MethodRef,
    accessor: AccessorKind,
) -> Result<F, SynthesisError> {
    preflight(lookup, method, accessor)?;

    if method.is_inherited() {
        return Err(linkage_mismatch(method, accessor));
    }

    let target = method.method();
    let entry = target.entry().ok_or_else(|| {
        failure(
            method,
            accessor,
            SynthesisFailure::NoEntryPoint {
                method: target.name().to_string(),
            },
        )
    })?;

    let typed = entry
        .target
        .downcast_ref::<F>()
        .copied()
        .ok_or_else(|| linkage_mismatch(method, accessor))?;

    debug!(
        class = method.type_name(),
        property = method.property(),
        binder = "typed",
        "synthesized {accessor}"
    );
    Ok(typed)
}

/// Resolves and synthesizes the reader of `property` in one step.
///
/// # Errors
///
/// [`Error::Resolution`](crate::Error::Resolution) or
/// [`Error::Synthesis`](crate::Error::Synthesis).
pub fn create_getter(
    lookup: &Lookup,
    class: &Class,
    property: &str,
) -> crate::Result<SyntheticGetter> {
    let method = resolve_getter_method(lookup, class, property)?;
    Ok(synthesize_getter(lookup, &method)?)
}

/// Resolves and synthesizes the writer of `property` in one step.
///
/// # Errors
///
/// [`Error::Resolution`](crate::Error::Resolution) or
/// [`Error::Synthesis`](crate::Error::Synthesis).
pub fn create_setter(
    lookup: &Lookup,
    class: &Class,
    property: &str,
) -> crate::Result<SyntheticSetter> {
    let method = resolve_setter_method(lookup, class, property)?;
    Ok(synthesize_setter(lookup, &method)?)
}

/// Both typed accessors of one property.
pub struct TypedAccessors<T, V> {
    /// Reader.
    pub getter: TypedGetter<T, V>,
    /// Writer.
    pub setter: TypedSetter<T, V>,
}

impl<T: Any, V: ValueType> TypedAccessors<T, V> {
    /// Resolves `property` on the class of `T` and extracts both typed
    /// accessors.
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`](crate::Error::Resolution) or
    /// [`Error::Synthesis`](crate::Error::Synthesis).
    pub fn create(lookup: &Lookup, class: &Class, property: &str) -> crate::Result<Self> {
        let read = resolve_getter_method(lookup, class, property)?;
        let write = resolve_setter_method(lookup, class, property)?;
        Ok(Self {
            getter: synthesize_typed_getter(lookup, &read)?,
            setter: synthesize_typed_setter(lookup, &write)?,
        })
    }
}
