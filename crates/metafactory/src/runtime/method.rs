//! Method metadata and resolved method references.
//!
//! A [`Method`] is what a class registers: a name, a signature encoding, a
//! visibility, and two ways of calling it:
//!
//! - an **erased implementation** taking `&dyn Any` and `&[Value]`, used by
//!   reflective invocation,
//! - for getters and setters, a **static entry point**: the typed `fn`
//!   pointer plus a monomorphised routine that links it into a bound thunk.
//!   Synthesis uses it and never touches the erased implementation.
//!
//! A [`MethodRef`] is a method as seen from one receiver class, after
//! resolution. It owns the upcast path for inherited methods and implements
//! the reflective call path.

use crate::error::InvocationError;
use crate::runtime::class::{Class, UpcastPath};
use crate::runtime::encoding::{self, Signature};
use crate::runtime::lookup::Lookup;
use crate::runtime::synthesis::{self, Thunk};
use crate::runtime::value::{Value, ValueType};
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// Who may call a method without an access override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Any lookup.
    Public,
    /// Only lookups created in the declaring class.
    Private,
}

/// Erased implementation of a method taking a shared receiver.
pub(crate) type QueryFn =
    dyn Fn(&dyn Any, &[Value]) -> Result<Value, InvocationError> + Send + Sync;

/// Erased implementation of a method taking an exclusive receiver.
pub(crate) type CommandFn =
    dyn Fn(&mut dyn Any, &[Value]) -> Result<Value, InvocationError> + Send + Sync;

/// Erased implementation used by reflective dispatch.
#[derive(Clone)]
pub(crate) enum Imp {
    Query(Arc<QueryFn>),
    Command(Arc<CommandFn>),
}

/// Typed function pointer recorded at registration.
///
/// `target` holds a `fn(&T) -> V` or `fn(&mut T, V)`; `link` is the
/// monomorphised routine that knows which one.
pub(crate) struct EntryPoint {
    pub(crate) target: Box<dyn Any + Send + Sync>,
    pub(crate) link: fn(&(dyn Any + Send + Sync)) -> Option<Thunk>,
}

pub(crate) fn downcast<T: Any>(receiver: &dyn Any) -> Result<&T, InvocationError> {
    receiver
        .downcast_ref::<T>()
        .ok_or(InvocationError::ReceiverMismatch {
            expected: type_name::<T>(),
        })
}

pub(crate) fn downcast_mut<T: Any>(receiver: &mut dyn Any) -> Result<&mut T, InvocationError> {
    receiver
        .downcast_mut::<T>()
        .ok_or(InvocationError::ReceiverMismatch {
            expected: type_name::<T>(),
        })
}

pub(crate) fn unbox<V: ValueType>(value: &Value, index: usize) -> Result<V, InvocationError> {
    V::from_value(value).ok_or(InvocationError::ArgumentTypeMismatch {
        expected: V::ENCODING,
        got: value.encoding(),
        index,
    })
}

/// A method as declared by a `ClassBuilder`, before its class exists.
pub(crate) struct MethodSpec {
    name: String,
    encoding: String,
    visibility: Visibility,
    receiver: TypeId,
    imp: Imp,
    entry: Option<EntryPoint>,
}

impl MethodSpec {
    pub(crate) fn getter<T: Any, V: ValueType>(
        name: &str,
        visibility: Visibility,
        target: fn(&T) -> V,
    ) -> Self {
        let imp = Imp::Query(Arc::new(
            move |receiver: &dyn Any, _args: &[Value]| -> Result<Value, InvocationError> {
                Ok(target(downcast::<T>(receiver)?).into_value())
            },
        ));

        Self {
            name: name.to_string(),
            encoding: encoding::getter_encoding(V::ENCODING),
            visibility,
            receiver: TypeId::of::<T>(),
            imp,
            entry: Some(EntryPoint {
                target: Box::new(target),
                link: synthesis::link_getter::<T, V>,
            }),
        }
    }

    pub(crate) fn setter<T: Any, V: ValueType>(
        name: &str,
        visibility: Visibility,
        target: fn(&mut T, V),
    ) -> Self {
        let imp = Imp::Command(Arc::new(
            move |receiver: &mut dyn Any, args: &[Value]| -> Result<Value, InvocationError> {
                let value = match args {
                    [value] => unbox::<V>(value, 0)?,
                    _ => {
                        return Err(InvocationError::ArgumentCountMismatch {
                            expected: 1,
                            got: args.len(),
                        });
                    }
                };
                target(downcast_mut::<T>(receiver)?, value);
                Ok(Value::Void)
            },
        ));

        Self {
            name: name.to_string(),
            encoding: encoding::setter_encoding(V::ENCODING),
            visibility,
            receiver: TypeId::of::<T>(),
            imp,
            entry: Some(EntryPoint {
                target: Box::new(target),
                link: synthesis::link_setter::<T, V>,
            }),
        }
    }

    pub(crate) fn query<T, F>(name: &str, encoding: &str, visibility: Visibility, f: F) -> Self
    where
        T: Any,
        F: Fn(&T, &[Value]) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        let imp = Imp::Query(Arc::new(
            move |receiver: &dyn Any, args: &[Value]| -> Result<Value, InvocationError> {
                f(downcast::<T>(receiver)?, args)
            },
        ));

        Self {
            name: name.to_string(),
            encoding: encoding.to_string(),
            visibility,
            receiver: TypeId::of::<T>(),
            imp,
            entry: None,
        }
    }

    pub(crate) fn command<T, F>(name: &str, encoding: &str, visibility: Visibility, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut T, &[Value]) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        let imp = Imp::Command(Arc::new(
            move |receiver: &mut dyn Any, args: &[Value]| -> Result<Value, InvocationError> {
                f(downcast_mut::<T>(receiver)?, args)
            },
        ));

        Self {
            name: name.to_string(),
            encoding: encoding.to_string(),
            visibility,
            receiver: TypeId::of::<T>(),
            imp,
            entry: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Parses the encoding and freezes the spec into a `Method`.
    pub(crate) fn build(self, declaring_class: &str) -> crate::Result<Method> {
        let signature = encoding::parse_signature(&self.encoding)?;

        Ok(Method {
            inner: Arc::new(MethodInner {
                name: self.name,
                declaring_class: declaring_class.to_string(),
                receiver: self.receiver,
                encoding: self.encoding,
                signature,
                visibility: self.visibility,
                imp: self.imp,
                entry: self.entry,
            }),
        })
    }
}

struct MethodInner {
    name: String,
    declaring_class: String,
    receiver: TypeId,
    encoding: String,
    signature: Signature,
    visibility: Visibility,
    imp: Imp,
    entry: Option<EntryPoint>,
}

/// A registered method.
///
/// Immutable and cheap to clone; clones share the same metadata.
#[derive(Clone)]
pub struct Method {
    inner: Arc<MethodInner>,
}

impl Method {
    /// Method name (e.g. `getField`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Full type encoding (e.g. `*@:`).
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.inner.encoding
    }

    /// Parsed signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.inner.visibility
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.inner.visibility == Visibility::Public
    }

    /// Name of the class that declares this method.
    #[must_use]
    pub fn declaring_class(&self) -> &str {
        &self.inner.declaring_class
    }

    /// Whether the method needs an exclusive receiver.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(self.inner.imp, Imp::Command(_))
    }

    /// Whether the method can be linked by a direct binder.
    #[must_use]
    pub fn has_entry_point(&self) -> bool {
        self.inner.entry.is_some()
    }

    /// Whether two handles refer to the same registered method.
    #[must_use]
    pub fn ptr_eq(a: &Method, b: &Method) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn receiver_type_id(&self) -> TypeId {
        self.inner.receiver
    }

    pub(crate) fn imp(&self) -> &Imp {
        &self.inner.imp
    }

    pub(crate) fn entry(&self) -> Option<&EntryPoint> {
        self.inner.entry.as_ref()
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.inner.name)
            .field("declaring_class", &self.inner.declaring_class)
            .field("encoding", &self.inner.encoding)
            .field("visibility", &self.inner.visibility)
            .field("entry_point", &self.inner.entry.is_some())
            .finish()
    }
}

/// A resolved accessor method reference.
///
/// Binds a [`Method`] to the class it was resolved on and to a property
/// name. Immutable; resolving the same pair twice yields equal references.
#[derive(Clone)]
pub struct MethodRef {
    method: Method,
    receiver_class: String,
    receiver_type: &'static str,
    property: String,
    path: UpcastPath,
}

impl MethodRef {
    pub(crate) fn new(method: Method, class: &Class, property: String, path: UpcastPath) -> Self {
        Self {
            method,
            receiver_class: class.name().to_string(),
            receiver_type: class.type_name(),
            property,
            path,
        }
    }

    /// The referenced method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Name of the class this reference was resolved on.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.receiver_class
    }

    /// Property this method reads or writes.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Whether the method is declared by a superclass.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        !self.path.is_empty()
    }

    pub(crate) fn path(&self) -> &UpcastPath {
        &self.path
    }

    pub(crate) fn receiver_type(&self) -> &'static str {
        self.receiver_type
    }

    /// Reflectively invokes the method on a shared receiver.
    ///
    /// Every call re-checks access, arity and argument encodings before
    /// dispatching through the erased implementation.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::AccessDenied`] if the lookup cannot reach the method
    /// - [`InvocationError::ArgumentCountMismatch`] / [`InvocationError::ArgumentTypeMismatch`]
    ///   if `args` do not fit the signature
    /// - [`InvocationError::MutableReceiverRequired`] for mutating methods
    /// - [`InvocationError::ReceiverMismatch`] if `receiver` has the wrong type
    pub fn invoke(
        &self,
        lookup: &Lookup,
        receiver: &dyn Any,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        self.check_call(lookup, args)?;

        match self.method.imp() {
            Imp::Query(f) => f(self.project(receiver)?, args),
            Imp::Command(_) => Err(InvocationError::MutableReceiverRequired {
                method: self.method.name().to_string(),
            }),
        }
    }

    /// Reflectively invokes the method on an exclusive receiver.
    ///
    /// Accepts both mutating and non-mutating methods.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke), except that mutating methods are
    /// accepted.
    pub fn invoke_mut(
        &self,
        lookup: &Lookup,
        receiver: &mut dyn Any,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        self.check_call(lookup, args)?;

        let receiver = self.project_mut(receiver)?;
        match self.method.imp() {
            Imp::Query(f) => f(receiver, args),
            Imp::Command(f) => f(receiver, args),
        }
    }

    fn check_call(&self, lookup: &Lookup, args: &[Value]) -> Result<(), InvocationError> {
        if !lookup.is_reachable(&self.method) {
            return Err(InvocationError::AccessDenied {
                method: self.method.name().to_string(),
            });
        }

        let expected = self.method.signature().arg_types();
        if expected.len() != args.len() {
            return Err(InvocationError::ArgumentCountMismatch {
                expected: expected.len(),
                got: args.len(),
            });
        }

        for (index, (&declared, arg)) in expected.iter().zip(args).enumerate() {
            if !encoding::is_assignable(arg.encoding(), declared) {
                return Err(InvocationError::ArgumentTypeMismatch {
                    expected: declared,
                    got: arg.encoding(),
                    index,
                });
            }
        }

        Ok(())
    }

    fn project<'a>(&self, mut receiver: &'a dyn Any) -> Result<&'a dyn Any, InvocationError> {
        for step in self.path.iter() {
            receiver = step.upcast(receiver).ok_or(InvocationError::ReceiverMismatch {
                expected: self.receiver_type,
            })?;
        }
        Ok(receiver)
    }

    fn project_mut<'a>(
        &self,
        mut receiver: &'a mut dyn Any,
    ) -> Result<&'a mut dyn Any, InvocationError> {
        for step in self.path.iter() {
            receiver = match step.upcast_mut(receiver) {
                Some(parent) => parent,
                None => {
                    return Err(InvocationError::ReceiverMismatch {
                        expected: self.receiver_type,
                    });
                }
            };
        }
        Ok(receiver)
    }
}

impl PartialEq for MethodRef {
    fn eq(&self, other: &Self) -> bool {
        Method::ptr_eq(&self.method, &other.method)
            && self.receiver_class == other.receiver_class
            && self.property == other.property
    }
}

impl Eq for MethodRef {}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRef")
            .field("class", &self.receiver_class)
            .field("property", &self.property)
            .field("method", &self.method.name())
            .field("encoding", &self.method.encoding())
            .field("inherited", &self.is_inherited())
            .finish()
    }
}
