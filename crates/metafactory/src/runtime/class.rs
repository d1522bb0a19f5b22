//! Class metadata and the class registry.
//!
//! A [`Class`] describes one Rust type: its name, its optional superclass,
//! and the accessor methods it declares. Classes are built with a
//! [`ClassBuilder`] and frozen on registration; after that their method
//! tables never change, so lookups need no locking.
//!
//! Inheritance is expressed by composition: a child type embeds its parent
//! and registers a projection to reach it. Methods inherited from a parent
//! are reached through the chain of projections recorded here.
//!
//! # Example
//!
//! ```
//! use metafactory::runtime::{ClassBuilder, Registry};
//!
//! struct Point {
//!     x: i32,
//! }
//!
//! impl Point {
//!     fn x(&self) -> i32 {
//!         self.x
//!     }
//!
//!     fn set_x(&mut self, x: i32) {
//!         self.x = x;
//!     }
//! }
//!
//! let registry = Registry::new();
//! let class = registry
//!     .register(
//!         ClassBuilder::<Point>::new("Point")
//!             .getter("getX", Point::x)
//!             .setter("setX", Point::set_x),
//!     )
//!     .unwrap();
//!
//! assert_eq!(class.name(), "Point");
//! assert!(class.method("getX").is_some());
//! ```

use crate::error::{Error, InvocationError, Result};
use crate::runtime::method::{Method, MethodSpec, Visibility};
use crate::runtime::value::{Value, ValueType};
use fxhash::{FxHashMap, FxHashSet};
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// One step from a child receiver to its embedded parent.
pub(crate) trait Upcast: Send + Sync {
    fn upcast<'a>(&self, receiver: &'a dyn Any) -> Option<&'a dyn Any>;
    fn upcast_mut<'a>(&self, receiver: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

/// Chain of upcasts from a receiver class to a method's declaring class.
pub(crate) type UpcastPath = Arc<[Arc<dyn Upcast>]>;

struct Projection<T, P> {
    project: fn(&T) -> &P,
    project_mut: fn(&mut T) -> &mut P,
}

impl<T: Any, P: Any> Upcast for Projection<T, P> {
    fn upcast<'a>(&self, receiver: &'a dyn Any) -> Option<&'a dyn Any> {
        let child = receiver.downcast_ref::<T>()?;
        Some((self.project)(child) as &dyn Any)
    }

    fn upcast_mut<'a>(&self, receiver: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let child = receiver.downcast_mut::<T>()?;
        Some((self.project_mut)(child) as &mut dyn Any)
    }
}

struct SuperLink {
    parent: TypeId,
    parent_name: &'static str,
    upcast: Arc<dyn Upcast>,
}

struct ClassInner {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    super_class: Option<(Class, Arc<dyn Upcast>)>,
    methods: Vec<Method>,
    index: FxHashMap<String, usize>,
}

/// A registered class.
///
/// Cheap to clone; equality is identity.
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

impl Class {
    /// Registered class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// `TypeId` of the described Rust type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.inner.type_id
    }

    /// Rust type name of the described type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name
    }

    /// Direct superclass, if any.
    #[must_use]
    pub fn super_class(&self) -> Option<&Class> {
        self.inner.super_class.as_ref().map(|(class, _)| class)
    }

    /// This class followed by its ancestors, nearest first.
    #[must_use]
    pub fn hierarchy(&self) -> Vec<Class> {
        let mut chain = vec![self.clone()];
        let mut current = self.super_class();
        while let Some(class) = current {
            chain.push(class.clone());
            current = class.super_class();
        }
        chain
    }

    /// Whether `other` is this class or one of its ancestors.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.hierarchy().iter().any(|class| class == other)
    }

    /// A method declared directly on this class.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.inner
            .index
            .get(name)
            .map(|&slot| &self.inner.methods[slot])
    }

    /// Methods declared directly on this class, in registration order.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.inner.methods
    }

    /// All methods visible on this class, including inherited ones.
    ///
    /// A subclass method hides a superclass method of the same name.
    #[must_use]
    pub fn instance_methods(&self) -> Vec<Method> {
        self.walk_methods(|_| true)
            .into_iter()
            .map(|(method, _)| method)
            .collect()
    }

    /// Finds the nearest method named `name` accepted by `accept`, walking
    /// up the hierarchy. Returns the method and the upcast path to it.
    pub(crate) fn find_method(
        &self,
        name: &str,
        accept: impl Fn(&Method) -> bool,
    ) -> Option<(Method, UpcastPath)> {
        let mut path: Vec<Arc<dyn Upcast>> = Vec::new();
        let mut current = self.clone();

        loop {
            if let Some(method) = current.method(name).filter(|m| accept(*m)) {
                return Some((method.clone(), path.into()));
            }
            let (parent, upcast) = current.inner.super_class.clone()?;
            path.push(upcast);
            current = parent;
        }
    }

    /// Every method accepted by `accept` paired with its upcast path,
    /// subclass first. Only an accepted method hides its superclass namesakes.
    pub(crate) fn walk_methods(
        &self,
        accept: impl Fn(&Method) -> bool,
    ) -> Vec<(Method, UpcastPath)> {
        let mut seen = FxHashSet::default();
        let mut found = Vec::new();
        let mut path: Vec<Arc<dyn Upcast>> = Vec::new();
        let mut current = Some(self.clone());

        while let Some(class) = current {
            let shared: UpcastPath = path.clone().into();
            for method in class.methods().iter().filter(|m| accept(*m)) {
                if seen.insert(method.name().to_string()) {
                    found.push((method.clone(), Arc::clone(&shared)));
                }
            }
            current = match &class.inner.super_class {
                Some((parent, upcast)) => {
                    path.push(Arc::clone(upcast));
                    Some(parent.clone())
                }
                None => None,
            };
        }

        found
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("super_class", &self.super_class().map(Class::name))
            .field(
                "methods",
                &self.inner.methods.iter().map(Method::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for a class describing `T`.
///
/// Getters and setters registered here get a typed entry point and can be
/// synthesized directly. `query` and `command` methods are reflective only.
pub struct ClassBuilder<T> {
    name: String,
    super_link: Option<SuperLink>,
    methods: Vec<MethodSpec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> ClassBuilder<T> {
    /// Starts a class named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_link: None,
            methods: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Name the class will be registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares `P` as the superclass, reached through `project`.
    ///
    /// `P` must already be registered when this builder is.
    #[must_use]
    pub fn extends<P: Any>(
        mut self,
        project: fn(&T) -> &P,
        project_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.super_link = Some(SuperLink {
            parent: TypeId::of::<P>(),
            parent_name: type_name::<P>(),
            upcast: Arc::new(Projection {
                project,
                project_mut,
            }),
        });
        self
    }

    /// Adds a public zero-argument reader.
    #[must_use]
    pub fn getter<V: ValueType>(self, name: &str, target: fn(&T) -> V) -> Self {
        self.push(MethodSpec::getter(name, Visibility::Public, target))
    }

    /// Adds a private zero-argument reader.
    #[must_use]
    pub fn private_getter<V: ValueType>(self, name: &str, target: fn(&T) -> V) -> Self {
        self.push(MethodSpec::getter(name, Visibility::Private, target))
    }

    /// Adds a public one-argument writer.
    #[must_use]
    pub fn setter<V: ValueType>(self, name: &str, target: fn(&mut T, V)) -> Self {
        self.push(MethodSpec::setter(name, Visibility::Public, target))
    }

    /// Adds a private one-argument writer.
    #[must_use]
    pub fn private_setter<V: ValueType>(self, name: &str, target: fn(&mut T, V)) -> Self {
        self.push(MethodSpec::setter(name, Visibility::Private, target))
    }

    /// Adds a reflective-only method taking a shared receiver.
    ///
    /// `encoding` is validated on registration.
    #[must_use]
    pub fn query<F>(self, name: &str, encoding: &str, f: F) -> Self
    where
        F: Fn(&T, &[Value]) -> std::result::Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.push(MethodSpec::query(name, encoding, Visibility::Public, f))
    }

    /// Adds a reflective-only method taking an exclusive receiver.
    ///
    /// `encoding` is validated on registration.
    #[must_use]
    pub fn command<F>(self, name: &str, encoding: &str, f: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> std::result::Result<Value, InvocationError>
            + Send
            + Sync
            + 'static,
    {
        self.push(MethodSpec::command(name, encoding, Visibility::Public, f))
    }

    fn push(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }
}

/// A type that knows how to describe itself.
///
/// # Example
///
/// ```
/// use metafactory::runtime::{ClassBuilder, Reflect, Registry};
///
/// struct Flag {
///     on: bool,
/// }
///
/// impl Flag {
///     fn is_on(&self) -> bool {
///         self.on
///     }
/// }
///
/// impl Reflect for Flag {
///     fn class_name() -> &'static str {
///         "Flag"
///     }
///
///     fn reflect(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
///         class.getter("isOn", Flag::is_on)
///     }
/// }
///
/// let registry = Registry::new();
/// let class = registry.register_type::<Flag>().unwrap();
/// assert_eq!(class.name(), "Flag");
/// ```
pub trait Reflect: Any + Sized {
    /// Name to register the class under.
    fn class_name() -> &'static str {
        type_name::<Self>()
    }

    /// Adds this type's methods (and superclass) to `class`.
    fn reflect(class: ClassBuilder<Self>) -> ClassBuilder<Self>;
}

#[derive(Default)]
struct Tables {
    by_type: FxHashMap<TypeId, Class>,
    by_name: FxHashMap<String, TypeId>,
}

/// Registry of classes.
///
/// Registration takes a write lock; lookups take a read lock and clone the
/// `Arc` out, so bound accessors never touch the registry.
#[derive(Default)]
pub struct Registry {
    tables: RwLock<Tables>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Freezes `builder` into a class and registers it.
    ///
    /// # Errors
    ///
    /// - [`Error::ClassAlreadyExists`] if the name or the type is taken
    /// - [`Error::InheritanceCycle`] if `T` extends itself
    /// - [`Error::SuperclassNotRegistered`] if the parent has no class
    /// - [`Error::MethodAlreadyExists`] for duplicate method names
    /// - [`Error::InvalidEncoding`] for malformed reflective encodings
    pub fn register<T: Any>(&self, builder: ClassBuilder<T>) -> Result<Class> {
        let ClassBuilder {
            name,
            super_link,
            methods: specs,
            ..
        } = builder;
        let type_id = TypeId::of::<T>();

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        if tables.by_name.contains_key(&name) || tables.by_type.contains_key(&type_id) {
            return Err(Error::ClassAlreadyExists { name });
        }

        let super_class = match super_link {
            Some(link) if link.parent == type_id => {
                return Err(Error::InheritanceCycle { class: name });
            }
            Some(link) => match tables.by_type.get(&link.parent) {
                Some(parent) => Some((parent.clone(), link.upcast)),
                None => {
                    return Err(Error::SuperclassNotRegistered {
                        class: name,
                        parent: link.parent_name,
                    });
                }
            },
            None => None,
        };

        let mut methods = Vec::with_capacity(specs.len());
        let mut index = FxHashMap::default();
        for spec in specs {
            if index.contains_key(spec.name()) {
                return Err(Error::MethodAlreadyExists {
                    class: name,
                    method: spec.name().to_string(),
                });
            }
            index.insert(spec.name().to_string(), methods.len());
            methods.push(spec.build(&name)?);
        }

        let class = Class {
            inner: Arc::new(ClassInner {
                name: name.clone(),
                type_id,
                type_name: type_name::<T>(),
                super_class,
                methods,
                index,
            }),
        };

        debug!(
            class = %name,
            super_class = ?class.super_class().map(Class::name),
            methods = class.methods().len(),
            "registered class"
        );

        tables.by_name.insert(name, type_id);
        tables.by_type.insert(type_id, class.clone());
        Ok(class)
    }

    /// Registers a [`Reflect`] type.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_type<T: Reflect>(&self) -> Result<Class> {
        self.register(T::reflect(ClassBuilder::new(T::class_name())))
    }

    /// The class describing `T`.
    #[must_use]
    pub fn class_of<T: Any>(&self) -> Option<Class> {
        self.class_for(TypeId::of::<T>())
    }

    /// The class describing the type with `type_id`.
    #[must_use]
    pub fn class_for(&self, type_id: TypeId) -> Option<Class> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.by_type.get(&type_id).cloned()
    }

    /// The class registered as `name`.
    #[must_use]
    pub fn class_from_name(&self, name: &str) -> Option<Class> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let type_id = tables.by_name.get(name)?;
        tables.by_type.get(type_id).cloned()
    }

    /// All registered classes, sorted by name.
    #[must_use]
    pub fn all_classes(&self) -> Vec<Class> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut classes: Vec<Class> = tables.by_type.values().cloned().collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));
        classes
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_type
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("classes", &self.len())
            .finish()
    }
}
