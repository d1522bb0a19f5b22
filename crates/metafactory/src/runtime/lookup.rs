//! Access context for resolution, synthesis and reflective calls.

use crate::config::RuntimeConfig;
use crate::runtime::class::{Class, Registry};
use crate::runtime::introspection::property_name_of;
use crate::runtime::method::{Method, MethodRef};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A view of a [`Registry`] from some point in the program.
///
/// A lookup created [`in_class`](Self::in_class) may access that class's
/// private methods; a [`public`](Self::public) lookup only sees public ones.
/// With [`RuntimeConfig::access_override`] set, inaccessible methods are
/// still reachable.
///
/// # Example
///
/// ```
/// use metafactory::runtime::{ClassBuilder, Lookup, Registry};
/// use std::sync::Arc;
///
/// struct Secret {
///     code: i32,
/// }
///
/// impl Secret {
///     fn code(&self) -> i32 {
///         self.code
///     }
/// }
///
/// let registry = Arc::new(Registry::new());
/// let class = registry
///     .register(ClassBuilder::<Secret>::new("Secret").private_getter("getCode", Secret::code))
///     .unwrap();
/// let method = class.method("getCode").unwrap();
///
/// assert!(!Lookup::public(Arc::clone(&registry)).is_accessible(method));
/// assert!(Lookup::in_class::<Secret>(registry).is_accessible(method));
/// ```
#[derive(Clone)]
pub struct Lookup {
    registry: Arc<Registry>,
    lookup_class: Option<TypeId>,
    config: RuntimeConfig,
}

impl Lookup {
    /// A lookup with access to public methods only.
    #[must_use]
    pub fn public(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            lookup_class: None,
            config: RuntimeConfig::default(),
        }
    }

    /// A lookup with private access to `T`.
    #[must_use]
    pub fn in_class<T: Any>(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            lookup_class: Some(TypeId::of::<T>()),
            config: RuntimeConfig::default(),
        }
    }

    /// Replaces the runtime configuration.
    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Whether this lookup has private access to `class`.
    #[must_use]
    pub fn has_private_access(&self, class: &Class) -> bool {
        self.lookup_class == Some(class.type_id())
    }

    /// Whether `method` is accessible without an override.
    #[must_use]
    pub fn is_accessible(&self, method: &Method) -> bool {
        method.is_public() || self.lookup_class == Some(method.receiver_type_id())
    }

    /// Whether `method` may be used, counting the access override.
    #[must_use]
    pub fn is_reachable(&self, method: &Method) -> bool {
        self.is_accessible(method) || self.config.access_override
    }

    /// The class describing `T`.
    #[must_use]
    pub fn find_class<T: Any>(&self) -> Option<Class> {
        self.registry.class_of::<T>()
    }

    /// The class registered as `name`.
    #[must_use]
    pub fn find_class_by_name(&self, name: &str) -> Option<Class> {
        self.registry.class_from_name(name)
    }

    /// Resolves a reachable method by name, searching superclasses.
    ///
    /// The reference's property is derived from the accessor prefix when
    /// there is one, otherwise it is the method name.
    #[must_use]
    pub fn find_method(&self, class: &Class, name: &str) -> Option<MethodRef> {
        let (method, path) = class.find_method(name, |m| self.is_reachable(m))?;
        let property = property_name_of(name).unwrap_or_else(|| name.to_string());
        Some(MethodRef::new(method, class, property, path))
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lookup_class = self
            .lookup_class
            .and_then(|id| self.registry.class_for(id))
            .map(|class| class.name().to_string());

        f.debug_struct("Lookup")
            .field("lookup_class", &lookup_class)
            .field("config", &self.config)
            .finish()
    }
}
