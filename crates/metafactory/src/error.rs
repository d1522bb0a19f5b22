//! Error types for the `metafactory` runtime.
//!
//! Three failure families exist, one per phase:
//!
//! - [`PropertyResolutionError`]: a `(type, property)` pair could not be
//!   mapped to accessor methods.
//! - [`SynthesisError`]: a resolved method could not be bound into a callable.
//! - [`InvocationError`]: a call was made with the wrong receiver or
//!   arguments.
//!
//! Registry failures and the three families above are gathered in [`Error`].

use std::fmt;
use thiserror::Error;

/// Which side of a property an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    /// The read side (`getX` / `isX`).
    Getter,
    /// The write side (`setX`).
    Setter,
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKind::Getter => f.write_str("getter"),
            AccessorKind::Setter => f.write_str("setter"),
        }
    }
}

/// Why a property could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    /// The property name was empty.
    #[error("empty property name")]
    EmptyName,

    /// No reachable method with the conventional name and shape exists.
    #[error("method not found: {method}")]
    MethodNotFound {
        /// The last conventional method name tried.
        method: String,
    },

    /// The write argument type differs from the read return type.
    #[error("type mismatch between read ('{read}') and write ('{write}') methods")]
    TypeMismatch {
        /// Read method return encoding.
        read: char,
        /// Write method argument encoding.
        write: char,
    },
}

/// Raised when a `(type, property)` pair cannot be mapped to an accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to retrieve {accessor} for property `{property}` on `{type_name}`")]
pub struct PropertyResolutionError {
    /// Name of the class that was searched.
    pub type_name: String,
    /// The requested property.
    pub property: String,
    /// The direction that was requested.
    pub accessor: AccessorKind,
    /// Underlying cause.
    #[source]
    pub cause: ResolutionFailure,
}

/// Why a method reference could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisFailure {
    /// The method signature does not fit the requested accessor shape.
    #[error("method `{method}` has signature `{encoding}`, expected {expected}")]
    ShapeMismatch {
        /// Method name.
        method: String,
        /// The method's full type encoding.
        encoding: String,
        /// Human description of the required shape.
        expected: &'static str,
    },

    /// The lookup may not access the method and override is disabled.
    #[error("method `{method}` is not accessible from this lookup")]
    AccessDenied {
        /// Method name.
        method: String,
    },

    /// The method was registered without a typed entry point.
    #[error("method `{method}` has no statically linkable entry point")]
    NoEntryPoint {
        /// Method name.
        method: String,
    },

    /// The entry point does not have the requested static type.
    #[error("entry point of `{method}` does not link as the requested signature")]
    LinkageMismatch {
        /// Method name.
        method: String,
    },
}

/// Raised when a resolved method cannot be turned into a bound callable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to create {accessor} for property `{property}` on `{type_name}`")]
pub struct SynthesisError {
    /// Name of the receiver class.
    pub type_name: String,
    /// Property the method belongs to.
    pub property: String,
    /// The direction being synthesized.
    pub accessor: AccessorKind,
    /// Underlying cause.
    #[source]
    pub cause: SynthesisFailure,
}

/// Raised by a single call through a method reference or synthetic accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    /// The receiver is not an instance of the expected type.
    #[error("receiver is not an instance of `{expected}`")]
    ReceiverMismatch {
        /// Rust type name of the expected receiver.
        expected: &'static str,
    },

    /// Argument count mismatch for method signature.
    #[error("argument count mismatch: expected {expected}, got {got}")]
    ArgumentCountMismatch {
        /// Expected number of arguments
        expected: usize,
        /// Actual number of arguments provided
        got: usize,
    },

    /// Argument type mismatch for method signature.
    #[error("argument type mismatch at index {index}: expected '{expected}', got '{got}'")]
    ArgumentTypeMismatch {
        /// Expected type encoding
        expected: char,
        /// Actual type encoding
        got: char,
        /// Argument index
        index: usize,
    },

    /// The lookup may not access the method and override is disabled.
    #[error("method `{method}` is not accessible from this lookup")]
    AccessDenied {
        /// Method name.
        method: String,
    },

    /// A mutating method was invoked through a shared receiver.
    #[error("method `{method}` requires a mutable receiver")]
    MutableReceiverRequired {
        /// Method name.
        method: String,
    },
}

/// Errors that can occur in the `metafactory` runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Class name or type already registered.
    #[error("class `{name}` is already registered")]
    ClassAlreadyExists {
        /// The conflicting class name.
        name: String,
    },

    /// `extends` named a parent type that has no class yet.
    #[error("superclass `{parent}` of `{class}` is not registered")]
    SuperclassNotRegistered {
        /// Class being registered.
        class: String,
        /// Rust type name of the parent.
        parent: &'static str,
    },

    /// Inheritance cycle detected.
    #[error("inheritance cycle detected at `{class}`")]
    InheritanceCycle {
        /// Class being registered.
        class: String,
    },

    /// Invalid type encoding string.
    #[error("invalid type encoding `{encoding}`")]
    InvalidEncoding {
        /// The rejected encoding.
        encoding: String,
    },

    /// Two methods with the same name on one class.
    #[error("method `{method}` is already defined on `{class}`")]
    MethodAlreadyExists {
        /// Class being registered.
        class: String,
        /// Duplicated method name.
        method: String,
    },

    /// See [`PropertyResolutionError`].
    #[error(transparent)]
    Resolution(#[from] PropertyResolutionError),

    /// See [`SynthesisError`].
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// See [`InvocationError`].
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Result type for `metafactory` runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
