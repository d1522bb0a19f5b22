//! Accessor synthesis tests
//!
//! End-to-end tests for resolving and binding property accessors:
//! - Getter/setter round trips through every binding strategy
//! - Resolution failures for unknown properties
//! - Shape and linkage failures at bind time
//! - Receiver and value type checks at call time
//!
//! Run with: `cargo test --test accessor_test`

mod common;

use common::{Account, FIELD_NAME, INITIAL, TestPojo, class_of, create_test_lookup};
use metafactory::runtime::introspection::{resolve_getter_method, resolve_setter_method};
use metafactory::runtime::synthesis::{
    Binder, ReflectiveBinder, create_getter, create_setter, synthesize_getter,
    synthesize_setter, synthesize_typed_getter, synthesize_typed_setter,
};
use metafactory::runtime::{Value, ValueType};
use metafactory::{
    AccessorKind, Error, InvocationError, ResolutionFailure, SynthesisFailure,
};
use rand::Rng;
use std::sync::Arc;

fn random_value() -> String {
    let mut rng = rand::rng();
    (0..8)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test]
fn test_initial_then_updated() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);

    let getter = create_getter(&lookup, &class, FIELD_NAME).unwrap();
    let setter = create_setter(&lookup, &class, FIELD_NAME).unwrap();

    let mut pojo = TestPojo::default();
    assert_eq!(getter.apply(&pojo).unwrap(), Value::from(INITIAL));

    setter.accept(&mut pojo, &Value::from("abcdefgh")).unwrap();
    assert_eq!(getter.apply(&pojo).unwrap(), Value::from("abcdefgh"));
    assert_eq!(&*pojo.field(), "abcdefgh");
}

#[test]
fn test_round_trip_random_value() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let getter = create_getter(&lookup, &class, FIELD_NAME).unwrap();
    let setter = create_setter(&lookup, &class, FIELD_NAME).unwrap();

    let value = random_value();
    assert_eq!(value.len(), 8);
    assert!(value.bytes().all(|b| b.is_ascii_lowercase()));

    let mut pojo = TestPojo::default();
    setter.accept(&mut pojo, &Value::from(value.as_str())).unwrap();
    assert_eq!(getter.apply(&pojo).unwrap().as_str(), Some(value.as_str()));
}

#[test]
fn test_strategies_agree() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let read = resolve_getter_method(&lookup, &class, FIELD_NAME).unwrap();
    let write = resolve_setter_method(&lookup, &class, FIELD_NAME).unwrap();

    let direct_get = synthesize_getter(&lookup, &read).unwrap();
    let reflective_get = ReflectiveBinder.bind_getter(&lookup, &read).unwrap();
    let typed_get = synthesize_typed_getter::<TestPojo, Arc<str>>(&lookup, &read).unwrap();

    let direct_set = synthesize_setter(&lookup, &write).unwrap();
    let reflective_set = ReflectiveBinder.bind_setter(&lookup, &write).unwrap();
    let typed_set = synthesize_typed_setter::<TestPojo, Arc<str>>(&lookup, &write).unwrap();

    let mut pojo = TestPojo::default();

    direct_set.accept(&mut pojo, &Value::from("direct")).unwrap();
    assert_eq!(&*typed_get.get(&pojo), "direct");

    reflective_set.accept(&mut pojo, &Value::from("reflective")).unwrap();
    assert_eq!(direct_get.apply(&pojo).unwrap(), Value::from("reflective"));

    typed_set.set(&mut pojo, Arc::from("typed"));
    assert_eq!(reflective_get.apply(&pojo).unwrap(), Value::from("typed"));
    assert_eq!(
        read.invoke(&lookup, &pojo, &[]).unwrap(),
        Value::from("typed")
    );
}

#[test]
fn test_numeric_and_boolean_properties() {
    let lookup = create_test_lookup();
    let class = class_of::<Account>(&lookup);

    let active = create_getter(&lookup, &class, "active").unwrap();
    let set_active = create_setter(&lookup, &class, "active").unwrap();
    let balance = create_getter(&lookup, &class, "balance").unwrap();
    let set_balance = create_setter(&lookup, &class, "balance").unwrap();

    let mut account = Account::default();
    set_active.accept(&mut account, &Value::Bool(true)).unwrap();
    // An int widens into a double property
    set_balance.accept(&mut account, &Value::Int(12)).unwrap();

    assert_eq!(active.apply(&account).unwrap(), Value::Bool(true));
    assert_eq!(balance.apply(&account).unwrap(), Value::Double(12.0));
    assert_eq!(active.method().name(), "isActive");
}

// ============================================================================
// Resolution Failure Tests
// ============================================================================

#[test]
fn test_missing_property_getter() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);

    let err = resolve_getter_method(&lookup, &class, "missing").unwrap_err();
    assert_eq!(err.type_name, "TestPojo");
    assert_eq!(err.property, "missing");
    assert_eq!(err.accessor, AccessorKind::Getter);

    let message = err.to_string();
    assert!(message.contains("missing"), "message: {message}");
    assert!(message.contains("TestPojo"), "message: {message}");
}

#[test]
fn test_missing_property_setter() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);

    let err = resolve_setter_method(&lookup, &class, "missing").unwrap_err();
    assert_eq!(err.accessor, AccessorKind::Setter);
    assert!(matches!(
        err.cause,
        ResolutionFailure::MethodNotFound { .. }
    ));
}

#[test]
fn test_create_reports_resolution_error() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);

    let err = create_getter(&lookup, &class, "missing").unwrap_err();
    assert!(matches!(err, Error::Resolution(_)));

    let err = create_setter(&lookup, &class, "").unwrap_err();
    let Error::Resolution(inner) = err else {
        panic!("expected a resolution error");
    };
    assert_eq!(inner.cause, ResolutionFailure::EmptyName);
}

// ============================================================================
// Synthesis Failure Tests
// ============================================================================

#[test]
fn test_setter_reference_into_getter_synthesis() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let write = resolve_setter_method(&lookup, &class, FIELD_NAME).unwrap();

    let err = synthesize_getter(&lookup, &write).unwrap_err();
    assert_eq!(err.accessor, AccessorKind::Getter);
    assert_eq!(err.type_name, "TestPojo");
    assert_eq!(err.property, FIELD_NAME);
    assert!(matches!(
        err.cause,
        SynthesisFailure::ShapeMismatch { ref method, .. } if method == "setField"
    ));

    let err = ReflectiveBinder.bind_getter(&lookup, &write).unwrap_err();
    assert!(matches!(err.cause, SynthesisFailure::ShapeMismatch { .. }));
}

#[test]
fn test_typed_synthesis_wrong_receiver() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let read = resolve_getter_method(&lookup, &class, FIELD_NAME).unwrap();

    let err = synthesize_typed_getter::<Account, Arc<str>>(&lookup, &read).unwrap_err();
    assert!(matches!(err.cause, SynthesisFailure::LinkageMismatch { .. }));

    let err = synthesize_typed_getter::<TestPojo, String>(&lookup, &read).unwrap_err();
    assert!(matches!(err.cause, SynthesisFailure::LinkageMismatch { .. }));
}

// ============================================================================
// Invocation Tests
// ============================================================================

#[test]
fn test_wrong_receiver_rejected() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let getter = create_getter(&lookup, &class, FIELD_NAME).unwrap();
    let setter = create_setter(&lookup, &class, FIELD_NAME).unwrap();

    let mut account = Account::default();
    assert!(matches!(
        getter.apply(&account),
        Err(InvocationError::ReceiverMismatch { .. })
    ));
    assert!(matches!(
        setter.accept(&mut account, &Value::from("x")),
        Err(InvocationError::ReceiverMismatch { .. })
    ));
}

#[test]
fn test_wrong_value_type_rejected() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let setter = create_setter(&lookup, &class, FIELD_NAME).unwrap();

    let mut pojo = TestPojo::default();
    let err = setter.accept(&mut pojo, &Value::Int(7)).unwrap_err();
    assert_eq!(
        err,
        InvocationError::ArgumentTypeMismatch {
            expected: <Arc<str>>::ENCODING,
            got: 'i',
            index: 0,
        }
    );
    assert_eq!(&*pojo.field(), INITIAL);
}

// ============================================================================
// Identity Tests
// ============================================================================

#[test]
fn test_resolution_is_idempotent() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);

    let first = resolve_getter_method(&lookup, &class, FIELD_NAME).unwrap();
    let second = resolve_getter_method(&lookup, &class, FIELD_NAME).unwrap();
    assert_eq!(first, second);

    let first_getter = synthesize_getter(&lookup, &first).unwrap();
    let second_getter = synthesize_getter(&lookup, &second).unwrap();

    let mut pojo = TestPojo::new("abcdefgh");
    assert_eq!(
        first_getter.apply(&pojo).unwrap(),
        second_getter.apply(&pojo).unwrap()
    );

    let first = resolve_setter_method(&lookup, &class, FIELD_NAME).unwrap();
    let second = resolve_setter_method(&lookup, &class, FIELD_NAME).unwrap();
    assert_eq!(first, second);

    let first_setter = synthesize_setter(&lookup, &first).unwrap();
    let second_setter = synthesize_setter(&lookup, &second).unwrap();

    let value = Value::from("first");
    first_setter.accept(&mut pojo, &value).unwrap();
    let after_first = first_getter.apply(&pojo).unwrap();
    second_setter.accept(&mut pojo, &value).unwrap();
    assert_eq!(second_getter.apply(&pojo).unwrap(), after_first);
    assert_eq!(after_first, value);
}

#[test]
fn test_synthetic_accessor_reports_bound_method() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let read = resolve_getter_method(&lookup, &class, FIELD_NAME).unwrap();

    let getter = synthesize_getter(&lookup, &read).unwrap();
    assert_eq!(getter.target(), &read);
    assert_eq!(getter.method().name(), "getField");
    assert_eq!(getter.property(), FIELD_NAME);
    assert_eq!(getter.type_name(), "TestPojo");

    let copy = getter.clone();
    assert_eq!(copy.target(), getter.target());
}
