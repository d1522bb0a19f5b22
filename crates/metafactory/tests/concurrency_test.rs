//! Concurrency tests
//!
//! Synthetic accessors are shared across threads without locks, and the
//! registry accepts concurrent registration and lookup.
//!
//! Run with: `cargo test --test concurrency_test`

mod common;

use common::{FIELD_NAME, INITIAL, TestPojo, class_of, create_test_lookup};
use metafactory::runtime::synthesis::{create_getter, create_setter};
use metafactory::runtime::{ClassBuilder, Registry, Value};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const ITERATIONS: usize = 1_000;

#[test]
fn test_shared_accessors_on_distinct_instances() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let getter = create_getter(&lookup, &class, FIELD_NAME).unwrap();
    let setter = create_setter(&lookup, &class, FIELD_NAME).unwrap();

    thread::scope(|s| {
        for id in 0..THREADS {
            let getter = &getter;
            let setter = &setter;
            s.spawn(move || {
                let mut pojo = TestPojo::default();
                assert_eq!(getter.apply(&pojo).unwrap(), Value::from(INITIAL));

                for i in 0..ITERATIONS {
                    let value = Value::from(format!("t{id}-{i}").as_str());
                    setter.accept(&mut pojo, &value).unwrap();
                    assert_eq!(getter.apply(&pojo).unwrap(), value);
                }
            });
        }
    });
}

#[test]
fn test_accessors_cloned_into_threads() {
    let lookup = create_test_lookup();
    let class = class_of::<TestPojo>(&lookup);
    let getter = Arc::new(create_getter(&lookup, &class, FIELD_NAME).unwrap());

    let pojo = Arc::new(TestPojo::new("shared"));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let getter = Arc::clone(&getter);
            let pojo = Arc::clone(&pojo);
            thread::spawn(move || {
                (0..ITERATIONS)
                    .filter(|_| getter.apply(&*pojo).unwrap() == Value::from("shared"))
                    .count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ITERATIONS);
    }
}

#[test]
fn test_concurrent_registration() {
    let registry = Arc::new(Registry::new());

    macro_rules! marker_types {
        ($($name:ident),*) => {
            $(struct $name;)*
        };
    }
    marker_types!(A, B, C, D);

    thread::scope(|s| {
        s.spawn(|| registry.register(ClassBuilder::<A>::new("A")).unwrap());
        s.spawn(|| registry.register(ClassBuilder::<B>::new("B")).unwrap());
        s.spawn(|| registry.register(ClassBuilder::<C>::new("C")).unwrap());
        s.spawn(|| registry.register(ClassBuilder::<D>::new("D")).unwrap());
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ITERATIONS {
                    assert!(registry.len() <= 4);
                    let _ = registry.class_from_name("A");
                }
            });
        }
    });

    assert_eq!(registry.len(), 4);
    assert!(registry.class_of::<C>().is_some());
}
