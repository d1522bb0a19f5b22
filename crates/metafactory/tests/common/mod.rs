// Common test utilities for integration tests
//
// This module provides shared fixtures for use across all integration
// tests: a plain read/write bean, a type with mismatched and private
// accessors, and a two-level hierarchy.

#![allow(dead_code)]

use metafactory::runtime::{Class, ClassBuilder, Lookup, Reflect, Registry};
use std::sync::Arc;

/// Initial value of [`TestPojo::field`].
pub const INITIAL: &str = "_initial";

/// Name of the string property on [`TestPojo`].
pub const FIELD_NAME: &str = "field";

/// A bean with one string property.
#[derive(Debug, Clone)]
pub struct TestPojo {
    field: Arc<str>,
}

impl TestPojo {
    pub fn new(field: &str) -> Self {
        Self {
            field: Arc::from(field),
        }
    }

    pub fn field(&self) -> Arc<str> {
        Arc::clone(&self.field)
    }

    pub fn set_field(&mut self, field: Arc<str>) {
        self.field = field;
    }
}

impl Default for TestPojo {
    fn default() -> Self {
        Self::new(INITIAL)
    }
}

impl Reflect for TestPojo {
    fn class_name() -> &'static str {
        "TestPojo"
    }

    fn reflect(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .getter("getField", TestPojo::field)
            .setter("setField", TestPojo::set_field)
    }
}

/// A type exercising the less common resolution paths.
#[derive(Debug, Default)]
pub struct Account {
    pub active: bool,
    pub count: i32,
    pub secret: i64,
    pub balance: f64,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn set_count(&mut self, count: i64) {
        self.count = i32::try_from(count).unwrap_or(i32::MAX);
    }

    pub fn secret(&self) -> i64 {
        self.secret
    }

    pub fn set_secret(&mut self, secret: i64) {
        self.secret = secret;
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn set_balance(&mut self, balance: f64) {
        self.balance = balance;
    }
}

impl Reflect for Account {
    fn class_name() -> &'static str {
        "Account"
    }

    fn reflect(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .getter("isActive", Account::is_active)
            .setter("setActive", Account::set_active)
            .getter("getCount", Account::count)
            .setter("setCount", Account::set_count)
            .private_getter("getSecret", Account::secret)
            .private_setter("setSecret", Account::set_secret)
            .getter("getBalance", Account::balance)
            .setter("setBalance", Account::set_balance)
    }
}

/// Superclass of [`Dog`].
#[derive(Debug, Clone)]
pub struct Animal {
    pub name: Arc<str>,
}

impl Animal {
    pub fn name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn set_name(&mut self, name: Arc<str>) {
        self.name = name;
    }
}

impl Reflect for Animal {
    fn class_name() -> &'static str {
        "Animal"
    }

    fn reflect(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .getter("getName", Animal::name)
            .setter("setName", Animal::set_name)
    }
}

/// Subclass of [`Animal`], embedding it.
#[derive(Debug, Clone)]
pub struct Dog {
    pub animal: Animal,
    pub good: bool,
}

impl Dog {
    pub fn new(name: &str) -> Self {
        Self {
            animal: Animal {
                name: Arc::from(name),
            },
            good: true,
        }
    }

    pub fn animal(&self) -> &Animal {
        &self.animal
    }

    pub fn animal_mut(&mut self) -> &mut Animal {
        &mut self.animal
    }

    pub fn is_good(&self) -> bool {
        self.good
    }

    pub fn set_good(&mut self, good: bool) {
        self.good = good;
    }
}

impl Reflect for Dog {
    fn class_name() -> &'static str {
        "Dog"
    }

    fn reflect(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .extends(Dog::animal, Dog::animal_mut)
            .getter("isGood", Dog::is_good)
            .setter("setGood", Dog::set_good)
    }
}

/// A registry with every fixture type registered.
pub fn create_test_registry() -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    registry
        .register_type::<TestPojo>()
        .expect("Failed to register TestPojo");
    registry
        .register_type::<Account>()
        .expect("Failed to register Account");
    registry
        .register_type::<Animal>()
        .expect("Failed to register Animal");
    registry
        .register_type::<Dog>()
        .expect("Failed to register Dog");
    registry
}

/// A public lookup over a fresh fixture registry.
pub fn create_test_lookup() -> Lookup {
    Lookup::public(create_test_registry())
}

/// The class registered for `T`.
pub fn class_of<T: 'static>(lookup: &Lookup) -> Class {
    lookup
        .find_class::<T>()
        .expect("Fixture class should be registered")
}
