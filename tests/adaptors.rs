//! Property resolution through model adaptors

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use textplate::{Error, Model, ModelAdaptor, ObjectModelAdaptor, Result, TemplateGroup, TypeKey, Value};

#[derive(Debug)]
struct Employee {
    id: i64,
    name: String,
    salary: i64,
    manager: bool,
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Model for Employee {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            _ => None,
        }
    }

    fn accessor(&self, name: &str) -> Option<Value> {
        match name {
            "get_name" => Some(self.name.clone().into()),
            "is_manager" => Some(self.manager.into()),
            _ => None,
        }
    }
}

fn employee() -> Value {
    Value::object(Employee {
        id: 7,
        name: "ada".to_string(),
        salary: 100,
        manager: true,
    })
}

/// Marker type adaptors can be registered under
enum Staff {}

#[derive(Debug)]
struct Contractor {
    name: String,
}

impl fmt::Display for Contractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Model for Contractor {
    fn supertypes(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Staff>()]
    }
}

/// Reads the private salary, forwards everything else, and counts calls
struct CountingAdaptor {
    calls: Arc<AtomicUsize>,
}

impl ModelAdaptor for CountingAdaptor {
    fn get_property(&self, value: &Value, property: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (value.downcast_ref::<Employee>(), property) {
            (Some(employee), "salary") => Ok(employee.salary.into()),
            _ => ObjectModelAdaptor.get_property(value, property),
        }
    }
}

struct Badge;

impl ModelAdaptor for Badge {
    fn get_property(&self, value: &Value, property: &str) -> Result<Value> {
        Ok(format!("{}#{}", value, property).into())
    }
}

#[test]
fn test_field_and_accessor_without_custom_adaptor() {
    let group = TemplateGroup::new();
    let mut t = group.inline("<e.id> <e.name> <e.manager>").unwrap();
    t.add("e", employee()).unwrap();
    assert_eq!(t.render().unwrap(), "7 ada true");
}

#[test]
fn test_private_field_needs_custom_adaptor() {
    let group = TemplateGroup::new();
    let mut t = group.inline("<e.salary>").unwrap();
    t.add("e", employee()).unwrap();
    match t.render() {
        Err(Error::NoSuchProperty {
            owner_type,
            property,
        }) => {
            assert_eq!(owner_type, "Employee");
            assert_eq!(property, "salary");
        }
        other => panic!("Expected NoSuchProperty, got {:?}", other),
    }
}

#[test]
fn test_custom_adaptor_intercepts_every_access() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut group = TemplateGroup::new();
    group.register_model_adaptor::<Employee>(CountingAdaptor {
        calls: Arc::clone(&calls),
    });

    let mut t = group.inline("<e.id>/<e.name>/<e.salary>").unwrap();
    t.add("e", employee()).unwrap();
    assert_eq!(t.render().unwrap(), "7/ada/100");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_adaptor_found_through_supertype() {
    let mut group = TemplateGroup::new();
    group.register_model_adaptor::<Staff>(Badge);

    let mut t = group.inline("<c.anything>").unwrap();
    t.add(
        "c",
        Value::object(Contractor {
            name: "bob".to_string(),
        }),
    )
    .unwrap();
    assert_eq!(t.render().unwrap(), "bob#anything");
}

#[test]
fn test_exact_type_beats_supertype() {
    struct Exact;

    impl ModelAdaptor for Exact {
        fn get_property(&self, _value: &Value, _property: &str) -> Result<Value> {
            Ok("exact".into())
        }
    }

    let mut group = TemplateGroup::new();
    group.register_model_adaptor::<Staff>(Badge);
    group.register_model_adaptor::<Contractor>(Exact);

    let mut t = group.inline("<c.x>").unwrap();
    t.add(
        "c",
        Value::object(Contractor {
            name: "bob".to_string(),
        }),
    )
    .unwrap();
    assert_eq!(t.render().unwrap(), "exact");
}

#[test]
fn test_path_through_list_of_objects() {
    let group = TemplateGroup::new();
    let mut t = group.inline("<staff.name; separator=\", \">").unwrap();
    t.add("staff", employee()).unwrap();
    t.add(
        "staff",
        Value::object(Employee {
            id: 8,
            name: "grace".to_string(),
            salary: 1,
            manager: false,
        }),
    )
    .unwrap();
    assert_eq!(t.render().unwrap(), "ada, grace");
}

#[test]
fn test_missing_aggregate_field() {
    let group = TemplateGroup::new();
    let mut t = group.inline("<items:{it | <it.nope>}>").unwrap();
    t.add_aggregate("items.{a}", [1]).unwrap();
    match t.render() {
        Err(Error::NoSuchProperty { property, .. }) => assert_eq!(property, "nope"),
        other => panic!("Expected NoSuchProperty, got {:?}", other),
    }
}
