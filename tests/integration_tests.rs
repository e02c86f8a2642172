//! End-to-end rendering scenarios

use std::fmt;
use std::path::Path;

use pretty_assertions::assert_eq;
use textplate::{
    Aggregate, Error, Locale, Model, ModelAdaptor, NumberRenderer, ObjectModelAdaptor, Result,
    Template, TemplateGroup, Value,
};

#[derive(Debug)]
struct User {
    id: i64,
    name: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User object with id:{}", self.id)
    }
}

impl Model for User {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            _ => None,
        }
    }

    fn accessor(&self, name: &str) -> Option<Value> {
        match name {
            "get_name" => Some(self.name.clone().into()),
            _ => None,
        }
    }
}

/// Serves `name` capitalized; everything else goes to the object adaptor
struct UserAdaptor;

impl ModelAdaptor for UserAdaptor {
    fn get_property(&self, value: &Value, property: &str) -> Result<Value> {
        match (value.downcast_ref::<User>(), property) {
            (Some(user), "name") => {
                let mut chars = user.name.chars();
                let capitalized: String = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                };
                Ok(capitalized.into())
            }
            _ => ObjectModelAdaptor.get_property(value, property),
        }
    }
}

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_hello_world() {
    let mut hello = Template::new("Hello, <name>").unwrap();
    hello.add("name", "World").unwrap();
    assert_eq!(hello.render().unwrap(), "Hello, World");
}

#[test]
fn test_group_file_declaration() {
    let group = TemplateGroup::from_file(fixture("test.stg")).unwrap();
    let mut decl = group.instance_of("decl").unwrap();
    decl.add("type", "int").unwrap();
    decl.add("name", "x").unwrap();
    decl.add("value", 0).unwrap();
    assert_eq!(decl.render().unwrap(), "int x = 0;");
}

#[test]
fn test_object_properties_with_dollar_delimiters() {
    let mut t = Template::with_delimiters("<b>$u.id$</b>: $u.name$", '$', '$').unwrap();
    t.add(
        "u",
        Value::object(User {
            id: 999,
            name: "parrt".to_string(),
        }),
    )
    .unwrap();
    assert_eq!(t.render().unwrap(), "<b>999</b>: parrt");
}

#[test]
fn test_aggregates() {
    let mut t = Template::new("<items:{it | <it.id>: <it.lastName>, <it.firstName><\\n>}>")
        .unwrap();
    t.add_aggregate("items.{ firstName ,lastName, id }", ["Ter", "Parr", "99"])
        .unwrap();
    t.add_aggregate("items.{firstName, lastName ,id}", ["Tom", "Burns", "34"])
        .unwrap();
    assert_eq!(t.render().unwrap(), "99: Parr, Ter\n34: Burns, Tom\n");
}

#[test]
fn test_aggregate_arity_mismatch() {
    let mut t = Template::new("<items>").unwrap();
    let err = t.add_aggregate("items.{a, b, c}", [1, 2]).unwrap_err();
    assert!(matches!(
        err,
        Error::AggregateArity {
            expected: 3,
            actual: 2
        }
    ));
    assert!(t.attribute("items").is_none());
}

#[test]
fn test_custom_adaptor() {
    let mut group = TemplateGroup::new();
    group.register_model_adaptor::<User>(UserAdaptor);

    let mut t = group.inline("<u.id>: <u.name> (<u>)").unwrap();
    t.add(
        "u",
        Value::object(User {
            id: 100,
            name: "parrt".to_string(),
        }),
    )
    .unwrap();
    assert_eq!(
        t.render().unwrap(),
        "100: Parrt (User object with id:100)"
    );
}

#[test]
fn test_locale_number_renderer() {
    let mut group = TemplateGroup::new();
    group.register_renderer::<textplate::model::Number>(NumberRenderer);

    let mut t = group
        .inline(" <x; format=\"%,d\"> <y; format=\"%,2.3f\"> ")
        .unwrap();
    t.add("x", -2100).unwrap();
    t.add("y", 3.14159).unwrap();

    assert_eq!(t.render_locale(&Locale::new("pl")).unwrap(), " -2 100 3,142 ");
    assert_eq!(t.render().unwrap(), " -2,100 3.142 ");
}

#[test]
fn test_region_override_from_layered_group_file() {
    let mut group = TemplateGroup::from_file(fixture("test.stg")).unwrap();

    let render = |group: &TemplateGroup| {
        let mut method = group.instance_of("method").unwrap();
        method.add("name", "foo").unwrap();
        method.add("statements", "i = 1;").unwrap();
        method.add("statements", "j = 2;").unwrap();
        method.render().unwrap()
    };

    assert_eq!(
        render(&group),
        "void foo() {\n    // no preamble\n    i = 1;\n    j = 2;\n}"
    );

    group.load_file(fixture("Dbg.stg")).unwrap();
    assert_eq!(
        render(&group),
        "void foo() {\n    System.out.println(\"enter foo\");\n    i = 1;\n    j = 2;\n}"
    );
}

#[test]
fn test_list_of_aggregates_values() {
    let mut t = Template::new("<rows:{r | <r.a>=<r.b>}; separator=\", \">").unwrap();
    t.add("rows", Aggregate::new().with_field("a", 1).with_field("b", "x"))
        .unwrap();
    t.add("rows", Aggregate::new().with_field("a", 2).with_field("b", "y"))
        .unwrap();
    assert_eq!(t.render().unwrap(), "1=x, 2=y");
}

#[test]
fn test_syntax_error_reports_position() {
    let err = Template::new("abc <name").unwrap_err();
    let errors = err.syntax_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line_col("abc <name"), (1, 5));
    let report = errors[0].format("abc <name", "inline.st");
    assert!(report.contains("unterminated expression"));
}

#[test]
fn test_unknown_option_is_syntax_error() {
    let err = Template::new("<x; colour=\"red\">").unwrap_err();
    assert!(err.syntax_errors()[0].message().contains("unknown option"));
}
