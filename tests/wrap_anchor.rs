//! Line wrapping and anchoring of multi-valued expressions

use pretty_assertions::assert_eq;
use textplate::{format, Locale, RenderConfig, Template, TemplateGroup, Value};

fn numbers() -> Value {
    Value::list([3, 9, 20, 2, 1, 4, 6, 32, 5, 6, 77, 888, 2, 1, 6, 32, 5, 6, 77, 4, 9, 20, 2, 1, 4])
}

fn rendered_numbers() -> Vec<String> {
    numbers()
        .as_list()
        .unwrap_or_default()
        .iter()
        .map(|v| v.to_string())
        .collect()
}

#[test]
fn test_array_initializer_snapshot() {
    let out = format(
        40,
        "int <%1>[] = { <%2; wrap, anchor, separator=\", \"> };",
        [Value::from("a"), numbers()],
    )
    .unwrap();
    insta::assert_snapshot!("array_initializer", out);
}

#[test]
fn test_lines_never_exceed_width() {
    for width in 20..=60 {
        let mut t = Template::new("{ <xs; wrap, anchor, separator=\", \">").unwrap();
        t.add("xs", numbers()).unwrap();
        let out = t
            .render_with(&RenderConfig::new().with_line_width(width))
            .unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.len() > 1 || width >= out.chars().count());
        for line in &lines {
            assert!(
                line.chars().count() <= width,
                "width {}: line {:?} is too long",
                width,
                line
            );
        }
        for line in &lines[1..] {
            assert!(line.starts_with("  "), "width {}: {:?} is not anchored", width, line);
            assert_ne!(line.chars().nth(2), Some(' '));
        }

        let elements: Vec<String> = out
            .split(|c| c == ',' || c == '\n' || c == '{')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        assert_eq!(elements, rendered_numbers(), "width {}", width);
    }
}

#[test]
fn test_anchor_column_follows_expression_start() {
    let mut t = Template::new("prefix text: <xs; wrap=24, anchor, separator=\" \">").unwrap();
    t.add("xs", Value::list(["aaaa", "bbbb", "cccc", "dddd"])).unwrap();
    assert_eq!(
        t.render().unwrap(),
        "prefix text: aaaa bbbb\n             cccc dddd"
    );
}

#[test]
fn test_wrap_without_anchor_returns_to_indent() {
    let mut t = Template::new("    <xs; wrap=14, separator=\", \">").unwrap();
    t.add("xs", Value::list(["one", "two", "three", "four"])).unwrap();
    assert_eq!(t.render().unwrap(), "    one, two,\n    three,\n    four");
}

#[test]
fn test_explicit_width_beats_line_width() {
    let mut t = Template::new("<xs; wrap=5, separator=\" \">").unwrap();
    t.add("xs", Value::list(["ab", "cd", "ef"])).unwrap();
    let config = RenderConfig::new().with_line_width(80);
    assert_eq!(t.render_with(&config).unwrap(), "ab cd\nef");
}

#[test]
fn test_wrap_measures_rendered_width() {
    let group = TemplateGroup::new().with_standard_renderers();
    let mut t = group
        .inline("<xs; wrap=16, separator=\" \", format=\"%,d\">")
        .unwrap();
    t.add("xs", Value::list([1000000, 2000000, 3])).unwrap();

    let out = t.render_locale(&Locale::root()).unwrap();
    assert_eq!(out, "1,000,000\n2,000,000 3");
}

#[test]
fn test_mapped_elements_wrap_as_units() {
    let mut t = Template::new("<xs:{x | [<x>]}; wrap=10, separator=\" \">").unwrap();
    t.add("xs", Value::list(["a", "bb", "ccc", "d"])).unwrap();
    assert_eq!(t.render().unwrap(), "[a] [bb]\n[ccc] [d]");
}

#[test]
fn test_wrap_inside_included_template_uses_output_column() {
    let group = TemplateGroup::from_source(
        r#"
outer(xs) ::= "int a[] = { <inner(xs)> };"
inner(xs) ::= "<xs; wrap=20, anchor, separator=\", \">"
"#,
    )
    .unwrap();
    let mut t = group.instance_of("outer").unwrap();
    t.add("xs", Value::list([3, 9, 20, 2, 1, 4, 6, 32, 5, 6, 77, 888]))
        .unwrap();

    let out = t.render().unwrap();
    assert_eq!(
        out,
        "int a[] = { 3, 9,\n            20, 2,\n            1, 4, 6,\n            32, 5,\n            6, 77,\n            888 };"
    );
    for line in out.lines() {
        assert!(line.chars().count() <= 20, "line {:?} is too long", line);
    }
}

#[test]
fn test_wrap_inside_sub_template_uses_output_column() {
    let mut t = Template::new("xs = <rows:{r | <r; wrap=16, anchor, separator=\" \">}>").unwrap();
    t.add(
        "rows",
        Value::list([Value::list(["aaaa", "bbbb", "cccc", "dddd"])]),
    )
    .unwrap();
    assert_eq!(t.render().unwrap(), "xs = aaaa bbbb\n     cccc dddd");
}
