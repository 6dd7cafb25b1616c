/// Rendering behaviour of the template language: conditionals, nesting and
/// placeholder preservation across passes.
use paycard_template::{render, DataBag, Template, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn bag(entries: &[(&str, Value)]) -> DataBag {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_empty_bag_preserves_placeholders() {
    let template = "<div class=\"{{theme}}\">{{TITLE}} {{ price }}</div>";
    assert_eq!(render(template, &DataBag::new()), template);
}

#[rstest]
#[case::true_value(bag(&[("a", Value::Bool(true))]), "X")]
#[case::false_value(bag(&[("a", Value::Bool(false))]), "")]
#[case::absent_key(DataBag::new(), "")]
fn test_single_conditional(#[case] data: DataBag, #[case] expected: &str) {
    assert_eq!(render("<% IF(a) %>X<% ENDIF %>", &data), expected);
}

#[rstest]
#[case::both_true(true, true, "123")]
#[case::inner_false(true, false, "13")]
#[case::outer_false(false, true, "")]
fn test_nested_conditionals(#[case] a: bool, #[case] b: bool, #[case] expected: &str) {
    let data = bag(&[("a", Value::Bool(a)), ("b", Value::Bool(b))]);
    assert_eq!(
        render("<% IF(a) %>1<% IF(b) %>2<% ENDIF %>3<% ENDIF %>", &data),
        expected
    );
}

#[test]
fn test_sibling_blocks_inside_outer_block() {
    // A naive "nearest ENDIF" scan would close the outer block too early here
    let template = "<% IF(a) %>[<% IF(b) %>b<% ENDIF %><% IF(c) %>c<% ENDIF %>]<% ENDIF %>";
    let data = bag(&[
        ("a", Value::Bool(true)),
        ("b", Value::Bool(false)),
        ("c", Value::Bool(true)),
    ]);
    assert_eq!(render(template, &data), "[c]");
}

#[test]
fn test_equality_against_array_literal() {
    let template = r#"<% IF(country === ["US", "CA"]) %>zip<% ENDIF %>"#;
    assert_eq!(render(template, &bag(&[("country", Value::from("US"))])), "zip");
    assert_eq!(render(template, &bag(&[("country", Value::from("DE"))])), "");
    assert_eq!(render(template, &DataBag::new()), "");
}

#[test]
fn test_multi_pass_rendering() {
    let first = render(
        "<h1>{{title}}</h1><p>{{price}}</p>",
        &bag(&[("title", Value::from("Pro plan"))]),
    );
    assert_eq!(first, "<h1>Pro plan</h1><p>{{price}}</p>");

    let second = render(&first, &bag(&[("price", Value::from("$9.99"))]));
    assert_eq!(second, "<h1>Pro plan</h1><p>$9.99</p>");
}

#[test]
fn test_rendering_is_idempotent_without_blocks() {
    let data = bag(&[("name", Value::from("Ann")), ("show", Value::Bool(true))]);
    let once = render("<% IF(show) %>{{name}} {{other}}<% ENDIF %>", &data);
    assert_eq!(render(&once, &data), once);
}

#[test]
fn test_parsed_template_renders_many_bags() {
    let template = Template::parse("<% IF(count === 1) %>one<% ENDIF %>{{count}}");
    assert_eq!(template.render(&bag(&[("count", Value::from(1))])), "one1");
    assert_eq!(template.render(&bag(&[("count", Value::from(2))])), "2");
}

#[test]
fn test_malformed_blocks_survive_as_text() {
    assert_eq!(
        render("<% ENDIF %>a<% IF(x) %>b", &bag(&[("x", Value::Bool(true))])),
        "<% ENDIF %>a<% IF(x) %>b"
    );
}
