use super::*;
use serde_json::json;

#[test]
fn resolve_url_joins_with_single_slash() {
    assert_eq!(resolve_url("http://h/api/", "books/"), "http://h/api/books/");
    assert_eq!(resolve_url("http://h/api", "/books/7/"), "http://h/api/books/7/");
    assert_eq!(resolve_url("http://h/api//", "//token/"), "http://h/api/token/");
}

#[test]
fn parse_body_empty_is_null() {
    assert_eq!(parse_body(""), Value::Null);
    assert_eq!(parse_body("  \n"), Value::Null);
}

#[test]
fn parse_body_json() {
    assert_eq!(parse_body(r#"{"access":"t"}"#), json!({ "access": "t" }));
}

#[test]
fn parse_body_non_json_keeps_text() {
    assert_eq!(parse_body("Bad Gateway"), Value::String("Bad Gateway".into()));
}

#[test]
fn new_keeps_configured_base_url() {
    let config = ClientConfig::default().with_api_base_url("http://127.0.0.1:1/api");
    let transport = HttpTransport::new(&config).unwrap();
    assert_eq!(transport.base_url(), "http://127.0.0.1:1/api/");
}
