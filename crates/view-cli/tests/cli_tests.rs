//! Integration tests for the `view` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the filter,
//! encode, decode, merge, negotiate and types subcommands through the actual
//! binary, including stdin/stdout piping, environment fallbacks, file output,
//! and structured error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn schema_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/schema.json")
}

fn product_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/product.json")
}

fn products_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/products.json")
}

/// Helper: `view <subcommand> --schema <fixture> --type Product`, with no
/// groups inherited from the environment.
fn view(subcommand: &str) -> Command {
    let mut cmd = Command::cargo_bin("view").unwrap();
    cmd.env_remove("VIEW_GROUPS")
        .env_remove("VIEW_LOG")
        .args([subcommand, "--schema", schema_path(), "--type", "Product"]);
    cmd
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout must be JSON")
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn filter_read_group() {
    let output = view("filter")
        .args(["--groups", "read", "-i", product_path()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(
        stdout_json(&output),
        serde_json::json!({
            "id": 1,
            "name": "a",
            "vendor": {"name": "acme"},
            "tags": ["new"],
            "created_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-02T12:00:00Z"
        })
    );
}

#[test]
fn filter_groups_from_environment() {
    view("filter")
        .env("VIEW_GROUPS", "write")
        .args(["-i", product_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"price\": 10.5"))
        .stdout(predicate::str::contains("\"id\"").not());
}

#[test]
fn filter_without_groups_keeps_untagged_fields() {
    view("filter")
        .write_stdin(std::fs::read_to_string(product_path()).unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"internal\": \"x\""))
        .stdout(predicate::str::contains("DE00 1234"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn filter_to_output_file() {
    let output_path = std::env::temp_dir().join("view-cli-test-filter-output.json");
    let _ = std::fs::remove_file(&output_path);

    view("filter")
        .args(["--groups", "billing", "-i", product_path(), "-o"])
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(&output_path).expect("output file must exist");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&content).unwrap(),
        serde_json::json!({})
    );
    let _ = std::fs::remove_file(&output_path);
}

// ─────────────────────────────────────────────────────────────────────────────
// Encode subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn encode_defaults_to_json() {
    view("encode")
        .args(["--groups", "read", "-i", product_path(), "--headers"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\"id\":1,\"name\":\"a\""))
        .stderr(predicate::str::contains("Content-Type: application/json"))
        .stderr(predicate::str::contains("Content-Length: "));
}

#[test]
fn encode_list_as_csv() {
    view("encode")
        .args(["--list", "--groups", "read", "--accept", "text/csv, application/json;q=0.5"])
        .args(["-i", products_path()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "id,name,vendor,tags,created_at,updated_at\n",
        ))
        .stdout(predicate::str::contains("\"c, the third\""))
        .stdout(predicate::str::contains("10.5").not());
}

#[test]
fn encode_xml() {
    view("encode")
        .args(["--groups", "read", "--accept", "application/xml", "-i", product_path()])
        .args(["--headers"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<Product>"))
        .stdout(predicate::str::contains("<vendor><name>acme</name></vendor>"))
        .stdout(predicate::str::contains("<tags><item>new</item></tags>"))
        .stdout(predicate::str::contains("price").not())
        .stderr(predicate::str::contains("Content-Type: application/xml"))
        .stderr(predicate::str::contains("Content-Length").not());
}

#[test]
fn encode_not_acceptable() {
    view("encode")
        .args(["--accept", "image/png", "-i", product_path()])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"not_acceptable\""));
}

#[test]
fn encode_single_entity_as_csv_is_unsupported() {
    view("encode")
        .args(["--accept", "text/csv", "-i", product_path()])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"unsupported_format\""));
}

// ─────────────────────────────────────────────────────────────────────────────
// Decode subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn decode_csv_positionally() {
    let output = view("decode")
        .args(["--list", "--content-type", "text/csv; charset=utf-8"])
        .write_stdin("id,name,price\n7,seven,2.5\n8,,\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(
        stdout_json(&output),
        serde_json::json!([{"id": 7, "name": "seven", "price": 2.5}, {"id": 8}])
    );
}

#[test]
fn decode_xml() {
    view("decode")
        .args(["--content-type", "application/xml"])
        .write_stdin("<Product><id>3</id><tags><item>a</item><item>b</item></tags></Product>")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": 3"))
        .stdout(predicate::str::contains("\"b\""));
}

#[test]
fn decode_bad_scalar_is_schema_error() {
    view("decode")
        .args(["--content-type", "application/xml"])
        .write_stdin("<Product><id>three</id></Product>")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"schema_error\""));
}

#[test]
fn decode_json_checks_scalar_types() {
    view("decode")
        .write_stdin(r#"{"id":-3,"tags":["a",1]}"#)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"schema_error\""));
}

// ─────────────────────────────────────────────────────────────────────────────
// Merge subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn merge_partial_update() {
    let output = view("merge")
        .args(["--target", product_path()])
        .write_stdin(r#"{"name":"b","price":0,"created_at":"2030-01-01T00:00:00Z"}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let merged = stdout_json(&output);
    assert_eq!(merged["name"], "b");
    assert_eq!(merged["price"], 10.5);
    assert_eq!(merged["created_at"], "2024-03-01T12:00:00Z");
    assert_eq!(merged["vendor"]["iban"], "DE00 1234");
}

#[test]
fn merge_nested_xml_payload() {
    view("merge")
        .args(["--target", product_path(), "--content-type", "application/xml"])
        .write_stdin("<Product><vendor><name>initech</name></vendor></Product>")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"initech\""))
        .stdout(predicate::str::contains("\"iban\": \"DE00 1234\""));
}

#[test]
fn merge_rejects_mismatched_payload() {
    view("merge")
        .args(["--target", product_path()])
        .write_stdin(r#"{"vendor":"acme"}"#)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"schema_error\""));
}

#[test]
fn merge_rejects_wrong_scalar_type() {
    view("merge")
        .args(["--target", product_path()])
        .write_stdin(r#"{"price":"free","id":-3}"#)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"schema_error\""))
        .stdout(predicate::str::contains("10.5").not());
}

#[test]
fn merge_rejects_unknown_content_type() {
    view("merge")
        .args(["--target", product_path(), "--content-type", "application/msgpack"])
        .write_stdin("")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"unsupported_format\""));
}

// ─────────────────────────────────────────────────────────────────────────────
// Negotiate and types subcommands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn negotiate_prints_format_and_content_type() {
    Command::cargo_bin("view")
        .unwrap()
        .args(["negotiate", "text/csv;q=0.5, application/xml"])
        .assert()
        .success()
        .stdout("xml\tapplication/xml\n");
}

#[test]
fn negotiate_wildcard() {
    Command::cargo_bin("view")
        .unwrap()
        .args(["negotiate", "*/*"])
        .assert()
        .success()
        .stdout("json\tapplication/json\n");
}

#[test]
fn types_lists_schema_names() {
    Command::cargo_bin("view")
        .unwrap()
        .args(["types", "--schema", schema_path()])
        .assert()
        .success()
        .stdout("Audit\nProduct\nVendor\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Error handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unknown_type() {
    Command::cargo_bin("view")
        .unwrap()
        .args(["filter", "--schema", schema_path(), "--type", "Order"])
        .write_stdin("{}")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown type: 'Order'"))
        .stderr(predicate::str::contains("Audit, Product, Vendor"));
}

#[test]
fn missing_input_file() {
    view("filter")
        .args(["-i", "/nonexistent/path/product.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn invalid_schema_document() {
    let schema = std::env::temp_dir().join("view-cli-test-bad-schema.json");
    std::fs::write(&schema, r#"{"types": {"A": {"fields": [{"name": "b", "kind": {"struct": "B"}}]}}}"#)
        .unwrap();

    Command::cargo_bin("view")
        .unwrap()
        .args(["filter", "--type", "A", "--schema"])
        .arg(&schema)
        .write_stdin("{}")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown type 'B'"));
    let _ = std::fs::remove_file(&schema);
}

#[test]
fn invalid_json_input_is_schema_error() {
    view("filter")
        .write_stdin("{not json")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\":\"schema_error\""));
}

#[test]
fn no_subcommand_shows_usage() {
    Command::cargo_bin("view")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
