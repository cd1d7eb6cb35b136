use view_core::negotiate::{from_content_type, preferences};
use view_core::{resolve, ErrorCode, Format, ViewError};

// ============================================================================
// Accept header resolution
// ============================================================================

#[test]
fn browser_accept_header_prefers_xml() {
    let accept = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
    // `application/xhtml+xml` (q=1) maps to XML by keyword.
    assert_eq!(resolve(accept).unwrap(), Format::Xml);
}

#[test]
fn curl_default_is_json() {
    assert_eq!(resolve("*/*").unwrap(), Format::Json);
}

#[test]
fn missing_header_is_json() {
    assert_eq!(resolve("").unwrap(), Format::Json);
    assert_eq!(resolve("   ").unwrap(), Format::Json);
}

#[test]
fn weights_order_candidates() {
    assert_eq!(
        resolve("application/json;q=0.2, text/csv;q=0.7, application/xml;q=0.5").unwrap(),
        Format::Csv
    );
}

#[test]
fn equal_weights_break_ties_by_media_type() {
    // "application/xml" < "text/csv", regardless of header order.
    assert_eq!(resolve("text/csv, application/xml").unwrap(), Format::Xml);
    assert_eq!(resolve("application/xml, text/csv").unwrap(), Format::Xml);
}

#[test]
fn linked_data_json() {
    assert_eq!(resolve("application/ld+json").unwrap(), Format::JsonLd);
    assert_eq!(
        resolve("application/ld+json;q=0.1, application/json").unwrap(),
        Format::Json
    );
}

#[test]
fn vendor_json_types_map_to_json() {
    assert_eq!(resolve("application/vnd.api+json").unwrap(), Format::Json);
}

#[test]
fn unusable_header_is_not_acceptable() {
    let err = resolve("image/png, text/html;q=0.9").unwrap_err();
    assert!(matches!(err, ViewError::NotAcceptable(_)));
    assert_eq!(err.code(), ErrorCode::NotAcceptable);
}

#[test]
fn resolution_is_repeatable() {
    let accept = "text/csv;q=0.5, application/xml;q=0.5, application/json;q=0.5";
    let first = resolve(accept).unwrap();
    for _ in 0..10 {
        assert_eq!(resolve(accept).unwrap(), first);
    }
    assert_eq!(first, Format::Json);
}

// ============================================================================
// Preferences
// ============================================================================

#[test]
fn preferences_are_sorted() {
    let ranges = preferences("text/csv;q=0.3, application/xml, application/json;q=0.3");
    let order: Vec<(&str, f32)> = ranges
        .iter()
        .map(|r| (r.media_type.as_str(), r.weight))
        .collect();
    assert_eq!(
        order,
        [
            ("application/xml", 1.0),
            ("application/json", 0.3),
            ("text/csv", 0.3)
        ]
    );
}

#[test]
fn garbage_weight_counts_as_one() {
    let ranges = preferences("text/csv;q=high, application/xml;q=0.9");
    assert_eq!(ranges[0].media_type, "text/csv");
    assert_eq!(ranges[0].weight, 1.0);
}

// ============================================================================
// Content-Type
// ============================================================================

#[test]
fn content_type_selects_decoder() {
    assert_eq!(from_content_type("application/json; charset=utf-8").unwrap(), Format::Json);
    assert_eq!(from_content_type("text/xml").unwrap(), Format::Xml);
    assert_eq!(from_content_type("text/csv").unwrap(), Format::Csv);
    assert_eq!(from_content_type("").unwrap(), Format::Json);
}

#[test]
fn unknown_content_type_is_unsupported() {
    let err = from_content_type("application/msgpack").unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnsupportedFormat);
}

#[test]
fn formats_parse_from_names_and_media_types() {
    for format in Format::ALL {
        assert_eq!(format.name().parse::<Format>().unwrap(), format);
        assert_eq!(format.content_type().parse::<Format>().unwrap(), format);
    }
    assert!("yaml".parse::<Format>().is_err());
}
