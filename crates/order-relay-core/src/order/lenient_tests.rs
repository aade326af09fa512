use super::*;
use serde_json::json;

#[test]
fn test_strict_json_string() {
    let (map, source) = parse_order_text(r#"{"OrderId": 7, "Email": "j@example.com"}"#).unwrap();

    assert_eq!(source, OrderDataSource::JsonString);
    assert_eq!(map["OrderId"], json!(7));
}

#[test]
fn test_dict_literal_string() {
    let (map, source) = parse_order_text("{'OrderId': 42, 'Phone': '555-1234'}").unwrap();

    assert_eq!(source, OrderDataSource::LenientString);
    assert_eq!(map["OrderId"], json!(42));
    assert_eq!(map["Phone"], json!("555-1234"));
}

#[test]
fn test_dict_literal_constants() {
    let (map, _) =
        parse_order_text("{'Paid': True, 'Gift': False, 'Coupon': None, 'Flags': [True, None]}")
            .unwrap();

    assert_eq!(map["Paid"], json!(true));
    assert_eq!(map["Gift"], json!(false));
    assert_eq!(map["Coupon"], json!(null));
    assert_eq!(map["Flags"], json!([true, null]));
}

/// Constants are only rewritten in value position.
#[test]
fn test_transform_leaves_words_inside_values() {
    let rewritten = lenient_transform("{'Brand': 'None Such', 'ok': True}");
    assert_eq!(rewritten, r#"{"Brand": "None Such", "ok": true}"#);
}

#[test]
fn test_garbage_is_unparsable() {
    let result = parse_order_text("this is not an order");
    assert!(matches!(result, Err(OrderDataParseError::Unparsable { .. })));
}

#[test]
fn test_non_object_is_rejected() {
    assert_eq!(
        parse_order_text("[1, 2, 3]"),
        Err(OrderDataParseError::NotAnObject { kind: "an array" })
    );
    assert_eq!(
        parse_order_text("42"),
        Err(OrderDataParseError::NotAnObject { kind: "a number" })
    );
}
