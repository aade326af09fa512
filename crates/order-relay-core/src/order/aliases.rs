//! Alias tables for order fields.
//!
//! Webhook senders disagree on key names (`Email` vs `email`, `OrderId` vs
//! `orderId` and so on). Each canonical field is described by an ordered list
//! of paths; the first path that yields a usable value wins.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Document a path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// The whole webhook body
    Body,
    /// The parsed `orderData` mapping
    Order,
}

/// A dotted path rooted at the body or at `orderData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub root: Root,
    pub segments: &'static [&'static str],
}

const fn body(segments: &'static [&'static str]) -> FieldPath {
    FieldPath {
        root: Root::Body,
        segments,
    }
}

const fn order(segments: &'static [&'static str]) -> FieldPath {
    FieldPath {
        root: Root::Order,
        segments,
    }
}

pub const EMAIL: &[FieldPath] = &[
    body(&["email"]),
    order(&["Email"]),
    order(&["email"]),
    order(&["BillingAddress", "Email"]),
    order(&["ShippingAddress", "Email"]),
];

pub const ORDER_ID: &[FieldPath] = &[
    order(&["OrderId"]),
    order(&["orderId"]),
    order(&["order_id"]),
    order(&["OrderID"]),
    body(&["orderId"]),
];

pub const PHONE: &[FieldPath] = &[
    order(&["Phone"]),
    order(&["phone"]),
    order(&["BillingAddress", "Phone"]),
    order(&["ShippingAddress", "Phone"]),
    body(&["phone"]),
];

pub const FULL_NAME: &[FieldPath] = &[
    order(&["FullName"]),
    order(&["fullName"]),
    order(&["full_name"]),
    order(&["Name"]),
];

pub const FIRST_NAME: &[FieldPath] = &[
    order(&["BillingAddress", "FirstName"]),
    order(&["FirstName"]),
    order(&["firstName"]),
];

pub const LAST_NAME: &[FieldPath] = &[
    order(&["BillingAddress", "LastName"]),
    order(&["LastName"]),
    order(&["lastName"]),
];

pub const TOTAL: &[FieldPath] = &[
    order(&["total"]),
    order(&["Total"]),
    order(&["value"]),
    order(&["Value"]),
];

pub const CURRENCY: &[FieldPath] = &[
    order(&["currency"]),
    order(&["Currency"]),
    order(&["value_currency"]),
];

pub const BILLING_ADDRESS: &[&str] = &["BillingAddress", "billingAddress", "billing_address"];
pub const SHIPPING_ADDRESS: &[&str] = &["ShippingAddress", "shippingAddress", "shipping_address"];
pub const ITEMS: &[&str] = &["Items", "items", "LineItems", "line_items"];

// Keys looked up inside an address object, or flat on `orderData`.
pub const ADDRESS_LINE1: &[&str] = &["Address1", "address1"];
pub const ADDRESS_LINE2: &[&str] = &["Address2", "address2"];
pub const CITY: &[&str] = &["City", "city"];
pub const REGION: &[&str] = &["Region", "region", "Province", "State", "state"];
pub const POSTAL_CODE: &[&str] = &["Zip", "zip", "PostalCode", "postal_code"];
pub const COUNTRY: &[&str] = &["Country", "country", "CountryCode"];

// Keys looked up inside a line item object.
pub const ITEM_PRODUCT_NAME: &[&str] = &["ProductName", "productName", "product_name", "Name", "name", "Title"];
pub const ITEM_BRAND: &[&str] = &["Brand", "brand", "Vendor"];
pub const ITEM_SKU: &[&str] = &["SKU", "Sku", "sku"];
pub const ITEM_COLOR: &[&str] = &["Color", "color", "Colour"];
pub const ITEM_QUANTITY: &[&str] = &["Quantity", "quantity", "qty"];
pub const ITEM_UNIT_PRICE: &[&str] = &["ItemPrice", "UnitPrice", "unit_price", "Price", "price"];
pub const ITEM_LINE_TOTAL: &[&str] = &["RowTotal", "LineTotal", "line_total", "Total", "total"];
pub const ITEM_IMAGE_URL: &[&str] = &["ImageURL", "ImageUrl", "imageUrl", "image_url"];
pub const ITEM_PRODUCT_URL: &[&str] = &["ProductURL", "ProductUrl", "productUrl", "product_url", "url"];
pub const ITEM_NOTES: &[&str] = &["Notes", "notes"];

/// Resolve a path of object keys against a JSON value.
pub fn resolve_json_path<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(value, |current, key| current.get(key))
}

/// First path whose value coerces to non-blank text.
pub fn first_text(paths: &[FieldPath], body: &Value, order: &Value) -> Option<String> {
    paths
        .iter()
        .filter_map(|p| resolve(p, body, order))
        .find_map(as_text)
}

/// First path whose value coerces to a decimal.
pub fn first_decimal(paths: &[FieldPath], body: &Value, order: &Value) -> Option<Decimal> {
    paths
        .iter()
        .filter_map(|p| resolve(p, body, order))
        .find_map(as_decimal)
}

/// First key of `keys` on `object` whose value coerces to non-blank text.
pub fn text_at(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| object.get(k)).find_map(as_text)
}

/// First key of `keys` on `object` whose value coerces to a decimal.
pub fn decimal_at(object: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().filter_map(|k| object.get(k)).find_map(as_decimal)
}

fn resolve<'a>(path: &FieldPath, body: &'a Value, order: &'a Value) -> Option<&'a Value> {
    let root = match path.root {
        Root::Body => body,
        Root::Order => order,
    };
    resolve_json_path(root, path.segments)
}

/// Coerce a scalar to trimmed text. Blank strings count as absent.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a number or numeric string to a decimal.
///
/// Strings may carry a leading currency symbol and thousands separators.
pub fn as_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s
            .trim()
            .trim_start_matches(['$', '€', '£'])
            .replace(',', ""),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
#[path = "aliases_tests.rs"]
mod tests;
