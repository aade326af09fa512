//! Inbound payload normalization.
//!
//! Turns a raw webhook body into a canonical [`OrderRecord`]. Normalization
//! never fails: absent or unreadable fields simply stay empty, and an
//! unparsable `orderData` string degrades to an empty mapping.
//!
//! # Examples
//!
//! ```rust
//! use order_relay_core::order::normalize;
//! use serde_json::json;
//!
//! let order = normalize(&json!({
//!     "email": "a@b.com",
//!     "orderData": "{'OrderId': 42, 'Phone': '555-1234'}"
//! }));
//!
//! assert_eq!(order.order_id.as_deref(), Some("42"));
//! assert_eq!(order.phone.as_deref(), Some("555-1234"));
//! ```

pub mod aliases;
pub mod lenient;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use aliases::{as_text, decimal_at, first_decimal, first_text, text_at};
pub use lenient::{lenient_transform, parse_order_text, OrderDataParseError};

/// How the `orderData` field was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDataSource {
    /// No `orderData` field, or a blank string
    #[default]
    Absent,
    /// A JSON object
    Structured,
    /// A string holding JSON
    JsonString,
    /// A string holding a dict literal
    LenientString,
    /// Present but not readable as a mapping
    Unparsable,
}

/// A postal address. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub lines: Vec<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    fn from_value(value: &Value) -> Option<Self> {
        let lines = [aliases::ADDRESS_LINE1, aliases::ADDRESS_LINE2]
            .iter()
            .filter_map(|keys| text_at(value, keys))
            .collect();

        let address = Self {
            lines,
            city: text_at(value, aliases::CITY),
            region: text_at(value, aliases::REGION),
            postal_code: text_at(value, aliases::POSTAL_CODE),
            country: text_at(value, aliases::COUNTRY),
        };
        (!address.is_empty()).then_some(address)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
            && self.city.is_none()
            && self.region.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }

    /// Comma separated single-line form, skipping missing parts.
    pub fn one_line(&self) -> String {
        self.lines
            .iter()
            .map(String::as_str)
            .chain(
                [&self.city, &self.region, &self.postal_code, &self.country]
                    .into_iter()
                    .filter_map(|part| part.as_deref()),
            )
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One ordered product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub color: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub line_total: Option<Decimal>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub notes: Option<String>,
}

impl LineItem {
    fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Some(Self {
            product_name: text_at(value, aliases::ITEM_PRODUCT_NAME),
            brand: text_at(value, aliases::ITEM_BRAND),
            sku: text_at(value, aliases::ITEM_SKU),
            color: text_at(value, aliases::ITEM_COLOR),
            quantity: decimal_at(value, aliases::ITEM_QUANTITY),
            unit_price: decimal_at(value, aliases::ITEM_UNIT_PRICE),
            line_total: decimal_at(value, aliases::ITEM_LINE_TOTAL),
            image_url: text_at(value, aliases::ITEM_IMAGE_URL),
            product_url: text_at(value, aliases::ITEM_PRODUCT_URL),
            notes: text_at(value, aliases::ITEM_NOTES),
        })
    }
}

/// Canonical order extracted from one webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub total: Option<Decimal>,
    pub currency: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub items: Vec<LineItem>,
    /// The parsed `orderData` mapping, verbatim
    pub raw_payload: Map<String, Value>,
    pub order_data_source: OrderDataSource,
}

/// The webhook body split into its message fields and the order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookEnvelope {
    /// Top-level `subject`
    pub subject: Option<String>,
    /// Top-level `body`, the lead sentence of the message
    pub body: Option<String>,
    pub order: OrderRecord,
}

impl WebhookEnvelope {
    pub fn from_payload(raw_body: &Value) -> Self {
        Self {
            subject: raw_body.get("subject").and_then(as_text),
            body: raw_body.get("body").and_then(as_text),
            order: normalize(raw_body),
        }
    }
}

/// Normalize a raw webhook body into an [`OrderRecord`].
pub fn normalize(raw_body: &Value) -> OrderRecord {
    let (raw_payload, order_data_source) = read_order_data(raw_body.get("orderData"));
    let order = Value::Object(raw_payload);

    let billing_address = aliases::BILLING_ADDRESS
        .iter()
        .filter_map(|key| order.get(key))
        .find_map(Address::from_value)
        .or_else(|| Address::from_value(&order));
    let shipping_address = aliases::SHIPPING_ADDRESS
        .iter()
        .filter_map(|key| order.get(key))
        .find_map(Address::from_value);

    let items = aliases::ITEMS
        .iter()
        .filter_map(|key| order.get(key))
        .find_map(Value::as_array)
        .map(|entries| entries.iter().filter_map(LineItem::from_value).collect())
        .unwrap_or_default();

    let order_id = first_text(aliases::ORDER_ID, raw_body, &order);
    let email = first_text(aliases::EMAIL, raw_body, &order);
    let phone = first_text(aliases::PHONE, raw_body, &order);
    let full_name = full_name(raw_body, &order);
    let total = first_decimal(aliases::TOTAL, raw_body, &order);
    let currency = first_text(aliases::CURRENCY, raw_body, &order);

    let raw_payload = match order {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    OrderRecord {
        order_id,
        email,
        phone,
        full_name,
        total,
        currency,
        billing_address,
        shipping_address,
        items,
        raw_payload,
        order_data_source,
    }
}

fn full_name(body: &Value, order: &Value) -> Option<String> {
    if let Some(name) = first_text(aliases::FULL_NAME, body, order) {
        return Some(name);
    }
    let parts: Vec<String> = [aliases::FIRST_NAME, aliases::LAST_NAME]
        .iter()
        .filter_map(|paths| first_text(paths, body, order))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn read_order_data(value: Option<&Value>) -> (Map<String, Value>, OrderDataSource) {
    match value {
        None | Some(Value::Null) => (Map::new(), OrderDataSource::Absent),
        Some(Value::Object(map)) => (map.clone(), OrderDataSource::Structured),
        Some(Value::String(text)) if text.trim().is_empty() => {
            (Map::new(), OrderDataSource::Absent)
        }
        Some(Value::String(text)) => match parse_order_text(text) {
            Ok((map, OrderDataSource::LenientString)) => {
                warn!("orderData was a dict literal; parsed leniently");
                (map, OrderDataSource::LenientString)
            }
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(error = %error, "Ignoring unreadable orderData");
                (Map::new(), OrderDataSource::Unparsable)
            }
        },
        Some(other) => {
            warn!(
                kind = lenient::kind_of(other),
                "Ignoring orderData that is not an object"
            );
            (Map::new(), OrderDataSource::Unparsable)
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
