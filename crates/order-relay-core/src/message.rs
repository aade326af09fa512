//! Message rendering for CRM records.
//!
//! Produces the subject, HTML body and plain-text body of an EmailMessage,
//! and the plain-text description of a Task.

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;
use tera::{Context, Tera};

use crate::order::{LineItem, OrderRecord, WebhookEnvelope};
use crate::RelayError;

const EMAIL_TEMPLATE_NAME: &str = "order_email.html";
const EMAIL_TEMPLATE: &str = include_str!("../templates/order_email.html");

/// Rendered message content for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    /// Lead sentence: the inbound `body`, or the configured default
    pub lead: String,
    pub body_html: String,
    pub body_text: String,
}

#[derive(Serialize)]
struct EmailView<'a> {
    lead: &'a str,
    order_id: Option<&'a str>,
    customer_name: Option<&'a str>,
    email: Option<&'a str>,
    phone: Option<&'a str>,
    total: Option<Decimal>,
    currency: Option<&'a str>,
    billing_address: Option<String>,
    shipping_address: Option<String>,
    items: &'a [LineItem],
}

/// Renders messages from normalized orders.
///
/// Holds the compiled template; build once and share.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    tera: Tera,
    default_lead: String,
}

impl MessageRenderer {
    /// Compile the message template.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Template` if the template does not compile.
    pub fn new(default_lead: impl Into<String>) -> Result<Self, RelayError> {
        let mut tera = Tera::default();
        tera.register_filter("money", money_filter);
        tera.add_raw_template(EMAIL_TEMPLATE_NAME, EMAIL_TEMPLATE)?;

        Ok(Self {
            tera,
            default_lead: default_lead.into(),
        })
    }

    /// Render the message for a delivery.
    pub fn render(&self, envelope: &WebhookEnvelope) -> Result<RenderedMessage, RelayError> {
        let order = &envelope.order;
        let lead = envelope
            .body
            .clone()
            .unwrap_or_else(|| self.default_lead.clone());

        let view = EmailView {
            lead: &lead,
            order_id: order.order_id.as_deref(),
            customer_name: order.full_name.as_deref(),
            email: order.email.as_deref(),
            phone: order.phone.as_deref(),
            total: order.total,
            currency: order.currency.as_deref(),
            billing_address: order.billing_address.as_ref().map(|a| a.one_line()),
            shipping_address: order.shipping_address.as_ref().map(|a| a.one_line()),
            items: &order.items,
        };

        let context = Context::from_serialize(&view)?;
        let body_html = self.tera.render(EMAIL_TEMPLATE_NAME, &context)?;
        let body_text = html_to_text(&body_html);

        Ok(RenderedMessage {
            subject: subject_for(envelope),
            lead,
            body_html,
            body_text,
        })
    }
}

/// Subject line: inbound subject, else the order number, else a generic one.
pub fn subject_for(envelope: &WebhookEnvelope) -> String {
    if let Some(subject) = &envelope.subject {
        return subject.clone();
    }
    match &envelope.order.order_id {
        Some(id) => format!("Order #{id}"),
        None => "New order".to_string(),
    }
}

/// Plain-text Task description: summary lines followed by the raw payload.
pub fn task_description(order: &OrderRecord, lead: &str) -> String {
    let mut lines = vec![
        format!("Order: #{}", order.order_id.as_deref().unwrap_or("N/A")),
        lead.to_string(),
        String::new(),
    ];

    let mut details = Vec::new();
    if let Some(email) = &order.email {
        details.push(format!("Customer Email: {email}"));
    }
    if let Some(phone) = &order.phone {
        details.push(format!("Customer Phone: {phone}"));
    }
    if let Some(name) = &order.full_name {
        details.push(format!("Customer: {name}"));
    }
    if let Some(total) = &order.total {
        match &order.currency {
            Some(currency) => details.push(format!("Total: {total} {currency}")),
            None => details.push(format!("Total: {total}")),
        }
    }
    if let Some(address) = &order.billing_address {
        details.push(format!("Address: {}", address.one_line()));
    }
    if let Some(address) = &order.shipping_address {
        if order.billing_address.as_ref() != Some(address) {
            details.push(format!("Shipping Address: {}", address.one_line()));
        }
    }
    if !details.is_empty() {
        lines.extend(details);
        lines.push(String::new());
    }

    let raw = Value::Object(order.raw_payload.clone());
    lines.push("Raw Order Data:".to_string());
    lines.push(serde_json::to_string_pretty(&raw).unwrap_or_else(|_| raw.to_string()));
    lines.join("\n")
}

struct HtmlPatterns {
    source_newline: Regex,
    line_break: Regex,
    block_end: Regex,
    paragraph_end: Regex,
    cell_end: Regex,
    tag: Regex,
    numeric_entity: Regex,
}

fn html_patterns() -> Option<&'static HtmlPatterns> {
    static PATTERNS: OnceLock<Option<HtmlPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(HtmlPatterns {
                source_newline: Regex::new(r"[ \t]*\r?\n\s*").ok()?,
                line_break: Regex::new(r"(?i)<br\s*/?>").ok()?,
                block_end: Regex::new(r"(?i)</(div|tr|li|h[1-6])\s*>").ok()?,
                paragraph_end: Regex::new(r"(?i)</(p|table)\s*>").ok()?,
                cell_end: Regex::new(r"(?i)</t[dh]\s*>[ \t]*").ok()?,
                tag: Regex::new(r"<[^>]*>").ok()?,
                numeric_entity: Regex::new(r"&#([xX][0-9a-fA-F]+|[0-9]+);").ok()?,
            })
        })
        .as_ref()
}

/// Convert rendered HTML into readable plain text.
///
/// Line breaks and closing block tags become newlines, table cells are tab
/// separated, other tags are dropped and entities decoded. Runs of blank
/// lines collapse to one.
pub fn html_to_text(html: &str) -> String {
    let Some(p) = html_patterns() else {
        return html.trim().to_string();
    };

    let text = p.source_newline.replace_all(html, " ");
    let text = p.line_break.replace_all(&text, "\n");
    let text = p.block_end.replace_all(&text, "\n");
    let text = p.paragraph_end.replace_all(&text, "\n\n");
    let text = p.cell_end.replace_all(&text, "\t");
    let text = p.tag.replace_all(&text, "");
    let text = decode_entities(&text, &p.numeric_entity);

    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn decode_entities(text: &str, numeric_entity: &Regex) -> String {
    let decoded = numeric_entity.replace_all(text, |caps: &regex::Captures<'_>| {
        let code = &caps[1];
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Format a number or numeric string with two decimals.
fn money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::String(s) => Decimal::from_str(s).ok(),
        tera::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
    .ok_or_else(|| tera::Error::msg("money filter expects a number"))?;

    Ok(tera::Value::String(format!("{:.2}", amount.round_dp(2))))
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
