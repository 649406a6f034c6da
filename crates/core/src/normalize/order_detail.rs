//! Order-detail reconciliation.
//!
//! The three detail endpoints disagree on shape: a detail envelope (`details` list, or
//! `orderDetails` next to an explicit `customerName`), the order resource itself (`orderDetails`
//! list), or a bare list of lines. All of them become one [`OrderDetailView`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::order::{OrderDetailView, OrderLine};
use crate::domain::product::UNKNOWN_PRODUCT_NAME;
use crate::domain::timestamp::parse_timestamp;
use crate::normalize::fields::{as_decimal, as_i64, as_u32, lookup, text_at};
use crate::pricing;

pub const PLACEHOLDER_CUSTOMER_NAME: &str = "Customer";
pub const MISSING_ORDER_CUSTOMER_NAME: &str = "Customer not found";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetailShape<'a> {
    DetailEnvelope { header: &'a Map<String, Value>, lines: &'a [Value] },
    OrderResource { header: &'a Map<String, Value>, lines: &'a [Value] },
    LineItemList(&'a [Value]),
    Unrecognized,
}

impl DetailShape<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DetailEnvelope { .. } => "detail_envelope",
            Self::OrderResource { .. } => "order_resource",
            Self::LineItemList(_) => "line_item_list",
            Self::Unrecognized => "unrecognized",
        }
    }
}

pub fn classify_detail(raw: &Value) -> DetailShape<'_> {
    let header = match raw {
        Value::Array(lines) => return DetailShape::LineItemList(lines),
        Value::Object(header) => header,
        _ => return DetailShape::Unrecognized,
    };

    let order_details = header.get("orderDetails").and_then(Value::as_array);

    if let Some(lines) = header.get("details").and_then(Value::as_array) {
        return DetailShape::DetailEnvelope { header, lines };
    }
    if let Some(lines) = order_details {
        if text_at(header, &["customerName"]).is_some() {
            return DetailShape::DetailEnvelope { header, lines };
        }
        return DetailShape::OrderResource { header, lines };
    }

    DetailShape::Unrecognized
}

pub fn reconcile(raw: &Value, requested_order_id: i64) -> OrderDetailView {
    reconcile_at(raw, requested_order_id, Utc::now())
}

/// Same as [`reconcile`] with an explicit clock for synthesized timestamps.
pub fn reconcile_at(raw: &Value, requested_order_id: i64, now: DateTime<Utc>) -> OrderDetailView {
    let shape = classify_detail(raw);
    debug!(
        event_name = "normalize.order_detail.classified",
        shape = shape.name(),
        order_id = requested_order_id,
        "order detail shape"
    );

    match shape {
        DetailShape::DetailEnvelope { header, lines } => {
            let customer_name = text_at(header, &["customerName", "shipName"])
                .or_else(|| nested_company_name(header));
            from_header(header, lines, customer_name, requested_order_id, now)
        }
        DetailShape::OrderResource { header, lines } => {
            let customer_name = text_at(header, &["shipName"])
                .or_else(|| nested_company_name(header))
                .or_else(|| text_at(header, &["customerName"]));
            from_header(header, lines, customer_name, requested_order_id, now)
        }
        DetailShape::LineItemList(lines) => OrderDetailView {
            line_items: reconcile_lines(lines),
            ..empty_view(requested_order_id, PLACEHOLDER_CUSTOMER_NAME, now)
        },
        DetailShape::Unrecognized => {
            warn!(
                event_name = "normalize.order_detail.unrecognized",
                order_id = requested_order_id,
                "order detail response not recognized"
            );
            empty_view(requested_order_id, PLACEHOLDER_CUSTOMER_NAME, now)
        }
    }
}

pub fn empty_view(order_id: i64, customer_name: &str, now: DateTime<Utc>) -> OrderDetailView {
    OrderDetailView {
        order_id,
        customer_name: customer_name.to_string(),
        order_date: now,
        required_date: None,
        shipped_date: None,
        ship_address: None,
        ship_city: None,
        ship_country: None,
        line_items: Vec::new(),
    }
}

/// Maps one raw line. Entries without a product id are skipped.
pub fn reconcile_line(raw: &Value) -> Option<OrderLine> {
    let line = raw.as_object()?;
    let product = line.get("product").and_then(Value::as_object);

    let product_id = lookup(line, &["productId"])
        .and_then(as_i64)
        .or_else(|| product.and_then(|product| lookup(product, &["productId"])).and_then(as_i64))?;
    let product_name = product
        .and_then(|product| text_at(product, &["productName"]))
        .or_else(|| text_at(line, &["productName"]))
        .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string());

    let quantity = pricing::resolve_quantity(
        lookup(line, &["quantity"]).and_then(as_u32),
        lookup(line, &["qty"]).and_then(as_u32),
    );
    let unit_price = lookup(line, &["unitPrice"]).and_then(as_decimal).unwrap_or(Decimal::ZERO);
    let raw_discount = lookup(line, &["discount"]).and_then(as_decimal).unwrap_or(Decimal::ZERO);

    Some(OrderLine {
        product_id,
        product_name,
        unit_price,
        quantity,
        discount: pricing::normalize_discount(raw_discount),
    })
}

fn reconcile_lines(lines: &[Value]) -> Vec<OrderLine> {
    let reconciled: Vec<OrderLine> = lines.iter().filter_map(reconcile_line).collect();
    if reconciled.len() != lines.len() {
        warn!(
            event_name = "normalize.order_detail.lines_skipped",
            skipped = lines.len() - reconciled.len(),
            "order detail lines without a product were skipped"
        );
    }
    reconciled
}

fn from_header(
    header: &Map<String, Value>,
    lines: &[Value],
    customer_name: Option<String>,
    requested_order_id: i64,
    now: DateTime<Utc>,
) -> OrderDetailView {
    let order_id = lookup(header, &["orderId"]).and_then(as_i64).unwrap_or(requested_order_id);
    if order_id != requested_order_id {
        debug!(
            event_name = "normalize.order_detail.id_mismatch",
            requested = requested_order_id,
            received = order_id,
            "order detail carries a different order id"
        );
    }

    OrderDetailView {
        order_id,
        customer_name: customer_name.unwrap_or_else(|| PLACEHOLDER_CUSTOMER_NAME.to_string()),
        order_date: date_at(header, "orderDate").unwrap_or(now),
        required_date: date_at(header, "requiredDate"),
        shipped_date: date_at(header, "shippedDate"),
        ship_address: text_at(header, &["shipAddress"]),
        ship_city: text_at(header, &["shipCity"]),
        ship_country: text_at(header, &["shipCountry"]),
        line_items: reconcile_lines(lines),
    }
}

fn nested_company_name(header: &Map<String, Value>) -> Option<String> {
    header
        .get("customer")
        .and_then(Value::as_object)
        .and_then(|customer| text_at(customer, &["companyName"]))
}

fn date_at(header: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    header.get(key).and_then(Value::as_str).and_then(parse_timestamp)
}
