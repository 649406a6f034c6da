//! Order creation from composed line items.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use orderdesk_core::domain::order::{LineItem, Order, OrderDetail, OrderStatus, ProductRef};
use orderdesk_core::domain::product::Catalog;
use orderdesk_core::domain::timestamp::format_timestamp;
use orderdesk_core::pricing::{self, OrderPricing};

use crate::outcome::{Outcome, ServiceError};
use crate::services::entity::EntityQueryService;

/// A line as entered by a user: the discount is a percentage in `0..=100`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub product_id: i64,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub discount_pct: Decimal,
}

impl DraftLine {
    fn discount_fraction(&self) -> Decimal {
        self.discount_pct / Decimal::ONE_HUNDRED
    }

    fn as_line_item(&self) -> LineItem {
        LineItem {
            product_id: self.product_id,
            unit_price: self.unit_price,
            quantity: self.quantity,
            discount: self.discount_fraction(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHeader {
    pub cust_id: Option<i64>,
    pub emp_id: Option<i64>,
    pub required_date: Option<String>,
    pub shipper_id: Option<i64>,
    pub freight: Option<Decimal>,
    pub ship_name: Option<String>,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_country: Option<String>,
}

/// Creation payload in the backend's naming: quantity travels as `qty`, discount as a fraction.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    pub cust_id: i64,
    pub emp_id: Option<i64>,
    pub order_date: String,
    pub required_date: Option<String>,
    pub shipper_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub freight: Option<Decimal>,
    pub ship_name: String,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_region: String,
    pub ship_postal_code: String,
    pub ship_country: String,
    pub order_details: Vec<WireOrderLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrderLine {
    pub product_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub qty: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
}

pub struct OrderCompositionService {
    orders: Arc<EntityQueryService<Order>>,
    catalog: Catalog,
}

impl OrderCompositionService {
    pub fn new(orders: Arc<EntityQueryService<Order>>, catalog: Catalog) -> Self {
        Self { orders, catalog }
    }

    /// Totals for display; nothing is sent. Lines that `submit` would reject are rejected here.
    pub fn preview(&self, lines: &[DraftLine]) -> Result<OrderPricing, ServiceError> {
        validate_lines(lines)?;
        let items: Vec<LineItem> = lines.iter().map(DraftLine::as_line_item).collect();
        Ok(pricing::price_lines(&items))
    }

    pub async fn submit(&self, lines: &[DraftLine], header: &OrderHeader) -> Outcome<Order> {
        let cust_id = match validate(lines, header) {
            Ok(cust_id) => cust_id,
            Err(error) => return Outcome::Failed(error),
        };

        let wire = build_wire_order(cust_id, header, lines, Utc::now());
        let local = self.local_order(&wire);
        let body = match serde_json::to_value(&wire) {
            Ok(body) => body,
            Err(error) => {
                return Outcome::Failed(ServiceError::Validation(format!(
                    "order could not be encoded: {error}"
                )))
            }
        };

        let outcome = self.orders.create_with_payload(body, local).await;
        if let Some(order) = outcome.value() {
            info!(
                event_name = "composition.order.submitted",
                order_id = order.order_id,
                cust_id,
                lines = lines.len(),
                source = outcome.source().map(|source| source.as_str()).unwrap_or("none"),
                "order submitted"
            );
        }
        outcome
    }

    /// The order the fallback dataset stores when the backend is unreachable.
    fn local_order(&self, wire: &WireOrder) -> Order {
        Order {
            order_id: 0,
            cust_id: wire.cust_id,
            emp_id: wire.emp_id,
            order_date: wire.order_date.clone(),
            required_date: wire.required_date.clone(),
            shipped_date: None,
            shipper_id: wire.shipper_id,
            freight: wire.freight,
            ship_name: Some(wire.ship_name.clone()),
            ship_address: Some(wire.ship_address.clone()),
            ship_city: Some(wire.ship_city.clone()),
            ship_region: Some(wire.ship_region.clone()),
            ship_postal_code: Some(wire.ship_postal_code.clone()),
            ship_country: Some(wire.ship_country.clone()),
            status: Some(OrderStatus::Pending),
            customer: None,
            order_details: wire
                .order_details
                .iter()
                .map(|line| OrderDetail {
                    order_detail_id: None,
                    order_id: None,
                    product_id: line.product_id,
                    unit_price: line.unit_price,
                    quantity: line.qty,
                    discount: line.discount,
                    product: Some(ProductRef {
                        product_id: line.product_id,
                        product_name: self.catalog.name_of(line.product_id).to_string(),
                    }),
                })
                .collect(),
        }
    }
}

/// Returns the customer id when the draft is acceptable.
pub fn validate(lines: &[DraftLine], header: &OrderHeader) -> Result<i64, ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::Validation("an order needs at least one line".to_string()));
    }
    let cust_id = header
        .cust_id
        .ok_or_else(|| ServiceError::Validation("a customer must be selected".to_string()))?;
    validate_lines(lines)?;
    Ok(cust_id)
}

pub fn validate_lines(lines: &[DraftLine]) -> Result<(), ServiceError> {
    for (index, line) in lines.iter().enumerate() {
        let position = index + 1;
        if line.quantity < 1 {
            return Err(ServiceError::Validation(format!(
                "line {position}: quantity must be at least 1"
            )));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "line {position}: unit price must not be negative"
            )));
        }
        if line.discount_pct < Decimal::ZERO || line.discount_pct > Decimal::ONE_HUNDRED {
            return Err(ServiceError::Validation(format!(
                "line {position}: discount must be between 0 and 100"
            )));
        }
    }
    Ok(())
}

pub fn build_wire_order(
    cust_id: i64,
    header: &OrderHeader,
    lines: &[DraftLine],
    now: DateTime<Utc>,
) -> WireOrder {
    WireOrder {
        cust_id,
        emp_id: header.emp_id,
        order_date: format_timestamp(&now),
        required_date: header.required_date.clone(),
        shipper_id: header.shipper_id,
        freight: header.freight,
        ship_name: header.ship_name.clone().unwrap_or_default(),
        ship_address: header.ship_address.clone().unwrap_or_default(),
        ship_city: header.ship_city.clone().unwrap_or_default(),
        ship_region: String::new(),
        ship_postal_code: String::new(),
        ship_country: header.ship_country.clone().unwrap_or_default(),
        order_details: lines
            .iter()
            .map(|line| WireOrderLine {
                product_id: line.product_id,
                unit_price: line.unit_price,
                qty: line.quantity,
                discount: line.discount_fraction(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{build_wire_order, validate, validate_lines, DraftLine, OrderHeader};
    use crate::outcome::ServiceError;

    fn line(quantity: u32, discount_pct: i64) -> DraftLine {
        DraftLine {
            product_id: 14,
            unit_price: Decimal::new(1800, 2),
            quantity,
            discount_pct: Decimal::from(discount_pct),
        }
    }

    fn header() -> OrderHeader {
        OrderHeader {
            cust_id: Some(2),
            ship_name: Some("Ana Trujillo Emparedados y helados".to_string()),
            ..OrderHeader::default()
        }
    }

    #[test]
    fn validation_rejects_incomplete_drafts() {
        assert!(matches!(validate(&[], &header()), Err(ServiceError::Validation(_))));
        assert!(validate(&[line(1, 0)], &OrderHeader::default()).is_err());
        assert!(validate(&[line(0, 0)], &header()).is_err());
        assert!(validate(&[line(1, 101)], &header()).is_err());
        assert!(validate(&[line(1, -1)], &header()).is_err());

        let negative_price = DraftLine { unit_price: Decimal::from(-1), ..line(1, 0) };
        assert!(validate(&[negative_price], &header()).is_err());
        assert_eq!(validate(&[line(12, 100)], &header()), Ok(2));
    }

    #[test]
    fn line_checks_allow_an_empty_draft_but_not_an_out_of_range_discount() {
        assert_eq!(validate_lines(&[]), Ok(()));
        assert!(matches!(validate_lines(&[line(2, 150)]), Err(ServiceError::Validation(_))));
        assert_eq!(validate_lines(&[line(2, 100)]), Ok(()));
    }

    #[test]
    fn wire_payload_uses_qty_and_fractional_discount() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).single().expect("valid now");
        let wire = build_wire_order(2, &header(), &[line(12, 25)], now);
        let value = serde_json::to_value(&wire).expect("encode wire order");

        assert_eq!(value["orderDate"], json!("2026-10-19T08:30:00"));
        assert_eq!(value["shipRegion"], json!(""));
        assert_eq!(value["shipPostalCode"], json!(""));
        assert_eq!(value["orderDetails"][0]["qty"], json!(12));
        assert_eq!(value["orderDetails"][0]["discount"], json!(0.25));
        assert!(value["orderDetails"][0].get("quantity").is_none());
    }
}
