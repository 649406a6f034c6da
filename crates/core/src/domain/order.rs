use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::record::{EntityKind, FieldValue, Record};
use crate::pricing::{self, OrderPricing, PricedLine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub cust_id: i64,
    pub company_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub product_id: i64,
    pub product_name: String,
}

/// A stored order line. Accepts `qty` as well as `quantity` on input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OrderDetailWire")]
pub struct OrderDetail {
    pub order_detail_id: Option<i64>,
    pub order_id: Option<i64>,
    pub product_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub product: Option<ProductRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetailWire {
    #[serde(default)]
    order_detail_id: Option<i64>,
    #[serde(default)]
    order_id: Option<i64>,
    product_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    #[serde(default)]
    quantity: Option<u32>,
    #[serde(default)]
    qty: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    discount: Option<Decimal>,
    #[serde(default)]
    product: Option<ProductRef>,
}

impl From<OrderDetailWire> for OrderDetail {
    fn from(wire: OrderDetailWire) -> Self {
        Self {
            order_detail_id: wire.order_detail_id,
            order_id: wire.order_id,
            product_id: wire.product_id,
            unit_price: wire.unit_price,
            quantity: pricing::resolve_quantity(wire.quantity, wire.qty),
            discount: wire.discount.unwrap_or(Decimal::ZERO),
            product: wire.product,
        }
    }
}

impl PricedLine for OrderDetail {
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn raw_discount(&self) -> Decimal {
        self.discount
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub order_id: i64,
    #[serde(default)]
    pub cust_id: i64,
    #[serde(default)]
    pub emp_id: Option<i64>,
    #[serde(default)]
    pub order_date: String,
    #[serde(default)]
    pub required_date: Option<String>,
    #[serde(default)]
    pub shipped_date: Option<String>,
    #[serde(default)]
    pub shipper_id: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub freight: Option<Decimal>,
    #[serde(default)]
    pub ship_name: Option<String>,
    #[serde(default)]
    pub ship_address: Option<String>,
    #[serde(default)]
    pub ship_city: Option<String>,
    #[serde(default)]
    pub ship_region: Option<String>,
    #[serde(default)]
    pub ship_postal_code: Option<String>,
    #[serde(default)]
    pub ship_country: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub order_details: Vec<OrderDetail>,
}

impl Order {
    pub fn total(&self) -> Decimal {
        pricing::order_total(&self.order_details)
    }
}

impl Record for Order {
    const KIND: EntityKind = EntityKind::Orders;
    const SEARCH_FIELDS: &'static [&'static str] = &["shipName", "shipCountry", "orderId"];

    fn id(&self) -> i64 {
        self.order_id
    }

    fn set_id(&mut self, id: i64) {
        self.order_id = id;
        for detail in &mut self.order_details {
            detail.order_id = Some(id);
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name.to_ascii_lowercase().as_str() {
            "orderid" | "id" => FieldValue::number(self.order_id),
            "custid" | "customerid" => FieldValue::number(self.cust_id),
            "empid" => self.emp_id.and_then(FieldValue::number),
            "orderdate" => Some(FieldValue::Text(self.order_date.clone())),
            "requireddate" => FieldValue::text(&self.required_date),
            "shippeddate" => FieldValue::text(&self.shipped_date),
            "shipperid" => self.shipper_id.and_then(FieldValue::number),
            "freight" => self.freight.and_then(FieldValue::number),
            "shipname" | "customername" => FieldValue::text(&self.ship_name),
            "shipaddress" => FieldValue::text(&self.ship_address),
            "shipcity" => FieldValue::text(&self.ship_city),
            "shipregion" => FieldValue::text(&self.ship_region),
            "shippostalcode" => FieldValue::text(&self.ship_postal_code),
            "shipcountry" => FieldValue::text(&self.ship_country),
            "status" => self.status.map(|status| FieldValue::Text(status.as_str().to_string())),
            "total" => FieldValue::number(self.total()),
            _ => None,
        }
    }
}

/// One line as composed by a caller, before a product name is known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: i64,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub discount: Decimal,
}

impl PricedLine for LineItem {
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn raw_discount(&self) -> Decimal {
        self.discount
    }
}

/// A reconciled line with its discount already expressed as a fraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub discount: Decimal,
}

impl OrderLine {
    pub fn total(&self) -> Decimal {
        pricing::line_total_of(self)
    }
}

impl PricedLine for OrderLine {
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn raw_discount(&self) -> Decimal {
        self.discount
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailView {
    pub order_id: i64,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub required_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_country: Option<String>,
    pub line_items: Vec<OrderLine>,
}

impl OrderDetailView {
    pub fn order_total(&self) -> Decimal {
        pricing::order_total(&self.line_items)
    }

    pub fn pricing(&self) -> OrderPricing {
        pricing::price_lines(&self.line_items)
    }
}
