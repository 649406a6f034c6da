//! Line and order pricing.
//!
//! Discounts reach this module in two representations: a fraction (`0.25`) or a percentage
//! (`25`). Anything strictly greater than one is read as a percentage. The rule is applied the
//! same way everywhere a discount is interpreted so totals agree across views.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub trait PricedLine {
    fn unit_price(&self) -> Decimal;
    fn quantity(&self) -> u32;
    /// Discount as received, in either representation.
    fn raw_discount(&self) -> Decimal;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPricing {
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub total: Decimal,
    pub steps: Vec<PricingStep>,
}

pub fn normalize_discount(raw_discount: Decimal) -> Decimal {
    if raw_discount > Decimal::ONE {
        raw_discount / Decimal::ONE_HUNDRED
    } else {
        raw_discount
    }
}

/// `quantity` wins unless it is absent or zero, then the `qty` alias is used.
pub fn resolve_quantity(quantity: Option<u32>, qty: Option<u32>) -> u32 {
    quantity.filter(|value| *value > 0).or(qty).unwrap_or(0)
}

pub fn line_total(unit_price: Decimal, quantity: u32, raw_discount: Decimal) -> Decimal {
    let discount = normalize_discount(raw_discount);
    unit_price * Decimal::from(quantity) * (Decimal::ONE - discount)
}

pub fn line_total_of(line: &impl PricedLine) -> Decimal {
    line_total(line.unit_price(), line.quantity(), line.raw_discount())
}

pub fn order_total<L: PricedLine>(lines: &[L]) -> Decimal {
    lines.iter().map(line_total_of).sum()
}

pub fn price_lines<L: PricedLine>(lines: &[L]) -> OrderPricing {
    let subtotal: Decimal =
        lines.iter().map(|line| line.unit_price() * Decimal::from(line.quantity())).sum();
    let total = order_total(lines);
    let discount_total = subtotal - total;

    OrderPricing {
        subtotal,
        discount_total,
        total,
        steps: vec![
            PricingStep {
                stage: "subtotal".to_string(),
                detail: "sum(unit_price * quantity)".to_string(),
                amount: subtotal,
            },
            PricingStep {
                stage: "discount".to_string(),
                detail: "sum(unit_price * quantity * discount)".to_string(),
                amount: discount_total,
            },
            PricingStep {
                stage: "total".to_string(),
                detail: "subtotal - discount".to_string(),
                amount: total,
            },
        ],
    }
}

/// Two decimal places, halves away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
