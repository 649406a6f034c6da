use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::record::{EntityKind, FieldValue, Record};
use crate::domain::timestamp::parse_timestamp;

const UPCOMING_WINDOW_DAYS: i64 = 7;
const SECONDS_PER_DAY: i64 = 86_400;

/// Synthetic next-order estimate for a customer. Not a forecast.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPrediction {
    #[serde(default)]
    pub customer_id: i64,
    pub customer_name: String,
    pub last_order_date: String,
    pub next_predicted_order: String,
    #[serde(default)]
    pub average_days_between_orders: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionUrgency {
    Overdue,
    Upcoming,
    Future,
}

impl SalesPrediction {
    /// Whole days until the predicted order, rounded up. `None` if the date is unreadable.
    pub fn days_until_next_order(&self, now: DateTime<Utc>) -> Option<i64> {
        let next = parse_timestamp(&self.next_predicted_order)?;
        let seconds = (next - now).num_seconds();
        Some(ceil_div(seconds, SECONDS_PER_DAY))
    }

    pub fn urgency(&self, now: DateTime<Utc>) -> Option<PredictionUrgency> {
        let days = self.days_until_next_order(now)?;
        Some(if days < 0 {
            PredictionUrgency::Overdue
        } else if days <= UPCOMING_WINDOW_DAYS {
            PredictionUrgency::Upcoming
        } else {
            PredictionUrgency::Future
        })
    }
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator.div_euclid(denominator);
    if numerator.rem_euclid(denominator) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

impl Record for SalesPrediction {
    const KIND: EntityKind = EntityKind::Predictions;
    const SEARCH_FIELDS: &'static [&'static str] = &["customerName"];

    fn id(&self) -> i64 {
        self.customer_id
    }

    fn set_id(&mut self, id: i64) {
        self.customer_id = id;
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name.to_ascii_lowercase().as_str() {
            "customerid" | "custid" | "id" => FieldValue::number(self.customer_id),
            "customername" => Some(FieldValue::Text(self.customer_name.clone())),
            "lastorderdate" => Some(FieldValue::Text(self.last_order_date.clone())),
            "nextpredictedorder" => Some(FieldValue::Text(self.next_predicted_order.clone())),
            "averagedaysbetweenorders" => FieldValue::number(self.average_days_between_orders),
            _ => None,
        }
    }
}
