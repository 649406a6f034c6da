//! Canonical paging for query responses.
//!
//! Query endpoints answer the same request with a bare array, a paging envelope, or an object
//! wrapping a single array under an arbitrary key. [`classify`] picks exactly one variant, in a
//! fixed order, and [`normalize`] maps it onto [`PagedResult`]. Every input produces a result.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::paging::{PagedResult, QueryParams, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
use crate::normalize::fields::{as_u32, as_u64, has_any, lookup};

const ITEMS_KEYS: &[&str] = &["items", "Items"];
const TOTAL_COUNT_KEYS: &[&str] = &["totalCount", "TotalCount"];
const PAGE_NUMBER_KEYS: &[&str] = &["pageNumber", "PageNumber", "currentPage", "CurrentPage"];
const PAGE_SIZE_KEYS: &[&str] = &["pageSize", "PageSize"];
const TOTAL_PAGES_KEYS: &[&str] = &["totalPages", "TotalPages"];
const PAGING_KEYS: &[&str] = &[
    "items",
    "Items",
    "totalCount",
    "TotalCount",
    "pageNumber",
    "PageNumber",
    "currentPage",
    "CurrentPage",
    "pageSize",
    "PageSize",
    "totalPages",
    "TotalPages",
    "hasNextPage",
    "hasPreviousPage",
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResponseShape<'a> {
    Array(&'a [Value]),
    PagedEnvelope { items: &'a [Value], envelope: &'a Map<String, Value> },
    SingleArrayField { field: &'a str, items: &'a [Value] },
    Unrecognized,
}

impl ResponseShape<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Array(_) => "array",
            Self::PagedEnvelope { .. } => "paged_envelope",
            Self::SingleArrayField { .. } => "single_array_field",
            Self::Unrecognized => "unrecognized",
        }
    }
}

pub fn classify(raw: &Value) -> ResponseShape<'_> {
    let object = match raw {
        Value::Array(items) => return ResponseShape::Array(items),
        Value::Object(object) => object,
        _ => return ResponseShape::Unrecognized,
    };

    if let Some(items) = lookup(object, ITEMS_KEYS).and_then(Value::as_array) {
        return ResponseShape::PagedEnvelope { items, envelope: object };
    }

    if has_any(object, PAGING_KEYS) {
        return ResponseShape::Unrecognized;
    }

    let mut arrays = object
        .iter()
        .filter_map(|(field, value)| value.as_array().map(|items| (field.as_str(), items)));
    match (arrays.next(), arrays.next()) {
        (Some((field, items)), None) => ResponseShape::SingleArrayField { field, items },
        _ => ResponseShape::Unrecognized,
    }
}

/// Normalizes into raw JSON items; see [`normalize`] for typed items.
pub fn normalize_values(raw: &Value, params: &QueryParams) -> PagedResult<Value> {
    let shape = classify(raw);
    debug!(event_name = "normalize.paged.classified", shape = shape.name(), "response shape");

    match shape {
        ResponseShape::Array(items) => wrap_sequence(items, params),
        ResponseShape::SingleArrayField { items, .. } => wrap_sequence(items, params),
        ResponseShape::PagedEnvelope { items, envelope } => from_envelope(items, envelope, params),
        ResponseShape::Unrecognized => PagedResult::empty(
            params.page_number.unwrap_or(DEFAULT_PAGE_NUMBER),
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        ),
    }
}

pub fn normalize<T: DeserializeOwned>(raw: &Value, params: &QueryParams) -> PagedResult<T> {
    let page = normalize_values(raw, params);
    let received = page.items.len();
    let mut decoded = Vec::with_capacity(received);

    for item in page.items {
        match serde_json::from_value::<T>(item) {
            Ok(record) => decoded.push(record),
            Err(error) => {
                warn!(
                    event_name = "normalize.paged.item_dropped",
                    error = %error,
                    "undecodable item"
                )
            }
        }
    }

    PagedResult {
        items: decoded,
        total_count: page.total_count,
        page_number: page.page_number,
        page_size: page.page_size,
        total_pages: page.total_pages,
    }
}

/// A bare sequence carries no paging metadata. When it is longer than the requested page the
/// server ignored paging and the page is cut locally.
fn wrap_sequence(items: &[Value], params: &QueryParams) -> PagedResult<Value> {
    let total = items.len();
    let page_number = params.page_number.unwrap_or(DEFAULT_PAGE_NUMBER).max(1);
    let page_size = match params.page_size {
        Some(size) => size.max(1),
        None if total == 0 => DEFAULT_PAGE_SIZE,
        None => u32::try_from(total).unwrap_or(u32::MAX),
    };

    let page_items = if total > page_size as usize {
        let start = (page_number as usize - 1).saturating_mul(page_size as usize);
        items.iter().skip(start).take(page_size as usize).cloned().collect()
    } else {
        items.to_vec()
    };

    PagedResult::new(page_items, total as u64, page_number, page_size)
}

fn from_envelope(
    items: &[Value],
    envelope: &Map<String, Value>,
    params: &QueryParams,
) -> PagedResult<Value> {
    let received = items.len();
    let total_count = lookup(envelope, TOTAL_COUNT_KEYS)
        .and_then(as_u64)
        .unwrap_or(received as u64)
        .max(received as u64);
    let page_number = lookup(envelope, PAGE_NUMBER_KEYS)
        .and_then(as_u32)
        .or(params.page_number)
        .unwrap_or(DEFAULT_PAGE_NUMBER);
    let mut page_size = lookup(envelope, PAGE_SIZE_KEYS)
        .and_then(as_u32)
        .or(params.page_size)
        .filter(|size| *size > 0)
        .unwrap_or_else(|| {
            if received == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                u32::try_from(received).unwrap_or(u32::MAX)
            }
        });

    if received > page_size as usize {
        warn!(
            event_name = "normalize.paged.page_size_widened",
            declared = page_size,
            received,
            "envelope returned more items than its page size"
        );
        page_size = u32::try_from(received).unwrap_or(u32::MAX);
    }

    let result = PagedResult::new(items.to_vec(), total_count, page_number, page_size);
    if let Some(declared) = lookup(envelope, TOTAL_PAGES_KEYS).and_then(as_u32) {
        if declared != result.total_pages {
            debug!(
                event_name = "normalize.paged.total_pages_recomputed",
                declared,
                computed = result.total_pages,
                "envelope total pages disagree with counts"
            );
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::{json, Value};

    use super::{classify, normalize, normalize_values, ResponseShape};
    use crate::domain::paging::{PagedResult, QueryParams};

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Row {
        cust_id: i64,
    }

    fn rows(count: i64) -> Value {
        Value::Array((1..=count).map(|id| json!({ "custId": id })).collect())
    }

    fn assert_invariants<T>(page: &PagedResult<T>) {
        assert!(page.items.len() <= page.page_size as usize, "page holds too many items");
        assert!(page.page_size >= 1 && page.page_number >= 1);
        let expected = page.total_count.div_ceil(u64::from(page.page_size)) as u32;
        assert_eq!(page.total_pages, expected);
        assert_eq!(page.total_pages == 0, page.total_count == 0);
    }

    #[test]
    fn classification_order_is_array_envelope_single_field_unrecognized() {
        assert!(matches!(classify(&rows(2)), ResponseShape::Array(_)));
        assert!(matches!(
            classify(&json!({ "items": [], "totalCount": 0 })),
            ResponseShape::PagedEnvelope { .. }
        ));
        assert!(matches!(
            classify(&json!({ "predictions": [], "generatedAt": "today" })),
            ResponseShape::SingleArrayField { field: "predictions", .. }
        ));
        assert!(matches!(classify(&json!({ "a": [], "b": [] })), ResponseShape::Unrecognized));
        assert!(matches!(
            classify(&json!({ "totalCount": 3, "rows": [] })),
            ResponseShape::Unrecognized
        ));
        assert!(matches!(classify(&json!(null)), ResponseShape::Unrecognized));
        assert!(matches!(classify(&json!("text")), ResponseShape::Unrecognized));
    }

    #[test]
    fn bare_array_without_params_is_one_page() {
        let page: PagedResult<Row> = normalize(&rows(3), &QueryParams::default());

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 3);
        assert_eq!(page.total_pages, 1);
        assert_invariants(&page);
    }

    #[test]
    fn bare_array_longer_than_requested_page_is_cut_locally() {
        let page: PagedResult<Row> = normalize(&rows(5), &QueryParams::page(2, 2));

        assert_eq!(page.items, vec![Row { cust_id: 3 }, Row { cust_id: 4 }]);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 3);
        assert_invariants(&page);
    }

    #[test]
    fn envelope_passes_through_and_fills_gaps() {
        let raw = json!({
            "items": [{ "custId": 11 }, { "custId": 12 }],
            "totalCount": 12,
            "currentPage": 6,
            "pageSize": 2,
            "hasNextPage": false
        });
        let page: PagedResult<Row> = normalize(&raw, &QueryParams::default());

        assert_eq!(page.page_number, 6);
        assert_eq!(page.total_count, 12);
        assert_eq!(page.total_pages, 6);
        assert_invariants(&page);

        let sparse = json!({ "items": [{ "custId": 1 }] });
        let page: PagedResult<Row> = normalize(&sparse, &QueryParams::page(1, 10));
        assert_eq!(page.total_count, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_pages, 1);
        assert_invariants(&page);
    }

    #[test]
    fn envelope_with_inconsistent_counts_stays_consistent() {
        let raw = json!({ "Items": [{ "custId": 1 }, { "custId": 2 }], "TotalCount": 0,
                          "PageSize": 1, "TotalPages": 9 });
        let page = normalize_values(&raw, &QueryParams::default());

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 2);
        assert_eq!(page.page_size, 2);
        assert_invariants(&page);
    }

    #[test]
    fn single_array_field_is_used_as_items() {
        let raw = json!({ "data": [{ "custId": 4 }, { "custId": 5 }], "source": "cache" });
        let page: PagedResult<Row> = normalize(&raw, &QueryParams::page(1, 10));

        assert_eq!(page.items, vec![Row { cust_id: 4 }, Row { cust_id: 5 }]);
        assert_eq!(page.total_count, 2);
        assert_invariants(&page);
    }

    #[test]
    fn anything_else_is_an_empty_page() {
        for raw in [json!(null), json!({}), json!(42), json!({ "message": "oops" })] {
            let page: PagedResult<Row> = normalize(&raw, &QueryParams::default());
            assert!(page.items.is_empty());
            assert_eq!(page.total_count, 0);
            assert_eq!(page.total_pages, 0);
            assert_eq!((page.page_number, page.page_size), (1, 10));
            assert_invariants(&page);
        }

        let page: PagedResult<Row> = normalize(&json!({}), &QueryParams::page(3, 25));
        assert_eq!((page.page_number, page.page_size), (3, 25));
    }

    #[test]
    fn undecodable_items_are_dropped() {
        let raw = json!([{ "custId": 1 }, { "custId": "not a number" }, { "custId": 3 }]);
        let page: PagedResult<Row> = normalize(&raw, &QueryParams::default());

        assert_eq!(page.items, vec![Row { cust_id: 1 }, Row { cust_id: 3 }]);
        assert_eq!(page.total_count, 3);
        assert_invariants(&page);
    }
}
