//! Local stand-in for the backend's query semantics.
//!
//! [`simulate_page`] filters, sorts and slices exactly as the server does so the normalized live
//! result and the simulated one are interchangeable for callers.

use std::cmp::Ordering;
use std::time::Duration;

use tracing::debug;

use orderdesk_core::config::{FallbackConfig, QueryConfig};
use orderdesk_core::domain::paging::{
    PagedResult, QueryParams, SortDirection, SortSpec, DEFAULT_PAGE_SIZE,
};
use orderdesk_core::domain::record::{FieldValue, Record};

use crate::dataset::MockDataset;
use crate::fixtures::SeedData;
use crate::FallbackError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulatorSettings {
    pub latency: Duration,
    pub default_page_size: u32,
    pub prediction_seed: Option<u64>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(300),
            default_page_size: DEFAULT_PAGE_SIZE,
            prediction_seed: None,
        }
    }
}

impl SimulatorSettings {
    pub fn from_config(fallback: &FallbackConfig, query: &QueryConfig) -> Self {
        Self {
            latency: Duration::from_millis(fallback.latency_ms),
            default_page_size: query.default_page_size,
            prediction_seed: fallback.prediction_seed,
        }
    }

    /// No simulated delay.
    pub fn immediate() -> Self {
        Self { latency: Duration::ZERO, ..Self::default() }
    }
}

pub struct FallbackSimulator<T: Record> {
    dataset: MockDataset<T>,
    latency: Duration,
    default_page_size: u32,
}

impl<T: Record> FallbackSimulator<T> {
    pub fn new(records: Vec<T>, settings: &SimulatorSettings) -> Self {
        Self {
            dataset: MockDataset::new(records),
            latency: settings.latency,
            default_page_size: settings.default_page_size.max(1),
        }
    }

    pub fn dataset(&self) -> &MockDataset<T> {
        &self.dataset
    }

    pub async fn simulate(&self, params: &QueryParams) -> PagedResult<T> {
        self.delay().await;
        let records = self.dataset.snapshot().await;
        let page = simulate_page(records, params, self.default_page_size);
        debug!(
            event_name = "fallback.simulate.completed",
            entity = %T::KIND,
            total_count = page.total_count,
            returned = page.items.len(),
            "simulated query"
        );
        page
    }

    pub async fn find(&self, id: i64) -> Option<T> {
        self.delay().await;
        self.dataset.find(id).await
    }

    pub async fn list_where<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool + Send,
    {
        self.delay().await;
        self.dataset.list_where(predicate).await
    }

    pub async fn insert(&self, record: T) -> T {
        self.delay().await;
        let stored = self.dataset.insert(record).await;
        debug!(
            event_name = "fallback.write.inserted",
            entity = %T::KIND,
            id = stored.id(),
            "record stored locally"
        );
        stored
    }

    pub async fn update(&self, id: i64, record: T) -> Result<T, FallbackError> {
        self.delay().await;
        self.dataset.update(id, record).await
    }

    pub async fn delete(&self, id: i64) -> Result<T, FallbackError> {
        self.delay().await;
        self.dataset.delete(id).await
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl<T: Record + SeedData> FallbackSimulator<T> {
    /// A simulator holding the built-in seed records.
    pub fn seeded(settings: &SimulatorSettings) -> Self {
        Self::new(T::seed(settings), settings)
    }
}

/// Filter, then sort, then paginate. Counts reflect the filtered set.
pub fn simulate_page<T: Record>(
    records: Vec<T>,
    params: &QueryParams,
    default_page_size: u32,
) -> PagedResult<T> {
    let mut matching: Vec<T> =
        records.into_iter().filter(|record| matches_query(record, params)).collect();

    if let Some(sort) = params.sort() {
        sort_records(&mut matching, &sort);
    }

    let window = params.window_with_default_size(default_page_size);
    let total_count = matching.len() as u64;
    let items: Vec<T> =
        matching.into_iter().skip(window.offset()).take(window.page_size as usize).collect();

    PagedResult::new(items, total_count, window.page_number, window.page_size)
}

fn matches_query<T: Record>(record: &T, params: &QueryParams) -> bool {
    if let Some(term) = params.search() {
        let term = term.to_lowercase();
        let hit = T::SEARCH_FIELDS.iter().any(|field| field_contains(record, field, &term));
        if !hit {
            return false;
        }
    }

    params.filters.iter().filter(|(_, value)| !value.trim().is_empty()).all(|(field, value)| {
        field_contains(record, field, &value.trim().to_lowercase())
    })
}

fn field_contains<T: Record>(record: &T, field: &str, folded_term: &str) -> bool {
    record
        .field(field)
        .is_some_and(|value| value.as_search_text().to_lowercase().contains(folded_term))
}

fn sort_records<T: Record>(records: &mut Vec<T>, sort: &SortSpec) {
    let mut keyed: Vec<(Option<FieldValue>, T)> = records
        .drain(..)
        .map(|record| (record.field(&sort.field).filter(|value| !value.is_blank()), record))
        .collect();

    keyed.sort_by(|(left, _), (right, _)| {
        compare_keys(left.as_ref(), right.as_ref(), sort.direction)
    });
    records.extend(keyed.into_iter().map(|(_, record)| record));
}

/// Missing keys go last ascending and first descending.
fn compare_keys(
    left: Option<&FieldValue>,
    right: Option<&FieldValue>,
    direction: SortDirection,
) -> Ordering {
    let ordering = match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => left.compare(right),
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
