//! Query and mutation orchestration for one entity kind.
//!
//! Every call tries the transport first. A transport failure is absorbed by the fallback
//! simulator (unless disabled) and reported as [`Outcome::Fallback`], with a `warn` event and an
//! audit record naming the fallback source.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use orderdesk_core::audit::{AccessOperation, AuditEvent, AuditOutcome, AuditSink, DataSource};
use orderdesk_core::domain::order::{Order, OrderDetailView};
use orderdesk_core::domain::paging::{PagedResult, QueryParams, DEFAULT_PAGE_SIZE};
use orderdesk_core::domain::record::Record;
use orderdesk_core::normalize::order_detail::{self, MISSING_ORDER_CUSTOMER_NAME};
use orderdesk_core::normalize::paged;
use orderdesk_fallback::FallbackSimulator;

use crate::cache::EntityCache;
use crate::outcome::{Outcome, ServiceError};
use crate::transport::{Transport, TransportError, TransportRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceSettings {
    pub fallback_enabled: bool,
    pub discard_stale_results: bool,
    pub default_page_size: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            discard_stale_results: false,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub struct EntityQueryService<T: Record> {
    transport: Arc<dyn Transport>,
    simulator: FallbackSimulator<T>,
    cache: EntityCache<T>,
    audit: Arc<dyn AuditSink>,
    settings: ServiceSettings,
}

impl<T: Record> EntityQueryService<T> {
    pub fn new(
        transport: Arc<dyn Transport>,
        simulator: FallbackSimulator<T>,
        audit: Arc<dyn AuditSink>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            transport,
            simulator,
            cache: EntityCache::new(settings.discard_stale_results),
            audit,
            settings,
        }
    }

    pub fn cache(&self) -> &EntityCache<T> {
        &self.cache
    }

    pub fn simulator(&self) -> &FallbackSimulator<T> {
        &self.simulator
    }

    /// Only the plain default listing publishes to the cache, so only it takes a ticket.
    pub async fn query(&self, params: &QueryParams) -> Outcome<PagedResult<T>> {
        let correlation_id = new_correlation_id();
        let ticket = params.is_unfiltered().then(|| self.cache.begin());
        let params = params.clone().with_default_page_size(self.settings.default_page_size);
        let request = TransportRequest::get(T::KIND.resource_path())
            .with_query(params.to_query_pairs());

        let (outcome, source) = match self.transport.send(request).await {
            Ok(raw) => {
                let page = paged::normalize::<T>(&raw, &params);
                debug!(
                    event_name = "access.query.live",
                    entity = %T::KIND,
                    correlation_id = %correlation_id,
                    total_count = page.total_count,
                    "query served by backend"
                );
                (Outcome::Live(page), DataSource::Live)
            }
            Err(error) => {
                if !self.settings.fallback_enabled {
                    return self.fail(&correlation_id, AccessOperation::Query, error);
                }
                self.note_fallback(&correlation_id, AccessOperation::Query, &error);
                (Outcome::Fallback(self.simulator.simulate(&params).await), DataSource::Fallback)
            }
        };

        if let Some(page) = outcome.value() {
            if let Some(ticket) = ticket {
                self.cache.publish(ticket, page.items.clone());
            }
            let event =
                self.record(&correlation_id, AccessOperation::Query, source, AuditOutcome::Success);
            self.audit.emit(event.with_metadata("total_count", page.total_count.to_string()));
        }
        outcome
    }

    pub async fn fetch(&self, id: i64) -> Outcome<T> {
        let correlation_id = new_correlation_id();
        let request = TransportRequest::get(format!("{}/{id}", T::KIND.resource_path()));

        let error = match self.transport.send(request).await {
            Ok(raw) => match serde_json::from_value::<T>(raw) {
                Ok(record) => {
                    self.audit_success(&correlation_id, AccessOperation::Fetch, DataSource::Live);
                    return Outcome::Live(record);
                }
                Err(error) => TransportError::Decode(error.to_string()),
            },
            Err(error) => error,
        };

        if !self.settings.fallback_enabled {
            return self.fail(&correlation_id, AccessOperation::Fetch, error);
        }
        self.note_fallback(&correlation_id, AccessOperation::Fetch, &error);

        match self.simulator.find(id).await {
            Some(record) => {
                self.audit_success(&correlation_id, AccessOperation::Fetch, DataSource::Fallback);
                Outcome::Fallback(record)
            }
            None => self.not_found(&correlation_id, AccessOperation::Fetch, id),
        }
    }

    pub async fn create(&self, record: T) -> Outcome<T> {
        match serde_json::to_value(&record) {
            Ok(body) => self.create_with_payload(body, record).await,
            Err(error) => Outcome::Failed(ServiceError::Validation(format!(
                "record could not be encoded: {error}"
            ))),
        }
    }

    /// Sends `body` as the create payload; `local` is what the fallback dataset stores if the
    /// backend cannot be reached.
    pub async fn create_with_payload(&self, body: Value, local: T) -> Outcome<T> {
        let correlation_id = new_correlation_id();
        let request = TransportRequest::post(T::KIND.resource_path(), body);

        let error = match self.transport.send(request).await {
            Ok(raw) => match serde_json::from_value::<T>(raw) {
                Ok(created) => {
                    self.cache.upsert(created.clone());
                    self.audit_success(&correlation_id, AccessOperation::Create, DataSource::Live);
                    return Outcome::Live(created);
                }
                Err(error) => TransportError::Decode(error.to_string()),
            },
            Err(error) => error,
        };

        if !self.settings.fallback_enabled {
            return self.fail(&correlation_id, AccessOperation::Create, error);
        }
        self.note_fallback(&correlation_id, AccessOperation::Create, &error);

        let stored = self.simulator.insert(local).await;
        self.cache.upsert(stored.clone());
        let event = self.record(
            &correlation_id,
            AccessOperation::Create,
            DataSource::Fallback,
            AuditOutcome::Success,
        );
        self.audit.emit(event.with_metadata("id", stored.id().to_string()));
        Outcome::Fallback(stored)
    }

    pub async fn update(&self, id: i64, mut record: T) -> Outcome<T> {
        let correlation_id = new_correlation_id();
        record.set_id(id);
        let body = match serde_json::to_value(&record) {
            Ok(body) => body,
            Err(error) => {
                return Outcome::Failed(ServiceError::Validation(format!(
                    "record could not be encoded: {error}"
                )))
            }
        };
        let request = TransportRequest::put(format!("{}/{id}", T::KIND.resource_path()), body);

        match self.transport.send(request).await {
            Ok(raw) => {
                let updated = serde_json::from_value::<T>(raw).unwrap_or(record);
                self.cache.replace(updated.clone());
                self.audit_success(&correlation_id, AccessOperation::Update, DataSource::Live);
                Outcome::Live(updated)
            }
            Err(error) => {
                if !self.settings.fallback_enabled {
                    return self.fail(&correlation_id, AccessOperation::Update, error);
                }
                self.note_fallback(&correlation_id, AccessOperation::Update, &error);
                match self.simulator.update(id, record).await {
                    Ok(updated) => {
                        self.cache.replace(updated.clone());
                        self.audit_success(
                            &correlation_id,
                            AccessOperation::Update,
                            DataSource::Fallback,
                        );
                        Outcome::Fallback(updated)
                    }
                    Err(_) => self.not_found(&correlation_id, AccessOperation::Update, id),
                }
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Outcome<()> {
        let correlation_id = new_correlation_id();
        let request = TransportRequest::delete(format!("{}/{id}", T::KIND.resource_path()));

        match self.transport.send(request).await {
            Ok(_) => {
                self.cache.remove(id);
                self.audit_success(&correlation_id, AccessOperation::Delete, DataSource::Live);
                Outcome::Live(())
            }
            Err(error) => {
                if !self.settings.fallback_enabled {
                    return self.fail(&correlation_id, AccessOperation::Delete, error);
                }
                self.note_fallback(&correlation_id, AccessOperation::Delete, &error);
                match self.simulator.delete(id).await {
                    Ok(_) => {
                        self.cache.remove(id);
                        self.audit_success(
                            &correlation_id,
                            AccessOperation::Delete,
                            DataSource::Fallback,
                        );
                        Outcome::Fallback(())
                    }
                    Err(_) => self.not_found(&correlation_id, AccessOperation::Delete, id),
                }
            }
        }
    }

    fn record(
        &self,
        correlation_id: &str,
        operation: AccessOperation,
        source: DataSource,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        AuditEvent::new(correlation_id, T::KIND, operation, source, outcome)
    }

    fn audit_success(&self, correlation_id: &str, operation: AccessOperation, source: DataSource) {
        self.audit.emit(self.record(correlation_id, operation, source, AuditOutcome::Success));
    }

    fn note_fallback(
        &self,
        correlation_id: &str,
        operation: AccessOperation,
        error: &TransportError,
    ) {
        warn!(
            event_name = "access.fallback.engaged",
            entity = %T::KIND,
            operation = operation.as_str(),
            correlation_id = %correlation_id,
            error = %error,
            "transport failed, serving from local dataset"
        );
    }

    fn fail<R>(
        &self,
        correlation_id: &str,
        operation: AccessOperation,
        error: TransportError,
    ) -> Outcome<R> {
        warn!(
            event_name = "access.transport.failed",
            entity = %T::KIND,
            operation = operation.as_str(),
            correlation_id = %correlation_id,
            error = %error,
            "transport failed and fallback is disabled"
        );
        let event = self.record(correlation_id, operation, DataSource::Live, AuditOutcome::Failed);
        self.audit.emit(event.with_metadata("reason", error.to_string()));
        Outcome::Failed(ServiceError::Transport(error))
    }

    fn not_found<R>(
        &self,
        correlation_id: &str,
        operation: AccessOperation,
        id: i64,
    ) -> Outcome<R> {
        let event =
            self.record(correlation_id, operation, DataSource::Fallback, AuditOutcome::Rejected);
        self.audit.emit(event.with_metadata("id", id.to_string()));
        Outcome::Failed(ServiceError::NotFound { entity: T::KIND, id })
    }
}

impl EntityQueryService<Order> {
    /// Tries each detail endpoint in order; the first success is reconciled.
    pub async fn fetch_detail(&self, order_id: i64) -> Outcome<OrderDetailView> {
        let correlation_id = new_correlation_id();
        let mut last_error = None;

        for path in detail_paths(order_id) {
            match self.transport.send(TransportRequest::get(path.clone())).await {
                Ok(raw) => {
                    debug!(
                        event_name = "access.detail.live",
                        order_id,
                        path = %path,
                        correlation_id = %correlation_id,
                        "order detail served by backend"
                    );
                    let event = self.record(
                        &correlation_id,
                        AccessOperation::FetchDetail,
                        DataSource::Live,
                        AuditOutcome::Success,
                    );
                    self.audit.emit(event.with_metadata("path", path));
                    return Outcome::Live(order_detail::reconcile(&raw, order_id));
                }
                Err(error) => {
                    debug!(
                        event_name = "access.detail.variant_failed",
                        order_id,
                        path = %path,
                        error = %error,
                        "order detail variant failed"
                    );
                    last_error = Some(error);
                }
            }
        }

        let error = last_error
            .unwrap_or_else(|| TransportError::Unavailable("no detail endpoints".to_string()));
        if !self.settings.fallback_enabled {
            return self.fail(&correlation_id, AccessOperation::FetchDetail, error);
        }
        self.note_fallback(&correlation_id, AccessOperation::FetchDetail, &error);

        let view = match self.simulator.find(order_id).await {
            Some(order) => {
                let raw = serde_json::to_value(&order).unwrap_or(Value::Null);
                order_detail::reconcile(&raw, order_id)
            }
            None => order_detail::empty_view(order_id, MISSING_ORDER_CUSTOMER_NAME, Utc::now()),
        };
        self.audit_success(&correlation_id, AccessOperation::FetchDetail, DataSource::Fallback);
        Outcome::Fallback(view)
    }

    pub async fn orders_for_customer(&self, cust_id: i64) -> Outcome<Vec<Order>> {
        let correlation_id = new_correlation_id();
        let request = TransportRequest::get(format!("Order/customer/{cust_id}"));

        match self.transport.send(request).await {
            Ok(raw) => {
                let page = paged::normalize::<Order>(&raw, &QueryParams::default());
                self.audit_success(
                    &correlation_id,
                    AccessOperation::ListByCustomer,
                    DataSource::Live,
                );
                Outcome::Live(page.items)
            }
            Err(error) => {
                if !self.settings.fallback_enabled {
                    return self.fail(&correlation_id, AccessOperation::ListByCustomer, error);
                }
                self.note_fallback(&correlation_id, AccessOperation::ListByCustomer, &error);
                let orders = self.simulator.list_where(|order| order.cust_id == cust_id).await;
                self.audit_success(
                    &correlation_id,
                    AccessOperation::ListByCustomer,
                    DataSource::Fallback,
                );
                Outcome::Fallback(orders)
            }
        }
    }
}

pub fn detail_paths(order_id: i64) -> [String; 3] {
    [
        format!("OrderDetail/order/{order_id}"),
        format!("Order/{order_id}/details"),
        format!("Order/{order_id}"),
    ]
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
