use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Notify;

use orderdesk_client::services::entity::detail_paths;
use orderdesk_client::{
    DraftLine, Method, OrderDesk, OrderHeader, Outcome, ServiceError, ServiceSettings, Transport,
    TransportError, TransportRequest,
};
use orderdesk_core::audit::{AccessOperation, DataSource, InMemoryAuditSink};
use orderdesk_core::domain::customer::Customer;
use orderdesk_core::domain::order::OrderStatus;
use orderdesk_core::domain::paging::QueryParams;
use orderdesk_fallback::SimulatorSettings;

/// Replays queued responses in order; an exhausted script answers `Unavailable`.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    fn replying(responses: Vec<Result<Value, TransportError>>) -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(responses.into()), ..Self::default() })
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<Value, TransportError> {
        self.requests.lock().expect("requests lock").push(request);
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unavailable("script exhausted".to_string())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn refused() -> Result<Value, TransportError> {
    Err(TransportError::Unavailable("connection refused".to_string()))
}

fn desk(
    transport: Arc<ScriptedTransport>,
    audit: &InMemoryAuditSink,
    settings: ServiceSettings,
) -> OrderDesk {
    let simulator =
        SimulatorSettings { prediction_seed: Some(5), ..SimulatorSettings::immediate() };
    OrderDesk::with_settings(transport, Arc::new(audit.clone()), &simulator, settings)
}

#[tokio::test]
async fn live_envelope_is_normalized_and_audited_as_live() {
    let transport = ScriptedTransport::replying(vec![Ok(json!({
        "items": [{ "custId": 9, "companyName": "Vins et alcools Chevalier" }],
        "totalCount": 31,
        "pageNumber": 2,
        "pageSize": 1
    }))]);
    let audit = InMemoryAuditSink::default();
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());

    let outcome = desk.customers.query(&QueryParams::page(2, 1).with_search("vins")).await;

    let page = match outcome {
        Outcome::Live(page) => page,
        other => panic!("expected live page, got {other:?}"),
    };
    assert_eq!(page.items[0].company_name, "Vins et alcools Chevalier");
    assert_eq!(page.total_count, 31);
    assert_eq!(page.total_pages, 31);

    let sent = transport.requests();
    assert_eq!(sent[0].method, Method::Get);
    assert_eq!(sent[0].path, "Customer");
    assert!(sent[0].query.contains(&("SearchTerm".to_string(), "vins".to_string())));
    assert_eq!(audit.count_from(DataSource::Live), 1);
    assert_eq!(audit.count_from(DataSource::Fallback), 0);
}

#[tokio::test]
async fn transport_failure_is_served_from_the_local_dataset() {
    let audit = InMemoryAuditSink::default();
    let desk = desk(ScriptedTransport::replying(vec![]), &audit, ServiceSettings::default());

    let outcome = desk.customers.query(&QueryParams::page(1, 2).with_search("mexico")).await;

    assert!(outcome.is_fallback());
    let page = outcome.into_result().expect("fallback page");
    assert_eq!(page.total_count, 2);
    assert_eq!(page.total_pages, 1);

    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].source, DataSource::Fallback);
    assert_eq!(events[0].operation, AccessOperation::Query);
    assert_eq!(events[0].event_type, "access.query.fallback");
}

#[tokio::test]
async fn disabled_fallback_reports_the_transport_error() {
    let audit = InMemoryAuditSink::default();
    let settings = ServiceSettings { fallback_enabled: false, ..ServiceSettings::default() };
    let desk = desk(ScriptedTransport::replying(vec![refused()]), &audit, settings);

    let outcome = desk.orders.fetch(10248).await;

    assert!(matches!(outcome, Outcome::Failed(ServiceError::Transport(_))));
    assert_eq!(audit.count_from(DataSource::Fallback), 0);
}

#[tokio::test]
async fn unfiltered_queries_publish_to_the_cache() {
    let audit = InMemoryAuditSink::default();
    let desk = desk(ScriptedTransport::replying(vec![]), &audit, ServiceSettings::default());

    desk.customers.query(&QueryParams::default().with_search("alfreds")).await;
    assert!(desk.customers.cache().snapshot().is_empty());

    desk.customers.query(&QueryParams::default()).await;
    assert_eq!(desk.customers.cache().snapshot().len(), 3);
}

#[tokio::test]
async fn detail_variants_are_tried_in_order_until_one_succeeds() {
    let transport = ScriptedTransport::replying(vec![
        Err(TransportError::Status { status: 404, message: "Error: missing".to_string() }),
        Ok(json!({
            "orderId": 10250,
            "customerName": "Ana Trujillo",
            "orderDate": "2023-07-08",
            "details": [{ "productId": 41, "unitPrice": 7.7, "qty": 10, "discount": 0 }]
        })),
    ]);
    let audit = InMemoryAuditSink::default();
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());

    let view = match desk.orders.fetch_detail(10250).await {
        Outcome::Live(view) => view,
        other => panic!("expected live detail, got {other:?}"),
    };

    let paths: Vec<String> = transport.requests().into_iter().map(|request| request.path).collect();
    assert_eq!(paths, detail_paths(10250)[..2].to_vec());
    assert_eq!(view.customer_name, "Ana Trujillo");
    assert_eq!(view.line_items[0].quantity, 10);
    assert_eq!(view.order_total(), Decimal::from(77));
}

#[tokio::test]
async fn detail_falls_back_to_the_stored_order_or_the_empty_view() {
    let audit = InMemoryAuditSink::default();
    let transport = ScriptedTransport::replying(vec![]);
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());

    let stored = desk.orders.fetch_detail(10248).await;
    assert!(stored.is_fallback());
    let view = stored.into_result().expect("stored order view");
    assert_eq!(view.customer_name, "Alfreds Futterkiste");
    assert_eq!(view.order_total(), Decimal::from(266));
    assert_eq!(transport.requests().len(), 3);

    let missing = desk.orders.fetch_detail(99999).await.into_result().expect("empty view");
    assert_eq!(missing.customer_name, "Customer not found");
    assert!(missing.line_items.is_empty());
}

#[tokio::test]
async fn fallback_mutations_follow_dataset_rules() {
    let audit = InMemoryAuditSink::default();
    let desk = desk(ScriptedTransport::replying(vec![]), &audit, ServiceSettings::default());

    let missing = desk.customers.delete(404).await;
    assert!(matches!(missing, Outcome::Failed(ServiceError::NotFound { id: 404, .. })));

    let removed = desk.customers.delete(1).await;
    assert_eq!(removed, Outcome::Fallback(()));
    assert!(desk.customers.fetch(1).await.error().is_some());

    let for_customer = desk.orders.orders_for_customer(1).await;
    assert!(for_customer.is_fallback());
    assert_eq!(for_customer.value().map(Vec::len), Some(2));
}

#[tokio::test]
async fn submitted_orders_use_the_wire_format_and_fall_back_to_a_pending_order() {
    let transport = ScriptedTransport::replying(vec![]);
    let audit = InMemoryAuditSink::default();
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());
    let lines = vec![DraftLine {
        product_id: 14,
        unit_price: Decimal::new(1800, 2),
        quantity: 12,
        discount_pct: Decimal::from(25),
    }];
    let header = OrderHeader { cust_id: Some(2), ..OrderHeader::default() };

    let preview = desk.composition.preview(&lines).expect("valid draft prices");
    assert_eq!(preview.total, Decimal::from(162));

    let order = match desk.composition.submit(&lines, &header).await {
        Outcome::Fallback(order) => order,
        other => panic!("expected fallback order, got {other:?}"),
    };
    assert_eq!(order.order_id, 10251);
    assert_eq!(order.status, Some(OrderStatus::Pending));
    assert_eq!(order.order_details[0].quantity, 12);
    assert_eq!(
        order.order_details[0].product.as_ref().map(|product| product.product_name.as_str()),
        Some("Tofu")
    );
    assert_eq!(order.total(), Decimal::from(162));

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Post);
    let body = sent[0].body.as_ref().expect("create payload");
    assert_eq!(body["orderDetails"][0]["qty"], json!(12));
    assert_eq!(body["orderDetails"][0]["discount"], json!(0.25));
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_transport() {
    let transport = ScriptedTransport::replying(vec![]);
    let audit = InMemoryAuditSink::default();
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());
    let header = OrderHeader { cust_id: Some(2), ..OrderHeader::default() };

    let outcome = desk.composition.submit(&[], &header).await;

    assert!(matches!(outcome, Outcome::Failed(ServiceError::Validation(_))));
    assert!(transport.requests().is_empty());
    assert!(audit.events().is_empty());
}

#[tokio::test]
async fn guarded_cache_keeps_the_newest_request() {
    let audit = InMemoryAuditSink::default();
    let settings = ServiceSettings { discard_stale_results: true, ..ServiceSettings::default() };
    let desk = desk(ScriptedTransport::replying(vec![]), &audit, settings);

    let cache = desk.customers.cache();
    let older = cache.begin();
    desk.customers.query(&QueryParams::default()).await;

    assert!(!cache.publish(older, Vec::new()));
    assert_eq!(cache.snapshot().len(), 3);
}

/// Holds unfiltered listings until released; searches fail straight away.
struct GatedTransport {
    gate: Notify,
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, request: TransportRequest) -> Result<Value, TransportError> {
        if request.query.iter().any(|(key, _)| key == "SearchTerm") {
            return refused();
        }
        self.gate.notified().await;
        Ok(json!([
            { "custId": 1, "companyName": "Alfreds Futterkiste" },
            { "custId": 2, "companyName": "Ana Trujillo Emparedados y helados" }
        ]))
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

#[tokio::test]
async fn guarded_listing_is_not_superseded_by_a_later_search() {
    let transport = Arc::new(GatedTransport { gate: Notify::new() });
    let audit = InMemoryAuditSink::default();
    let settings = ServiceSettings { discard_stale_results: true, ..ServiceSettings::default() };
    let simulator = SimulatorSettings::immediate();
    let desk =
        OrderDesk::with_settings(transport.clone(), Arc::new(audit.clone()), &simulator, settings);

    let listing_params = QueryParams::default();
    let listing = desk.customers.query(&listing_params);
    let search = async {
        let outcome = desk.customers.query(&QueryParams::default().with_search("a")).await;
        transport.gate.notify_one();
        outcome
    };
    let (listing, search) = tokio::join!(listing, search);

    assert!(listing.is_live());
    assert!(search.is_fallback());
    assert_eq!(desk.customers.cache().snapshot().len(), 2);
}

fn customer(id: i64, name: &str) -> Customer {
    Customer { cust_id: id, company_name: name.to_string(), ..Customer::default() }
}

fn company_names(desk: &OrderDesk) -> Vec<String> {
    desk.customers.cache().snapshot().into_iter().map(|customer| customer.company_name).collect()
}

#[tokio::test]
async fn live_create_appends_the_server_record_to_the_cache() {
    let transport = ScriptedTransport::replying(vec![
        Ok(json!([{ "custId": 1, "companyName": "Alfreds Futterkiste" }])),
        Ok(json!({ "custId": 92, "companyName": "Wolski Zajazd" })),
    ]);
    let audit = InMemoryAuditSink::default();
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());
    desk.customers.query(&QueryParams::default()).await;

    let created = desk.customers.create(customer(0, "Wolski")).await;

    assert_eq!(created, Outcome::Live(customer(92, "Wolski Zajazd")));
    assert_eq!(company_names(&desk), vec!["Alfreds Futterkiste", "Wolski Zajazd"]);
    let sent = transport.requests();
    assert_eq!(sent[1].method, Method::Post);
    assert_eq!(sent[1].path, "Customer");
}

#[tokio::test]
async fn live_update_replaces_in_place_and_keeps_the_sent_record_on_an_empty_body() {
    let transport = ScriptedTransport::replying(vec![
        Ok(json!([
            { "custId": 1, "companyName": "Alfreds Futterkiste" },
            { "custId": 2, "companyName": "Ana Trujillo" }
        ])),
        Ok(json!({ "custId": 2, "companyName": "Ana Trujillo (server)" })),
        Ok(Value::Null),
    ]);
    let audit = InMemoryAuditSink::default();
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());
    desk.customers.query(&QueryParams::default()).await;

    let from_server = desk.customers.update(2, customer(0, "Ana Trujillo (edited)")).await;
    assert_eq!(from_server, Outcome::Live(customer(2, "Ana Trujillo (server)")));
    assert_eq!(company_names(&desk), vec!["Alfreds Futterkiste", "Ana Trujillo (server)"]);

    let no_body = desk.customers.update(1, customer(0, "Alfreds (edited)")).await;
    assert_eq!(no_body, Outcome::Live(customer(1, "Alfreds (edited)")));
    assert_eq!(company_names(&desk), vec!["Alfreds (edited)", "Ana Trujillo (server)"]);

    let sent = transport.requests();
    assert_eq!(sent[1].method, Method::Put);
    assert_eq!(sent[1].path, "Customer/2");
}

#[tokio::test]
async fn updating_an_uncached_record_leaves_the_list_untouched() {
    let audit = InMemoryAuditSink::default();
    let desk = desk(ScriptedTransport::replying(vec![]), &audit, ServiceSettings::default());

    let updated = desk.customers.update(2, customer(0, "Edited")).await;

    assert_eq!(updated, Outcome::Fallback(customer(2, "Edited")));
    assert!(desk.customers.cache().snapshot().is_empty());
}

#[tokio::test]
async fn fallback_update_of_an_unknown_id_is_not_found() {
    let audit = InMemoryAuditSink::default();
    let desk = desk(ScriptedTransport::replying(vec![]), &audit, ServiceSettings::default());

    let outcome = desk.customers.update(404, customer(0, "Nobody")).await;

    assert!(matches!(outcome, Outcome::Failed(ServiceError::NotFound { id: 404, .. })));
}

#[tokio::test]
async fn live_delete_removes_the_record_from_the_cache() {
    let transport = ScriptedTransport::replying(vec![
        Ok(json!([
            { "custId": 1, "companyName": "Alfreds Futterkiste" },
            { "custId": 2, "companyName": "Ana Trujillo" }
        ])),
        Ok(Value::Null),
    ]);
    let audit = InMemoryAuditSink::default();
    let desk = desk(Arc::clone(&transport), &audit, ServiceSettings::default());
    desk.customers.query(&QueryParams::default()).await;

    assert_eq!(desk.customers.delete(1).await, Outcome::Live(()));
    assert_eq!(company_names(&desk), vec!["Ana Trujillo"]);
    assert_eq!(transport.requests()[1].method, Method::Delete);
}

#[tokio::test]
async fn configured_page_size_applies_to_live_and_fallback_queries() {
    let transport = ScriptedTransport::replying(vec![Ok(json!([]))]);
    let audit = InMemoryAuditSink::default();
    let settings = ServiceSettings { default_page_size: 2, ..ServiceSettings::default() };
    let desk = desk(Arc::clone(&transport), &audit, settings);

    let live = desk.customers.query(&QueryParams::default()).await;
    assert!(live.is_live());
    assert_eq!(live.value().map(|page| page.page_size), Some(2));
    assert!(transport.requests()[0].query.contains(&("PageSize".to_string(), "2".to_string())));

    let fallback = desk.customers.query(&QueryParams::default()).await;
    assert!(fallback.is_fallback());
    let page = fallback.into_result().expect("fallback page");
    assert_eq!((page.page_size, page.items.len(), page.total_pages), (2, 2, 2));
}

#[tokio::test]
async fn preview_rejects_a_discount_that_submit_would_reject() {
    let audit = InMemoryAuditSink::default();
    let desk = desk(ScriptedTransport::replying(vec![]), &audit, ServiceSettings::default());
    let lines = vec![DraftLine {
        product_id: 14,
        unit_price: Decimal::new(1800, 2),
        quantity: 2,
        discount_pct: Decimal::from(150),
    }];

    assert!(matches!(desk.composition.preview(&lines), Err(ServiceError::Validation(_))));
}
