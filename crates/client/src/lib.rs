pub mod cache;
pub mod debounce;
pub mod outcome;
pub mod services;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use orderdesk_core::audit::AuditSink;
use orderdesk_core::config::AppConfig;
use orderdesk_core::domain::customer::Customer;
use orderdesk_core::domain::order::Order;
use orderdesk_core::domain::prediction::SalesPrediction;
use orderdesk_fallback::{fixtures, FallbackSimulator, SimulatorSettings};

pub use cache::{CacheTicket, EntityCache};
pub use debounce::SearchDebouncer;
pub use outcome::{Outcome, ServiceError};
pub use services::{
    DraftLine, EntityQueryService, OrderCompositionService, OrderHeader, ServiceSettings,
};
pub use transport::{
    HttpTransport, Method, OfflineTransport, Transport, TransportError, TransportRequest,
};

/// One service per entity kind, sharing a transport and an audit sink.
pub struct OrderDesk {
    pub customers: Arc<EntityQueryService<Customer>>,
    pub orders: Arc<EntityQueryService<Order>>,
    pub predictions: Arc<EntityQueryService<SalesPrediction>>,
    pub composition: OrderCompositionService,
    search_debounce: Duration,
}

impl OrderDesk {
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let simulator = SimulatorSettings::from_config(&config.fallback, &config.query);
        let settings = ServiceSettings {
            fallback_enabled: config.fallback.enabled,
            discard_stale_results: config.query.discard_stale_results,
            default_page_size: config.query.default_page_size,
        };
        Self::with_settings(transport, audit, &simulator, settings)
            .with_search_debounce(Duration::from_millis(config.query.search_debounce_ms))
    }

    pub fn with_settings(
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
        simulator: &SimulatorSettings,
        settings: ServiceSettings,
    ) -> Self {
        let customers = Arc::new(EntityQueryService::new(
            Arc::clone(&transport),
            FallbackSimulator::seeded(simulator),
            Arc::clone(&audit),
            settings,
        ));
        let orders = Arc::new(EntityQueryService::new(
            Arc::clone(&transport),
            FallbackSimulator::seeded(simulator),
            Arc::clone(&audit),
            settings,
        ));
        let predictions = Arc::new(EntityQueryService::new(
            transport,
            FallbackSimulator::seeded(simulator),
            audit,
            settings,
        ));
        let composition = OrderCompositionService::new(Arc::clone(&orders), fixtures::catalog());

        Self {
            customers,
            orders,
            predictions,
            composition,
            search_debounce: Duration::from_millis(400),
        }
    }

    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }

    /// Input side and settled-term side of a search box.
    pub fn search_input(&self) -> (mpsc::Sender<String>, SearchDebouncer) {
        SearchDebouncer::channel(self.search_debounce)
    }
}
