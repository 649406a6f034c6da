use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use orderdesk_client::{
    HttpTransport, OfflineTransport, OrderDesk, Outcome, ServiceError, Transport,
};
use orderdesk_core::audit::InMemoryAuditSink;
use orderdesk_core::config::{AppConfig, LoadOptions};
use orderdesk_core::domain::paging::QueryParams;
use orderdesk_core::errors::ApplicationError;
use orderdesk_core::pricing::round_currency;

use crate::commands::CommandResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryCommand {
    Customers(QueryParams),
    Orders(QueryParams),
    Predictions(QueryParams),
    OrderDetail(i64),
    CustomerOrders(i64),
}

impl QueryCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Customers(_) => "customers",
            Self::Orders(_) => "orders",
            Self::Predictions(_) => "predictions",
            Self::OrderDetail(_) => "order-detail",
            Self::CustomerOrders(_) => "customer-orders",
        }
    }
}

struct Served {
    source: &'static str,
    message: String,
    data: Value,
}

enum Failure {
    Service(ServiceError),
    Encode(serde_json::Error),
}

pub fn run(command: QueryCommand, options: LoadOptions, offline: bool) -> CommandResult {
    let name = command.name();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(name, "config_validation", error.to_string(), 2)
        }
    };

    let transport: Arc<dyn Transport> = if offline {
        Arc::new(OfflineTransport)
    } else {
        match HttpTransport::new(&config.api) {
            Ok(transport) => Arc::new(transport),
            Err(error) => {
                return CommandResult::failure(name, "transport_configuration", error.to_string(), 3)
            }
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                name,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                4,
            )
        }
    };

    let audit = InMemoryAuditSink::default();
    let desk = OrderDesk::new(&config, transport, Arc::new(audit.clone()));
    let result = runtime.block_on(execute(&desk, &command));
    let correlation_id = audit.events().last().map(|event| event.correlation_id.clone());

    match result {
        Ok(served) => {
            CommandResult::data(name, served.source, correlation_id, served.message, served.data)
        }
        Err(Failure::Service(error)) => {
            let correlation_id = correlation_id.unwrap_or_else(|| "unassigned".to_string());
            let interface = ApplicationError::from(error).into_interface(correlation_id);
            CommandResult::interface_failure(name, &interface, 1)
        }
        Err(Failure::Encode(error)) => {
            CommandResult::failure(name, "serialization", error.to_string(), 5)
        }
    }
}

async fn execute(desk: &OrderDesk, command: &QueryCommand) -> Result<Served, Failure> {
    match command {
        QueryCommand::Customers(params) => {
            served(desk.customers.query(params).await, |page| {
                format!("{} of {} customers", page.items.len(), page.total_count)
            })
        }
        QueryCommand::Orders(params) => served(desk.orders.query(params).await, |page| {
            format!("{} of {} orders", page.items.len(), page.total_count)
        }),
        QueryCommand::Predictions(params) => {
            served(desk.predictions.query(params).await, |page| {
                format!("{} of {} sales predictions", page.items.len(), page.total_count)
            })
        }
        QueryCommand::OrderDetail(order_id) => {
            served(desk.orders.fetch_detail(*order_id).await, |view| {
                format!(
                    "order {} for {}: {} line(s), total {}",
                    view.order_id,
                    view.customer_name,
                    view.line_items.len(),
                    round_currency(view.order_total())
                )
            })
        }
        QueryCommand::CustomerOrders(cust_id) => {
            served(desk.orders.orders_for_customer(*cust_id).await, |orders| {
                format!("{} order(s) for customer {cust_id}", orders.len())
            })
        }
    }
}

fn served<T: Serialize>(
    outcome: Outcome<T>,
    describe: impl FnOnce(&T) -> String,
) -> Result<Served, Failure> {
    let source = outcome.source().map(|source| source.as_str()).unwrap_or("none");
    let value = outcome.into_result().map_err(Failure::Service)?;
    let message = describe(&value);
    let data = serde_json::to_value(&value).map_err(Failure::Encode)?;
    Ok(Served { source, message, data })
}
