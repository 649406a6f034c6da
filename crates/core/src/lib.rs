pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod normalize;
pub mod pricing;

pub use audit::{AccessOperation, AuditEvent, AuditOutcome, AuditSink, DataSource};
pub use domain::customer::Customer;
pub use domain::order::{
    CustomerRef, LineItem, Order, OrderDetail, OrderDetailView, OrderLine, OrderStatus, ProductRef,
};
pub use domain::paging::{PagedResult, QueryParams, SortDirection, SortSpec};
pub use domain::prediction::{PredictionUrgency, SalesPrediction};
pub use domain::product::{Catalog, Product};
pub use domain::record::{EntityKind, FieldValue, Record};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{line_total, order_total, OrderPricing};
