pub mod composition;
pub mod entity;

pub use composition::{DraftLine, OrderCompositionService, OrderHeader, WireOrder, WireOrderLine};
pub use entity::{detail_paths, EntityQueryService, ServiceSettings};
