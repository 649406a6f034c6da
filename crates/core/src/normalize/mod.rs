//! Response-shape normalization for the backend's inconsistent payloads.

pub mod fields;
pub mod order_detail;
pub mod paged;

pub use order_detail::{reconcile, reconcile_at, DetailShape};
pub use paged::{classify, normalize, normalize_values, ResponseShape};
