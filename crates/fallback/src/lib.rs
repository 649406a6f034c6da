pub mod dataset;
pub mod fixtures;
pub mod simulator;

use orderdesk_core::domain::record::EntityKind;
use thiserror::Error;

pub use dataset::MockDataset;
pub use fixtures::SeedData;
pub use simulator::{simulate_page, FallbackSimulator, SimulatorSettings};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FallbackError {
    #[error("{entity} {id} not found in the local dataset")]
    NotFound { entity: EntityKind, id: i64 },
}
