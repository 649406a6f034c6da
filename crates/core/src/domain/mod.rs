pub mod customer;
pub mod order;
pub mod paging;
pub mod prediction;
pub mod product;
pub mod record;
pub mod timestamp;
