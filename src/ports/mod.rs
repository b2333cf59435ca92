pub mod event_broker;
pub mod member_repository;

pub use event_broker::*;
pub use member_repository::*;
