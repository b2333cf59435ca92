pub mod broker;
pub mod member_repository;

#[allow(unused_imports)]
pub use broker::{InMemoryBroker, InMemoryConsumer};
#[allow(unused_imports)]
pub use member_repository::MemberRepository;
