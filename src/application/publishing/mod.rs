mod publisher;

pub use publisher::{DEFAULT_CLOSE_TIMEOUT, DEFAULT_FLUSH_TIMEOUT, MemberEventPublisher};
