mod errors;
mod member_service;

pub use errors::{MemberApplicationError, Result};
pub use member_service::{RegisterMember, ServiceDependencies, get_member, register_member};
