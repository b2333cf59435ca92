pub mod consumer;
pub mod member;
pub mod publishing;
