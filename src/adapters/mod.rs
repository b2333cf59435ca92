pub mod kafka;
pub mod mock;
pub mod postgres;
