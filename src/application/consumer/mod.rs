mod errors;
mod materializer;
mod shutdown;
mod subscriber;
mod topic_waiter;
mod worker_pool;

pub use errors::{DispatchError, MaterializeError, SubscriberError};
pub use materializer::{IdempotentMaterializer, Materialization};
pub use shutdown::ShutdownSignal;
pub use subscriber::{
    ConsumerStats, DEFAULT_HANDLER_TIMEOUT, DEFAULT_POLL_TIMEOUT, MemberEventSubscriber,
    SubscriberHandle, SubscriberSettings, SubscriberState, SubscriberStatus,
};
pub use topic_waiter::{
    DEFAULT_METADATA_TIMEOUT, DEFAULT_TOPIC_POLL_INTERVAL, DEFAULT_TOPIC_WAIT_TIMEOUT, TopicWaiter,
};
pub use worker_pool::{DEFAULT_WORKER_COUNT, WorkerPool};
