mod cancellation;
mod cost_aggregator;
mod subscription_service;

pub use cancellation::{run_cancellable, CallOptions};
pub use cost_aggregator::CostAggregator;
pub use subscription_service::SubscriptionService;
