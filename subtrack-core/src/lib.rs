//! Subscription tracking core: storage, validation and cost aggregation.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repo;
pub mod services;

pub use config::{
    get_config_dir, ConfigLoadError, DatabaseSettings, LoggingConfig, QueryConfig, SubtrackConfig,
};
pub use db::{init_database, init_database_with_url, Database, DatabaseConfig, DatabaseError};
pub use error::{CliErrorDisplay, ErrorKind, SubtrackError, SubtrackResult};
pub use models::{
    parse_month, parse_subscription_id, parse_user_id, CostFilter, NewSubscription,
    ParseYearMonthError, Subscription, SubscriptionDraft, TotalCost, TotalCostQuery, YearMonth,
};
pub use repo::{MemorySubscriptionStore, Repository, SubscriptionRepository, SubscriptionStore};
pub use services::{run_cancellable, CallOptions, CostAggregator, SubscriptionService};
