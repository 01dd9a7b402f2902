pub mod memory_repo;
pub mod subscription_repo;

pub use memory_repo::MemorySubscriptionStore;
pub use subscription_repo::SubscriptionRepository;

use crate::error::SubtrackResult;
use crate::models::{CostFilter, NewSubscription, Subscription};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait Repository: Send + Sync {
    type Entity;
    type Id;

    async fn get_by_id(&self, id: Self::Id) -> SubtrackResult<Option<Self::Entity>>;
    async fn get_all(&self) -> SubtrackResult<Vec<Self::Entity>>;
    /// Returns whether a row was removed; removing a missing row is not an error.
    async fn delete(&self, id: Self::Id) -> SubtrackResult<bool>;
}

/// Backing store for subscriptions. Each method is a single statement
/// against the store; implementations hold no state besides their handle.
#[async_trait]
pub trait SubscriptionStore: Repository<Entity = Subscription, Id = Uuid> {
    /// Persists `new` and returns it with the store-assigned identifier.
    async fn create(&self, new: &NewSubscription) -> SubtrackResult<Subscription>;

    /// Overwrites every mutable field of the row with `subscription.id`.
    /// Returns `false` (not an error) when no such row exists.
    async fn update(&self, subscription: &Subscription) -> SubtrackResult<bool>;

    /// Sum of `price` over the rows matching `filter`, `0` when none match.
    async fn sum_prices(&self, filter: &CostFilter) -> SubtrackResult<i64>;
}
