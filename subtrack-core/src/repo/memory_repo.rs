use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Repository, SubscriptionStore};
use crate::error::SubtrackResult;
use crate::models::{CostFilter, NewSubscription, Subscription};

/// Process-local store with the same matching rules as the Postgres
/// repository. Useful for tests and for embedding without a database.
#[derive(Default)]
pub struct MemorySubscriptionStore {
    rows: RwLock<HashMap<Uuid, Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn create(&self, new: &NewSubscription) -> SubtrackResult<Subscription> {
        let record = Subscription::from_new(Uuid::new_v4(), new.clone());
        self.rows.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, subscription: &Subscription) -> SubtrackResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&subscription.id) {
            Some(row) => {
                *row = subscription.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sum_prices(&self, filter: &CostFilter) -> SubtrackResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|s| filter.matches(s))
            .map(|s| i64::from(s.price))
            .sum())
    }
}

#[async_trait]
impl Repository for MemorySubscriptionStore {
    type Entity = Subscription;
    type Id = Uuid;

    async fn get_by_id(&self, id: Uuid) -> SubtrackResult<Option<Subscription>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn get_all(&self) -> SubtrackResult<Vec<Subscription>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: Uuid) -> SubtrackResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn netflix() -> NewSubscription {
        NewSubscription {
            service_name: "Netflix".to_string(),
            price: 799,
            user_id: "e9c3a059-089d-4c5b-b0cc-17b5a78bb6ef".to_string(),
            start_date: "2025-05".parse().unwrap(),
            end_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_ids() {
        let store = MemorySubscriptionStore::new();
        let a = store.create(&netflix()).await.unwrap();
        let b = store.create(&netflix()).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_update_missing_is_noop() {
        let store = MemorySubscriptionStore::new();
        let ghost = Subscription::from_new(Uuid::new_v4(), netflix());

        assert!(!store.update(&ghost).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sum_over_empty_store_is_zero() {
        let store = MemorySubscriptionStore::new();
        let total = store.sum_prices(&CostFilter::default()).await.unwrap();
        assert_eq!(total, 0);
    }
}
