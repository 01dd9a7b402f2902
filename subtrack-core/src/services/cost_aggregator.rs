use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::cancellation::{run_cancellable, CallOptions};
use crate::error::SubtrackResult;
use crate::models::{CostFilter, TotalCost, TotalCostQuery};
use crate::repo::SubscriptionStore;

/// Answers total-cost questions over the subscriptions held by a store.
pub struct CostAggregator {
    store: Arc<dyn SubscriptionStore>,
    default_timeout: Option<Duration>,
}

impl CostAggregator {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            default_timeout: None,
        }
    }

    /// Applies `timeout` to every call that does not bring its own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub async fn total_cost(&self, query: TotalCostQuery) -> SubtrackResult<TotalCost> {
        self.total_cost_with(query, &CallOptions::new()).await
    }

    /// Validates `query`, then runs one aggregate against the store.
    /// Malformed identifiers or months fail here and the store is never
    /// touched.
    pub async fn total_cost_with(
        &self,
        query: TotalCostQuery,
        options: &CallOptions,
    ) -> SubtrackResult<TotalCost> {
        let filter = query.into_filter()?;
        self.total_for_filter(&filter, options).await
    }

    pub async fn total_for_filter(
        &self,
        filter: &CostFilter,
        options: &CallOptions,
    ) -> SubtrackResult<TotalCost> {
        debug!(
            user_id = ?filter.user_id,
            service_name = ?filter.service_name,
            start_window = ?filter.start_window.map(|m| m.to_string()),
            end_window = ?filter.end_window.map(|m| m.to_string()),
            "Computing total cost"
        );

        let options = options.clone().or_timeout(self.default_timeout);
        let total = run_cancellable("total_cost", &options, self.store.sum_prices(filter)).await?;

        debug!(total_cost = total, "Total cost computed");
        Ok(TotalCost::new(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubtrackError;
    use crate::models::NewSubscription;
    use crate::repo::MemorySubscriptionStore;
    use tokio_util::sync::CancellationToken;

    const ALICE: &str = "7d3c1a8e-52a4-4d55-9f0e-3b1b54a4a0d1";
    const BOB: &str = "0b7e2f44-9a35-4cf9-8d51-5cc1c07a7e9b";

    fn new_sub(
        service: &str,
        price: i32,
        user: &str,
        start: &str,
        end: Option<&str>,
    ) -> NewSubscription {
        NewSubscription {
            service_name: service.to_string(),
            price,
            user_id: user.to_string(),
            start_date: start.parse().unwrap(),
            end_date: end.map(|e| e.parse().unwrap()),
        }
    }

    async fn seeded() -> CostAggregator {
        let store = Arc::new(MemorySubscriptionStore::new());
        for sub in [
            new_sub("Netflix", 800, ALICE, "2025-01", Some("2025-03")),
            new_sub("Spotify", 300, ALICE, "2024-12", Some("2025-02")),
            new_sub("Spotify", 300, BOB, "2025-02", None),
            new_sub("Yandex Plus", 400, BOB, "2025-05", Some("2025-09")),
        ] {
            store.create(&sub).await.unwrap();
        }
        CostAggregator::new(store)
    }

    #[tokio::test]
    async fn test_total_without_filters_sums_everything() {
        let aggregator = seeded().await;
        let total = aggregator.total_cost(TotalCostQuery::new()).await.unwrap();
        assert_eq!(total.total_cost, 1800);
    }

    #[tokio::test]
    async fn test_total_by_user() {
        let aggregator = seeded().await;
        let total = aggregator
            .total_cost(TotalCostQuery::new().user(ALICE))
            .await
            .unwrap();
        assert_eq!(total.total_cost, 1100);
    }

    #[tokio::test]
    async fn test_total_by_service_and_window() {
        let aggregator = seeded().await;
        let total = aggregator
            .total_cost(TotalCostQuery::new().service("Spotify").window("2025-01", "2025-03"))
            .await
            .unwrap();
        // Alice's Spotify started before the window; Bob's is open-ended.
        assert_eq!(total.total_cost, 300);
    }

    #[tokio::test]
    async fn test_no_match_is_zero() {
        let aggregator = seeded().await;
        let total = aggregator
            .total_cost(TotalCostQuery::new().service("Disney+"))
            .await
            .unwrap();
        assert_eq!(total, TotalCost::new(0));
    }

    #[tokio::test]
    async fn test_invalid_user_rejected() {
        let aggregator = seeded().await;
        let err = aggregator
            .total_cost(TotalCostQuery::new().user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[tokio::test]
    async fn test_cancelled_token() {
        let aggregator = seeded().await;
        let token = CancellationToken::new();
        token.cancel();

        let err = aggregator
            .total_cost_with(TotalCostQuery::new(), &CallOptions::new().with_cancel(token))
            .await
            .unwrap_err();
        assert!(matches!(err, SubtrackError::Cancelled(_)));
    }
}
