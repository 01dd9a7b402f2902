use crate::error::SubtrackResult;
use crate::models::{CostFilter, NewSubscription, Subscription};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Repository, SubscriptionStore};

/// Postgres-backed subscription store.
///
/// The `sum_prices` WHERE clause must agree with [`CostFilter::matches`].
/// Its tests only run with `--features integration_with_db` and a
/// `DATABASE_URL` pointing at a scratch Postgres database.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn create(&self, new: &NewSubscription) -> SubtrackResult<Subscription> {
        let record = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (service_name, price, user_id, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, service_name, price, user_id, start_date, end_date
            "#,
        )
        .bind(&new.service_name)
        .bind(new.price)
        .bind(&new.user_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %record.id, "Inserted subscription");
        Ok(record)
    }

    async fn update(&self, subscription: &Subscription) -> SubtrackResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET service_name = $2, price = $3, user_id = $4, start_date = $5, end_date = $6
            WHERE id = $1
            "#,
        )
        .bind(subscription.id)
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(&subscription.user_id)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn sum_prices(&self, filter: &CostFilter) -> SubtrackResult<i64> {
        // NULL parameters disable their predicate.
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(price), 0)::BIGINT
            FROM subscriptions
            WHERE ($1::TEXT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR service_name = $2)
              AND ($3::TEXT IS NULL OR start_date >= $3)
              AND ($4::TEXT IS NULL OR end_date IS NULL OR end_date <= $4)
            "#,
        )
        .bind(filter.user_id.as_deref())
        .bind(filter.service_name.as_deref())
        .bind(filter.start_window)
        .bind(filter.end_window)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

#[async_trait]
impl Repository for SubscriptionRepository {
    type Entity = Subscription;
    type Id = Uuid;

    async fn get_by_id(&self, id: Uuid) -> SubtrackResult<Option<Subscription>> {
        let record = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, service_name, price, user_id, start_date, end_date
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_all(&self) -> SubtrackResult<Vec<Subscription>> {
        let records = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, service_name, price, user_id, start_date, end_date
            FROM subscriptions
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn delete(&self, id: Uuid) -> SubtrackResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
