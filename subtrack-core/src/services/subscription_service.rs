use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use super::cancellation::{run_cancellable, CallOptions};
use crate::error::{SubtrackError, SubtrackResult};
use crate::models::{NewSubscription, Subscription, SubscriptionDraft};
use crate::repo::SubscriptionStore;

/// Lifecycle operations on subscriptions. Inputs are validated here before
/// they reach the store.
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    list_timeout: Option<Duration>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            list_timeout: None,
        }
    }

    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = Some(timeout);
        self
    }

    pub async fn create(&self, new: NewSubscription) -> SubtrackResult<Subscription> {
        let new = new.validate()?;
        let created = self.store.create(&new).await?;
        info!(
            id = %created.id,
            service_name = %created.service_name,
            user_id = %created.user_id,
            "Created subscription"
        );
        Ok(created)
    }

    pub async fn create_from_draft(&self, draft: SubscriptionDraft) -> SubtrackResult<Subscription> {
        let new = NewSubscription::try_from(draft)?;
        self.create(new).await
    }

    pub async fn get(&self, id: Uuid) -> SubtrackResult<Option<Subscription>> {
        debug!(%id, "Fetching subscription");
        self.store.get_by_id(id).await
    }

    /// Like [`get`](Self::get) but turns absence into `SubscriptionNotFound`.
    pub async fn require(&self, id: Uuid) -> SubtrackResult<Subscription> {
        self.get(id)
            .await?
            .ok_or_else(|| SubtrackError::SubscriptionNotFound(id.to_string()))
    }

    /// Replaces every mutable field of subscription `id` with `fields`.
    ///
    /// Returns the stored record, or `None` when no subscription has that id.
    /// A missing row is not an error and nothing is written.
    pub async fn update(
        &self,
        id: Uuid,
        fields: NewSubscription,
    ) -> SubtrackResult<Option<Subscription>> {
        let fields = fields.validate()?;
        let record = Subscription::from_new(id, fields);

        if self.store.update(&record).await? {
            debug!(%id, "Updated subscription");
            Ok(Some(record))
        } else {
            debug!(%id, "Update matched no subscription");
            Ok(None)
        }
    }

    pub async fn update_from_draft(
        &self,
        id: Uuid,
        draft: SubscriptionDraft,
    ) -> SubtrackResult<Option<Subscription>> {
        let fields = NewSubscription::try_from(draft)?;
        self.update(id, fields).await
    }

    /// Idempotent. Returns whether a row was actually removed.
    pub async fn delete(&self, id: Uuid) -> SubtrackResult<bool> {
        let removed = self.store.delete(id).await?;
        debug!(%id, removed, "Deleted subscription");
        Ok(removed)
    }

    pub async fn list(&self) -> SubtrackResult<Vec<Subscription>> {
        self.list_with(&CallOptions::new()).await
    }

    pub async fn list_with(&self, options: &CallOptions) -> SubtrackResult<Vec<Subscription>> {
        let options = options.clone().or_timeout(self.list_timeout);
        let records = run_cancellable("list", &options, self.store.get_all()).await?;
        debug!(count = records.len(), "Listed subscriptions");
        Ok(records)
    }
}
