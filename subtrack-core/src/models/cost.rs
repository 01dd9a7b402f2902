use serde::{Deserialize, Serialize};

use super::subscription::{parse_month, parse_user_id};
use super::{Subscription, YearMonth};
use crate::error::SubtrackResult;

/// Filter input for a total-cost query as received at the boundary. Every
/// field is optional; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCostQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default, alias = "start_date")]
    pub start_window: Option<String>,
    #[serde(default, alias = "end_date")]
    pub end_window: Option<String>,
}

impl TotalCostQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_window = Some(start.into());
        self.end_window = Some(end.into());
        self
    }

    /// Validates every field and produces the typed filter. Fails before any
    /// store access when an identifier or month is malformed.
    pub fn into_filter(self) -> SubtrackResult<CostFilter> {
        Ok(CostFilter {
            user_id: non_blank(self.user_id)
                .map(|raw| parse_user_id(&raw).map(|_| raw))
                .transpose()?,
            service_name: non_blank(self.service_name),
            start_window: non_blank(self.start_window)
                .map(|raw| parse_month("start_date", &raw))
                .transpose()?,
            end_window: non_blank(self.end_window)
                .map(|raw| parse_month("end_date", &raw))
                .transpose()?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validated total-cost filter.
///
/// A record matches when it starts no earlier than `start_window` and either
/// has no end date or ends no later than `end_window`. This is a containment
/// test, not an overlap test: a subscription that began before the window is
/// excluded even if it is still running inside it. Absent bounds and absent
/// user/service filters do not constrain. `user_id` is compared as text
/// against the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostFilter {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub start_window: Option<YearMonth>,
    pub end_window: Option<YearMonth>,
}

impl CostFilter {
    pub fn matches(&self, subscription: &Subscription) -> bool {
        if let Some(user_id) = &self.user_id {
            if &subscription.user_id != user_id {
                return false;
            }
        }
        if let Some(service_name) = &self.service_name {
            if &subscription.service_name != service_name {
                return false;
            }
        }
        if let Some(start) = self.start_window {
            if subscription.start_date < start {
                return false;
            }
        }
        match (subscription.end_date, self.end_window) {
            (Some(end_date), Some(end)) => end_date <= end,
            _ => true,
        }
    }
}

/// Result of a total-cost query, serialized as `{"total_cost": n}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCost {
    pub total_cost: i64,
}

impl TotalCost {
    pub fn new(total_cost: i64) -> Self {
        Self { total_cost }
    }
}
