use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::YearMonth;
use crate::error::{SubtrackError, SubtrackResult};

/// A stored subscription row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start_date: YearMonth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<YearMonth>,
}

impl Subscription {
    /// Attaches a store-assigned identifier to validated input.
    pub fn from_new(id: Uuid, new: NewSubscription) -> Self {
        Self {
            id,
            service_name: new.service_name,
            price: new.price,
            user_id: new.user_id,
            start_date: new.start_date,
            end_date: new.end_date,
        }
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    /// True when `month` falls within `[start_date, end_date]`.
    pub fn is_active_in(&self, month: YearMonth) -> bool {
        self.start_date <= month && self.end_date.map_or(true, |end| month <= end)
    }

    /// The mutable fields, without the identifier.
    pub fn fields(&self) -> NewSubscription {
        NewSubscription {
            service_name: self.service_name.clone(),
            price: self.price,
            user_id: self.user_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Every field of a subscription except its identifier. Used both for
/// creation and as the replacement payload of an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start_date: YearMonth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<YearMonth>,
}

impl NewSubscription {
    /// Checks the field constraints. `user_id` must parse as a UUID but is
    /// kept exactly as given. The `end_date >= start_date` ordering is left
    /// unchecked.
    pub fn validate(self) -> SubtrackResult<Self> {
        if self.service_name.trim().is_empty() {
            return Err(SubtrackError::EmptyServiceName);
        }
        if self.price < 0 {
            return Err(SubtrackError::InvalidPrice(self.price.into()));
        }
        parse_user_id(&self.user_id)?;
        Ok(self)
    }
}

/// Loosely-typed input as it arrives from a CLI or transport layer: months
/// and identifiers are still text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDraft {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl TryFrom<SubscriptionDraft> for NewSubscription {
    type Error = SubtrackError;

    fn try_from(draft: SubscriptionDraft) -> Result<Self, Self::Error> {
        let price =
            i32::try_from(draft.price).map_err(|_| SubtrackError::InvalidPrice(draft.price))?;

        NewSubscription {
            service_name: draft.service_name,
            price,
            user_id: draft.user_id,
            start_date: parse_month("start_date", &draft.start_date)?,
            end_date: draft
                .end_date
                .as_deref()
                .map(|raw| parse_month("end_date", raw))
                .transpose()?,
        }
        .validate()
    }
}

pub fn parse_user_id(raw: &str) -> SubtrackResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| SubtrackError::invalid_identifier("user_id", raw))
}

pub fn parse_subscription_id(raw: &str) -> SubtrackResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| SubtrackError::invalid_identifier("id", raw))
}

pub fn parse_month(field: &str, raw: &str) -> SubtrackResult<YearMonth> {
    raw.trim()
        .parse()
        .map_err(|_| SubtrackError::invalid_month(field, raw))
}
