mod cost;
mod month;
mod subscription;

pub use cost::{CostFilter, TotalCost, TotalCostQuery};
pub use month::{ParseYearMonthError, YearMonth};
pub use subscription::{
    parse_month, parse_subscription_id, parse_user_id, NewSubscription, Subscription,
    SubscriptionDraft,
};
