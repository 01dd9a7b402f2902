pub mod costs;
pub mod subscriptions;

use std::sync::Arc;

use serde::Serialize;
use subtrack_core::{
    Database, DatabaseConfig, SubscriptionRepository, SubscriptionStore, SubtrackConfig,
    SubtrackError,
};

pub use costs::{cmd_total_cost, TotalCostArgs};
pub use subscriptions::{cmd_add, cmd_delete, cmd_list, cmd_show, cmd_update, AddArgs, UpdateArgs};

/// An open pool plus the store built on top of it.
pub struct Connection {
    db: Database,
}

impl Connection {
    pub fn store(&self) -> Arc<dyn SubscriptionStore> {
        Arc::new(SubscriptionRepository::new(self.db.pool().clone()))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

pub async fn connect(config: &SubtrackConfig) -> anyhow::Result<Connection> {
    let db = Database::connect(&DatabaseConfig::from(&config.database))
        .await
        .map_err(SubtrackError::from)?;
    Ok(Connection { db })
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
