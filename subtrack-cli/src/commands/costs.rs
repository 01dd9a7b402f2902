use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use subtrack_core::{CallOptions, CostAggregator, CostFilter, SubtrackConfig, TotalCostQuery};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{connect, print_json};

#[derive(Args)]
pub struct TotalCostArgs {
    #[arg(short, long, help = "Only subscriptions owned by this user (UUID)")]
    pub user: Option<String>,

    #[arg(short, long, help = "Only subscriptions for this service")]
    pub service: Option<String>,

    #[arg(
        long,
        help = "Window start (YYYY-MM); subscriptions starting earlier are excluded"
    )]
    pub from: Option<String>,

    #[arg(
        long,
        help = "Window end (YYYY-MM); subscriptions ending later are excluded"
    )]
    pub to: Option<String>,

    #[arg(
        short,
        long,
        default_value = "text",
        help = "Output format (text, json)"
    )]
    pub format: String,
}

impl TotalCostArgs {
    fn query(&self) -> TotalCostQuery {
        TotalCostQuery {
            user_id: self.user.clone(),
            service_name: self.service.clone(),
            start_window: self.from.clone(),
            end_window: self.to.clone(),
        }
    }
}

pub async fn cmd_total_cost(config: &SubtrackConfig, args: TotalCostArgs) -> anyhow::Result<()> {
    // Validated up front so bad input never needs a connection.
    let filter = args.query().into_filter()?;

    let conn = connect(config).await?;
    let aggregator = CostAggregator::new(conn.store()).with_timeout(config.query_timeout());

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received, cancelling query");
                cancel.cancel();
            }
        })
    };

    let total = aggregator
        .total_for_filter(&filter, &CallOptions::new().with_cancel(cancel))
        .await;
    ctrl_c.abort();
    conn.close().await;
    let total = total?;

    if args.format == "json" {
        return print_json(&total);
    }

    println!("{}", "Total Cost".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Filter").fg(Color::White),
            Cell::new("Value").fg(Color::White),
        ]);

    for (label, value) in describe_filter(&filter) {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(total.total_cost.to_string()).fg(Color::Yellow),
    ]);

    println!("{table}");
    Ok(())
}

fn describe_filter(filter: &CostFilter) -> Vec<(&'static str, String)> {
    let any = || "any".to_string();
    vec![
        (
            "User",
            filter.user_id.clone().unwrap_or_else(any),
        ),
        (
            "Service",
            filter.service_name.clone().unwrap_or_else(any),
        ),
        (
            "From",
            filter
                .start_window
                .map(|m| m.to_string())
                .unwrap_or_else(any),
        ),
        (
            "To",
            filter.end_window.map(|m| m.to_string()).unwrap_or_else(any),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_filter_defaults_to_any() {
        let rows = describe_filter(&CostFilter::default());
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|(_, v)| v == "any"));
    }

    #[test]
    fn test_describe_filter_shows_window() {
        let filter = TotalCostQuery::new()
            .window("2025-01", "2025-03")
            .into_filter()
            .unwrap();
        let rows = describe_filter(&filter);
        assert_eq!(rows[2], ("From", "2025-01".to_string()));
        assert_eq!(rows[3], ("To", "2025-03".to_string()));
    }
}
