use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use subtrack_core::{
    parse_month, parse_subscription_id, parse_user_id, NewSubscription, SubscriptionDraft,
    SubscriptionService, SubtrackConfig,
};

use super::{connect, print_json};

#[derive(Args)]
pub struct AddArgs {
    #[arg(short, long, help = "Service name, e.g. \"Yandex Plus\"")]
    pub service: String,

    #[arg(short, long, help = "Monthly price in minor units")]
    pub price: i64,

    #[arg(short, long, help = "Owning user (UUID)")]
    pub user: String,

    #[arg(long, help = "First billed month (YYYY-MM)")]
    pub start: String,

    #[arg(long, help = "Last billed month (YYYY-MM); omit for open-ended")]
    pub end: Option<String>,

    #[arg(
        short,
        long,
        default_value = "text",
        help = "Output format (text, json)"
    )]
    pub format: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(help = "Subscription id")]
    pub id: String,

    #[arg(short, long)]
    pub service: Option<String>,

    #[arg(short, long)]
    pub price: Option<i64>,

    #[arg(short, long)]
    pub user: Option<String>,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long, conflicts_with = "clear_end")]
    pub end: Option<String>,

    #[arg(long, help = "Make the subscription open-ended")]
    pub clear_end: bool,

    #[arg(
        short,
        long,
        default_value = "text",
        help = "Output format (text, json)"
    )]
    pub format: String,
}

pub async fn cmd_add(config: &SubtrackConfig, args: AddArgs) -> anyhow::Result<()> {
    let draft = SubscriptionDraft {
        service_name: args.service,
        price: args.price,
        user_id: args.user,
        start_date: args.start,
        end_date: args.end,
    };
    let new = NewSubscription::try_from(draft)?;

    let conn = connect(config).await?;
    let service = SubscriptionService::new(conn.store());
    let created = service.create(new).await;
    conn.close().await;
    let created = created?;

    if args.format == "json" {
        return print_json(&created);
    }

    println!(
        "{} Added {} ({})",
        "✓".green().bold(),
        created.service_name.bold(),
        created.id.to_string().dimmed()
    );
    Ok(())
}

pub async fn cmd_show(config: &SubtrackConfig, id: &str, format: &str) -> anyhow::Result<()> {
    let id = parse_subscription_id(id)?;

    let conn = connect(config).await?;
    let service = SubscriptionService::new(conn.store());
    let found = service.require(id).await;
    conn.close().await;
    let subscription = found?;

    if format == "json" {
        return print_json(&subscription);
    }

    println!("{}", subscription.service_name.cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  {:<12} {}", "Id:".bold(), subscription.id);
    println!("  {:<12} {}", "User:".bold(), subscription.user_id);
    println!(
        "  {:<12} {}",
        "Price:".bold(),
        subscription.price.to_string().yellow()
    );
    println!("  {:<12} {}", "Start:".bold(), subscription.start_date);
    println!(
        "  {:<12} {}",
        "End:".bold(),
        format_end(subscription.end_date.map(|m| m.to_string()))
    );

    Ok(())
}

pub async fn cmd_update(config: &SubtrackConfig, args: UpdateArgs) -> anyhow::Result<()> {
    let UpdateArgs {
        id,
        service: service_name,
        price,
        user,
        start,
        end,
        clear_end,
        format,
    } = args;
    let id = parse_subscription_id(&id)?;

    // Reject malformed flags before opening a connection.
    if let Some(user) = &user {
        parse_user_id(user)?;
    }
    if let Some(start) = &start {
        parse_month("start_date", start)?;
    }
    if let Some(end) = &end {
        parse_month("end_date", end)?;
    }

    let conn = connect(config).await?;
    let service = SubscriptionService::new(conn.store());

    let result = async {
        let current = service.require(id).await?;

        let draft = SubscriptionDraft {
            service_name: service_name.unwrap_or(current.service_name),
            price: price.unwrap_or_else(|| i64::from(current.price)),
            user_id: user.unwrap_or(current.user_id),
            start_date: start.unwrap_or_else(|| current.start_date.to_string()),
            end_date: if clear_end {
                None
            } else {
                end.or_else(|| current.end_date.map(|m| m.to_string()))
            },
        };

        service.update_from_draft(id, draft).await
    }
    .await;
    conn.close().await;

    match result? {
        Some(updated) if format == "json" => print_json(&updated),
        Some(updated) => {
            println!(
                "{} Updated {} ({})",
                "✓".green().bold(),
                updated.service_name.bold(),
                updated.id.to_string().dimmed()
            );
            Ok(())
        }
        None => {
            println!("{}", "Subscription disappeared before it could be updated.".yellow());
            Ok(())
        }
    }
}

pub async fn cmd_delete(config: &SubtrackConfig, id: &str) -> anyhow::Result<()> {
    let id = parse_subscription_id(id)?;

    let conn = connect(config).await?;
    let service = SubscriptionService::new(conn.store());
    let removed = service.delete(id).await;
    conn.close().await;

    if removed? {
        println!("{} Deleted subscription {}", "✓".green().bold(), id);
    } else {
        println!("{} No subscription with id {}", "!".yellow(), id);
    }
    Ok(())
}

pub async fn cmd_list(
    config: &SubtrackConfig,
    user: Option<&str>,
    format: &str,
) -> anyhow::Result<()> {
    if let Some(user) = user {
        parse_user_id(user)?;
    }

    let conn = connect(config).await?;
    let service =
        SubscriptionService::new(conn.store()).with_list_timeout(config.query_timeout());
    let listed = service.list().await;
    conn.close().await;

    let mut subscriptions = listed?;
    if let Some(user) = user {
        subscriptions.retain(|s| s.user_id == user);
    }

    if format == "json" {
        return print_json(&subscriptions);
    }

    if subscriptions.is_empty() {
        println!("{}", "No subscriptions found.".yellow());
        println!(
            "{}",
            "Add one with 'subtrack add --service <name> --price <n> --user <uuid> --start YYYY-MM'."
                .dimmed()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Id").fg(Color::White),
            Cell::new("Service").fg(Color::White),
            Cell::new("Price").fg(Color::White),
            Cell::new("User").fg(Color::White),
            Cell::new("Start").fg(Color::White),
            Cell::new("End").fg(Color::White),
        ]);

    for s in &subscriptions {
        table.add_row(vec![
            Cell::new(short_id(&s.id.to_string())),
            Cell::new(truncate_string(&s.service_name, 25)),
            Cell::new(s.price.to_string()).fg(Color::Yellow),
            Cell::new(short_id(&s.user_id)),
            Cell::new(s.start_date.to_string()),
            Cell::new(format_end(s.end_date.map(|m| m.to_string()))),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} {}", "Total:".bold(), subscriptions.len());

    Ok(())
}

fn format_end(end: Option<String>) -> String {
    end.unwrap_or_else(|| "open-ended".to_string())
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{}…", head)
    } else {
        s.to_string()
    }
}
