use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use subtrack_core::{CliErrorDisplay, SubtrackConfig, SubtrackError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{
    cmd_add, cmd_delete, cmd_list, cmd_show, cmd_total_cost, cmd_update, connect, AddArgs,
    TotalCostArgs, UpdateArgs,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "subtrack")]
#[command(version = VERSION)]
#[command(about = "Subtrack - track paid subscriptions and what they cost")]
#[command(long_about = r#"
Subtrack records per-user paid subscriptions (service, monthly price, first and
last billed month) in Postgres and sums their prices over a filtered window.

Use 'subtrack init' to run migrations, 'subtrack add' to record a subscription
and 'subtrack total-cost' to aggregate.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Initialize the database and run migrations")]
    Init,

    #[command(about = "Record a new subscription")]
    Add(AddArgs),

    #[command(about = "Show a single subscription")]
    Show {
        #[arg(help = "Subscription id")]
        id: String,

        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },

    #[command(about = "Change fields of an existing subscription")]
    Update(UpdateArgs),

    #[command(about = "Delete a subscription (no-op if it does not exist)")]
    Delete {
        #[arg(help = "Subscription id")]
        id: String,
    },

    #[command(about = "List subscriptions")]
    List {
        #[arg(short, long, help = "Only subscriptions owned by this user (UUID)")]
        user: Option<String>,

        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },

    #[command(about = "Sum subscription prices over a filtered window")]
    TotalCost(TotalCostArgs),

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Version needs no configuration, so a broken config cannot hide it.
    let result = match cli.command {
        Commands::Version { detailed } => {
            init_logging(cli.verbose, false);
            cmd_version(detailed)
        }
        command => {
            let config = SubtrackConfig::load();
            let json_logs = config
                .as_ref()
                .map(|c| c.logging.json_format)
                .unwrap_or(false);
            init_logging(cli.verbose, json_logs);

            match config {
                Ok(config) => run(command, config).await,
                Err(e) => Err(SubtrackError::from(e).into()),
            }
        }
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SubtrackError>() {
                Some(err) => {
                    err.log();
                    eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(err));
                }
                None => eprintln!("{}: {}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(command: Commands, config: SubtrackConfig) -> anyhow::Result<()> {
    match command {
        Commands::Init => cmd_init(&config).await,
        Commands::Add(args) => cmd_add(&config, args).await,
        Commands::Show { id, format } => cmd_show(&config, &id, &format).await,
        Commands::Update(args) => cmd_update(&config, args).await,
        Commands::Delete { id } => cmd_delete(&config, &id).await,
        Commands::List { user, format } => cmd_list(&config, user.as_deref(), &format).await,
        Commands::TotalCost(args) => cmd_total_cost(&config, args).await,
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

async fn cmd_init(config: &SubtrackConfig) -> anyhow::Result<()> {
    println!("{}", "Initializing Subtrack...".cyan().bold());
    println!();

    println!(
        "  {} Database URL: {}",
        "→".blue(),
        mask_password(config.database_url())
    );

    println!("  {} Connecting to database...", "→".blue());
    let conn = connect(config).await?;

    println!("  {} Running migrations...", "→".blue());
    let migrated = conn.database().run_migrations().await;

    println!("  {} Verifying connection...", "→".blue());
    let healthy = conn.database().health_check().await;

    conn.close().await;
    migrated.map_err(SubtrackError::from)?;
    healthy.map_err(SubtrackError::from)?;

    println!();
    println!(
        "{} {}",
        "✓".green().bold(),
        "Database initialized successfully!".green()
    );

    Ok(())
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Subtrack Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("subtrack {}", VERSION);
    }

    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let before_auth = &url[..proto_end + 3];
            let after_at = &url[at_pos..];
            if let Some(colon_pos) = url[proto_end + 3..at_pos].find(':') {
                let user = &url[proto_end + 3..proto_end + 3 + colon_pos];
                return format!("{}{}:****{}", before_auth, user, after_at);
            }
        }
    }
    url.to_string()
}
