//! Hunt HQ CLI
//!
//! Runs the admin API server and drives it remotely: hunt item management,
//! claim-attempt monitoring and rate-limit resets.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use hunt_api::dto::UpdateHuntItemRequest;
use hunt_core::ClearPolicy;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

mod api_client;
mod commands;
mod config;
mod validator;
mod views;

use api_client::{AdminApi, ApiClient, ClaimAttemptFilters};
use commands::{run_server, ServeConfig};
use config::AppConfig;
use validator::ConfigValidator;
use views::{ClaimAttemptsView, HuntItemForm, HuntItemsView, UserHistoryView};

const DEFAULT_CONFIG_PATH: &str = "config/hunt-hq.yaml";

#[derive(Parser)]
#[command(name = "hunt-hq")]
#[command(version)]
#[command(about = "Admin backend and console for scavenger hunts", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "HUNT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// API server URL (for remote commands)
    #[arg(
        long,
        env = "HUNT_API_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    api_url: String,

    /// Admin email used to sign in for remote commands
    #[arg(
        long,
        env = "HUNT_ADMIN_EMAIL",
        default_value = "admin@localhost",
        global = true
    )]
    admin_email: String,

    /// Admin password used to sign in for remote commands
    #[arg(long, env = "HUNT_ADMIN_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Database URL, sqlite:// or postgres:// (overrides database.url)
        #[arg(short, long, env = "DATABASE_URL")]
        database: Option<String>,

        /// Do not serve the OpenAPI document
        #[arg(long)]
        no_docs: bool,

        /// Validate configuration and exit without starting the server
        #[arg(long)]
        validate_only: bool,
    },

    /// Validate configuration
    Validate,

    /// Manage hunt items
    Items {
        #[command(subcommand)]
        action: ItemCommands,
    },

    /// Monitor and clear claim attempts
    Attempts {
        #[command(subcommand)]
        action: AttemptCommands,
    },

    /// Inspect users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Show the admin audit trail
    Audit {
        /// Maximum number of records
        #[arg(short, long, default_value = "50")]
        limit: u32,

        /// Only records that targeted this user email
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// List hunt items
    List,

    /// Create a hunt item
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Claim code players submit
        #[arg(short, long)]
        identifier: String,

        /// Points awarded
        #[arg(short, long, default_value = "0")]
        points: i64,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Update a hunt item (the claim code cannot change)
    Update {
        /// Hunt item ID
        id: Uuid,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        points: Option<i64>,
    },

    /// Delete a hunt item (requires confirmation)
    Delete {
        /// Hunt item ID
        id: Uuid,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AttemptCommands {
    /// List claim attempts across users
    List {
        /// Exact user email
        #[arg(short, long)]
        email: Option<String>,

        /// Failed attempts only
        #[arg(short, long)]
        failed: bool,

        /// Maximum attempts to show
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Clear a user's claim attempts (requires confirmation)
    Clear {
        /// User email
        email: String,

        /// Clear policy: failed, all or rate-limit
        #[arg(short, long, default_value = "rate-limit", value_parser = parse_clear_policy)]
        policy: ClearPolicy,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Show a user's claim history, attempts and rate-limit state
    Show {
        /// User ID
        id: Uuid,
    },
}

fn parse_clear_policy(value: &str) -> Result<ClearPolicy, String> {
    value.parse().map_err(|e: hunt_core::UnknownClearPolicy| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None if config_path.exists() => AppConfig::load(&config_path)?,
        None => AppConfig::default(),
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    hunt_observability::logging::init_logging_with_config(
        hunt_observability::logging::LoggingConfig::from_level_name(level, config.logging.json),
    );

    match cli.command {
        Commands::Serve {
            port,
            host,
            database,
            no_docs,
            validate_only,
        } => {
            let serve_config = ServeConfig::resolve(&config, host, port, database, no_docs);
            cmd_serve(serve_config, config, validate_only).await
        }
        Commands::Validate => cmd_validate(&config_path, config),
        Commands::Items { action } => {
            let api = connect(&cli.api_url, &cli.admin_email, cli.password.as_deref()).await?;
            cmd_items(action, api, cli.format).await
        }
        Commands::Attempts { action } => {
            let api = connect(&cli.api_url, &cli.admin_email, cli.password.as_deref()).await?;
            cmd_attempts(action, api, cli.format).await
        }
        Commands::User { action } => {
            let api = connect(&cli.api_url, &cli.admin_email, cli.password.as_deref()).await?;
            cmd_user(action, api, &config, cli.format).await
        }
        Commands::Audit { limit, user } => {
            let api = connect(&cli.api_url, &cli.admin_email, cli.password.as_deref()).await?;
            cmd_audit(api, limit, user.as_deref(), cli.format).await
        }
    }
}

/// Signs in to the API server for remote commands.
async fn connect(api_url: &str, email: &str, password: Option<&str>) -> Result<Arc<dyn AdminApi>> {
    let password = password
        .context("Admin password required: pass --password or set HUNT_ADMIN_PASSWORD")?;
    let client = ApiClient::new(api_url)?;
    client.health().await.with_context(|| {
        format!(
            "API server at {} is not reachable (is it running? hunt-hq serve)",
            api_url
        )
    })?;
    client
        .login(email, password)
        .await
        .with_context(|| format!("Failed to sign in as {}", email))?;

    let api: Arc<dyn AdminApi> = Arc::new(client);
    Ok(api)
}

/// Asks for a `y` on stdin unless `yes` was given.
fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} {} [y/N] ", "Confirm:".yellow(), prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_view_error(error: Option<&String>) -> Result<()> {
    match error {
        Some(error) => {
            println!("{}: {}", "Error".red(), error);
            std::process::exit(1);
        }
        None => Ok(()),
    }
}

async fn cmd_serve(
    serve_config: ServeConfig,
    mut app_config: AppConfig,
    validate_only: bool,
) -> Result<()> {
    println!("{}", "Validating configuration...".cyan());

    app_config.database.url = serve_config.database_url.clone();
    let validation_result = ConfigValidator::validate(&app_config);
    validation_result.print();

    if validation_result.has_errors() {
        println!();
        println!(
            "{}",
            "Server startup aborted due to configuration errors. Fix the errors above and try again."
                .red()
                .bold()
        );
        std::process::exit(1);
    }

    if validate_only {
        println!();
        println!(
            "{}",
            "Configuration is valid. Server can be started."
                .green()
                .bold()
        );
        return Ok(());
    }

    println!();
    run_server(serve_config, app_config).await
}

fn cmd_validate(config_path: &std::path::Path, config: AppConfig) -> Result<()> {
    println!(
        "Validating configuration: {}",
        config_path.display().to_string().cyan()
    );

    let validation_result = ConfigValidator::validate(&config);
    validation_result.print();

    println!();
    println!("{}", "Configuration Summary".bold());
    println!("─────────────────────");
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.redacted_database_url());
    println!(
        "  Rate limit: {} failed claims per {} min",
        config.rate_limit.max_failed_attempts, config.rate_limit.window_minutes
    );
    println!("  Log level: {}", config.logging.level);

    println!();
    if validation_result.has_errors() {
        println!(
            "{}",
            "Configuration validation failed. Fix the errors above."
                .red()
                .bold()
        );
        std::process::exit(1);
    } else if validation_result.has_warnings() {
        println!(
            "{}",
            "Configuration is valid with warnings. Review the warnings above."
                .yellow()
                .bold()
        );
    } else {
        println!("{}", "Configuration is valid.".green().bold());
    }

    Ok(())
}

async fn cmd_items(
    action: ItemCommands,
    api: Arc<dyn AdminApi>,
    format: OutputFormat,
) -> Result<()> {
    let mut view = HuntItemsView::new(api);

    match action {
        ItemCommands::List => {
            view.refresh().await;
            print_view_error(view.error.as_ref())?;

            if format == OutputFormat::Json {
                return print_json(&view.items);
            }
            println!("{}", "Hunt Items".bold());
            println!("──────────");
            if view.items.is_empty() {
                println!("No hunt items found");
            }
            for item in &view.items {
                println!(
                    "  {} {} [{}] {} pts",
                    item.id.to_string()[..8].cyan(),
                    item.name,
                    item.identifier.as_deref().unwrap_or("hidden"),
                    item.points
                );
            }
        }
        ItemCommands::Create {
            name,
            identifier,
            points,
            description,
        } => {
            view.form = HuntItemForm {
                name,
                description,
                identifier,
                points,
            };
            view.submit_create().await;
            print_view_error(view.error.as_ref())?;

            if let Some(item) = view.items.first() {
                if format == OutputFormat::Json {
                    return print_json(item);
                }
                println!("{} {} ({})", "Created".green(), item.name, item.id);
            }
        }
        ItemCommands::Update {
            id,
            name,
            description,
            points,
        } => {
            view.refresh().await;
            print_view_error(view.error.as_ref())?;

            let changes = UpdateHuntItemRequest {
                name,
                description,
                points,
                identifier: None,
            };
            view.update(id, changes).await;
            print_view_error(view.error.as_ref())?;

            match view.items.iter().find(|item| item.id == id) {
                Some(item) if format == OutputFormat::Json => return print_json(item),
                Some(item) => println!("{} {} ({})", "Updated".green(), item.name, item.id),
                None => println!("{} {}", "Updated".green(), id),
            }
        }
        ItemCommands::Delete { id, yes } => {
            view.refresh().await;
            print_view_error(view.error.as_ref())?;

            let label = view
                .items
                .iter()
                .find(|item| item.id == id)
                .map(|item| format!("'{}'", item.name))
                .unwrap_or_else(|| id.to_string());

            view.request_delete(id);
            if !confirm(&format!("Delete hunt item {}?", label), yes)? {
                view.cancel_delete();
                println!("Aborted");
                return Ok(());
            }
            view.confirm_delete().await;
            print_view_error(view.error.as_ref())?;
            println!("{} {}", "Deleted".green(), label);
        }
    }
    Ok(())
}

async fn cmd_attempts(
    action: AttemptCommands,
    api: Arc<dyn AdminApi>,
    format: OutputFormat,
) -> Result<()> {
    match action {
        AttemptCommands::List {
            email,
            failed,
            limit,
        } => {
            let filters = ClaimAttemptFilters {
                email,
                failed_only: failed,
                limit,
            };
            let mut view = ClaimAttemptsView::new(api, filters);
            view.refresh().await;
            print_view_error(view.error.as_ref())?;

            if format == OutputFormat::Json {
                return print_json(&serde_json::json!({
                    "claimAttempts": view.attempts,
                    "stats": view.stats,
                }));
            }

            println!("{}", "Claim Attempts".bold());
            println!("──────────────");
            println!(
                "  Total: {}  Failed: {}  Successful: {}  Users: {}",
                view.stats.total,
                view.stats.failed.to_string().red(),
                view.stats.successful.to_string().green(),
                view.stats.unique_users
            );
            println!();
            for entry in &view.attempts {
                let outcome = if entry.attempt.success {
                    "ok  ".green()
                } else {
                    "fail".red()
                };
                println!(
                    "  {} [{}] {} {}",
                    entry.attempt.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    outcome,
                    entry.user_email.cyan(),
                    entry.attempt.identifier
                );
            }
        }
        AttemptCommands::Clear { email, policy, yes } => {
            let filters = ClaimAttemptFilters {
                email: Some(email.clone()),
                ..Default::default()
            };
            let mut view = ClaimAttemptsView::new(api, filters);

            view.request_clear(email.clone(), policy);
            let prompt = format!("Clear {} claim attempts for {}?", policy.as_str(), email);
            if !confirm(&prompt, yes)? {
                view.cancel_clear();
                println!("Aborted");
                return Ok(());
            }
            view.confirm_clear().await;
            print_view_error(view.error.as_ref())?;

            if let Some(message) = &view.message {
                println!("{} {}", "✓".green(), message);
            }
            println!(
                "  Remaining: {} attempts, {} failed",
                view.stats.total, view.stats.failed
            );
        }
    }
    Ok(())
}

async fn cmd_user(
    action: UserCommands,
    api: Arc<dyn AdminApi>,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<()> {
    let mut view = UserHistoryView::new(api, config.rate_limit_policy());

    match action {
        UserCommands::Show { id } => {
            view.open(id).await;
            print_view_error(view.error.as_ref())?;

            let now = Utc::now();
            let (Some(user), Some(rate_limit)) = (view.user.as_ref(), view.rate_limit(now)) else {
                return Ok(());
            };

            if format == OutputFormat::Json {
                return print_json(&serde_json::json!({
                    "user": user,
                    "rateLimit": rate_limit,
                }));
            }

            println!("{} {} <{}>", "User:".bold(), user.name, user.email);
            println!("─────────────────────────────────────────");
            println!("  {} {}", "Role:".cyan(), user.role);
            println!("  {} {}", "Points:".cyan(), view.total_points());
            let limited = if rate_limit.is_rate_limited {
                "limited".red()
            } else {
                "ok".green()
            };
            println!(
                "  {} {} ({} recent failures, {} remaining)",
                "Rate limit:".cyan(),
                limited,
                rate_limit.recent_failed_attempts,
                rate_limit.remaining_attempts
            );
            if let Some(resets_at) = rate_limit.resets_at {
                println!("  {} {}", "Resets at:".cyan(), resets_at.format("%H:%M:%S"));
            }

            println!();
            println!("{} ({})", "History".bold(), user.history.len());
            for entry in &user.history {
                println!(
                    "  {} {} +{}",
                    entry.claimed_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.item_name,
                    entry.points
                );
            }

            println!();
            println!("{} ({})", "Claim Attempts".bold(), user.claim_attempts.len());
            for attempt in user.claim_attempts.iter().rev() {
                let outcome = if attempt.success {
                    "ok  ".green()
                } else {
                    "fail".red()
                };
                println!(
                    "  {} [{}] {}",
                    attempt.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    outcome,
                    attempt.identifier
                );
            }
            view.close();
        }
    }
    Ok(())
}

async fn cmd_audit(
    api: Arc<dyn AdminApi>,
    limit: u32,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let records = api.audit_logs(limit, user).await?;

    if format == OutputFormat::Json {
        return print_json(&records);
    }

    println!("{}", "Audit Log".bold());
    println!("─────────");
    if records.is_empty() {
        println!("No audit records found");
    }
    for record in &records {
        println!(
            "  {} {} by {}{}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.action.cyan(),
            record.actor,
            record
                .target_user
                .as_deref()
                .map(|target| format!(" on {}", target))
                .unwrap_or_default()
        );
    }
    Ok(())
}
