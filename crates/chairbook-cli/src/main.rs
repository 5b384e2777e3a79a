mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commands::{appointment, notification, party, schedule, service};
use uuid::Uuid;

use crate::config::Role;

#[derive(Parser)]
#[command(name = "chairbook")]
#[command(about = "Chairbook CLI - Manage schedules and appointments")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "API server URL")]
    server: Option<String>,

    #[arg(long, global = true, conflicts_with = "as_client", help = "Act as this provider")]
    as_provider: Option<Uuid>,

    #[arg(long, global = true, help = "Act as this client")]
    as_client: Option<Uuid>,

    #[arg(long, global = true, help = "Output format", default_value = "table")]
    format: output::Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure CLI settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage providers
    Provider {
        #[command(subcommand)]
        command: party::Commands,
    },
    /// Manage clients
    Client {
        #[command(subcommand)]
        command: party::Commands,
    },
    /// Manage a provider's service catalogue
    Service {
        #[command(subcommand)]
        command: service::Commands,
    },
    /// Manage weekly working hours
    Hours {
        #[command(subcommand)]
        command: schedule::HoursCommands,
    },
    /// Manage blocked dates
    Block {
        #[command(subcommand)]
        command: schedule::BlockCommands,
    },
    /// Show bookable start times for a date
    Slots {
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, help = "Duration in minutes")]
        duration: Option<u32>,
        #[arg(long = "service", help = "Use the summed duration of these services (repeatable)")]
        services: Vec<Uuid>,
    },
    /// Earnings summary for a date range
    Summary {
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Manage appointments
    #[command(alias = "appt")]
    Appointment {
        #[command(subcommand)]
        command: appointment::Commands,
    },
    /// Read notifications
    #[command(alias = "notif")]
    Notification {
        #[command(subcommand)]
        command: notification::Commands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration values
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        actor_id: Option<Uuid>,
        #[arg(long, help = "Default provider for schedule and booking commands")]
        provider_id: Option<Uuid>,
    },
    /// Show current configuration
    Show,
    /// Get config file path
    Path,
}

fn display_opt<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(not set)".into())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::Config::load()?;

    if let Some(server) = &cli.server {
        cfg.server = server.clone();
    }
    if let Some(id) = cli.as_provider {
        cfg.role = Some(Role::Provider);
        cfg.actor_id = Some(id);
    }
    if let Some(id) = cli.as_client {
        cfg.role = Some(Role::Client);
        cfg.actor_id = Some(id);
    }

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Set {
                server,
                role,
                actor_id,
                provider_id,
            } => {
                if let Some(s) = server {
                    cfg.server = s;
                }
                if let Some(r) = role {
                    cfg.role = Some(r);
                }
                if let Some(a) = actor_id {
                    cfg.actor_id = Some(a);
                }
                if let Some(p) = provider_id {
                    cfg.provider_id = Some(p);
                }
                cfg.save()?;
                println!("Configuration saved");
            }
            ConfigCommands::Show => {
                println!("Server:   {}", cfg.server);
                println!(
                    "Role:     {}",
                    cfg.role
                        .map(|r| format!("{:?}", r).to_lowercase())
                        .unwrap_or_else(|| "(not set)".into())
                );
                println!("Actor:    {}", display_opt(&cfg.actor_id));
                println!("Provider: {}", display_opt(&cfg.provider_id));
            }
            ConfigCommands::Path => {
                println!("{}", config::config_path()?.display());
            }
        },
        Commands::Provider { command } => {
            party::run(command, "providers", &cfg, cli.format).await?;
        }
        Commands::Client { command } => {
            party::run(command, "clients", &cfg, cli.format).await?;
        }
        Commands::Service { command } => {
            service::run(command, &cfg, cli.format).await?;
        }
        Commands::Hours { command } => {
            schedule::run_hours(command, &cfg, cli.format).await?;
        }
        Commands::Block { command } => {
            schedule::run_block(command, &cfg, cli.format).await?;
        }
        Commands::Slots {
            provider,
            date,
            duration,
            services,
        } => {
            schedule::run_slots(provider, date, duration, services, &cfg, cli.format).await?;
        }
        Commands::Summary { provider, from, to } => {
            schedule::run_summary(provider, from, to, &cfg, cli.format).await?;
        }
        Commands::Appointment { command } => {
            appointment::run(command, &cfg, cli.format).await?;
        }
        Commands::Notification { command } => {
            notification::run(command, &cfg, cli.format).await?;
        }
    }

    Ok(())
}
