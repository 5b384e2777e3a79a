use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::{Actor, Config, Role};
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Book an appointment
    Book {
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, help = "Start time, HH:MM")]
        start: String,
        #[arg(long = "service", required = true, help = "Service ID (repeatable)")]
        services: Vec<Uuid>,
        #[arg(long, help = "Book for a registered client (providers only; clients book for themselves)")]
        client: Option<Uuid>,
        #[arg(long, conflicts_with = "client", help = "Book for a walk-in guest (providers only)")]
        guest: Option<String>,
        #[arg(long, help = "Idempotency key to prevent duplicates")]
        idempotency_key: Option<String>,
    },
    /// Get appointment details
    Get {
        id: Uuid,
    },
    /// List appointments
    List {
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long)]
        client: Option<Uuid>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, help = "pending, confirmed, completed, cancelled_by_client or cancelled_by_provider")]
        status: Option<String>,
        #[arg(long, default_value = "50")]
        limit: i64,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// Confirm a pending appointment
    Confirm { id: Uuid },
    /// Mark an appointment as completed
    Complete { id: Uuid },
    /// Cancel an appointment
    Cancel { id: Uuid },
    /// Move an appointment to a new date, time or service set
    Reschedule {
        id: Uuid,
        #[arg(long, help = "Move to another provider")]
        provider: Option<Uuid>,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, help = "Start time, HH:MM")]
        start: String,
        #[arg(long = "service", required = true, help = "Service ID (repeatable)")]
        services: Vec<Uuid>,
    },
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Appointment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[tabled(display_with = "display_client")]
    pub client: Value,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_value: Decimal,
}

fn display_client(client: &Value) -> String {
    match client["kind"].as_str() {
        Some("guest") => format!("guest: {}", client["name"].as_str().unwrap_or("?")),
        Some("registered") => client["id"].as_str().unwrap_or("?").to_string(),
        _ => "-".into(),
    }
}

/// The `client` block of a booking, given who is booking.
fn booking_client(actor: Actor, client: Option<Uuid>, guest: Option<String>) -> Result<Value> {
    match (actor.role, client, guest) {
        (Role::Client, None, None) => Ok(json!({ "kind": "registered", "id": actor.id })),
        (Role::Client, _, _) => bail!("clients can only book for themselves"),
        (Role::Provider, Some(id), None) => Ok(json!({ "kind": "registered", "id": id })),
        (Role::Provider, None, Some(name)) => Ok(json!({ "kind": "guest", "name": name })),
        (Role::Provider, _, _) => bail!("pass either --client or --guest"),
    }
}

async fn transition(client: &ApiClient, config: &Config, id: Uuid, action: &str, format: Format) -> Result<()> {
    let appointment: Appointment = client
        .post(
            &format!("/v1/appointments/{}/{}", id, action),
            &json!({ "actor": config.actor()? }),
        )
        .await?;
    output::print_item(appointment, format);
    Ok(())
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Book {
            provider,
            date,
            start,
            services,
            client: client_id,
            guest,
            idempotency_key,
        } => {
            let actor = config.actor()?;
            let provider = config.provider(provider)?;
            let req = json!({
                "actor": actor,
                "provider_id": provider,
                "client": booking_client(actor, client_id, guest)?,
                "date": date,
                "start_time": start,
                "service_ids": services,
            });
            let appointment: Appointment = client
                .post_with_idempotency("/v1/appointments", &req, idempotency_key.as_deref())
                .await?;
            output::print_created(appointment, format);
        }
        Commands::Get { id } => {
            let appointment: Appointment = client.get(&format!("/v1/appointments/{}", id)).await?;
            output::print_item(appointment, format);
        }
        Commands::List {
            provider,
            client: client_id,
            date,
            status,
            limit,
            offset,
        } => {
            let mut url = format!("/v1/appointments?limit={}", limit);
            if let Some(p) = provider {
                url.push_str(&format!("&provider_id={}", p));
            }
            if let Some(c) = client_id {
                url.push_str(&format!("&client_id={}", c));
            }
            if let Some(d) = date {
                url.push_str(&format!("&date={}", d));
            }
            if let Some(s) = status {
                url.push_str(&format!("&status={}", s));
            }
            if let Some(off) = offset {
                url.push_str(&format!("&offset={}", off));
            }
            let appointments: Vec<Appointment> = client.get(&url).await?;
            output::print_items(appointments, format);
        }
        Commands::Confirm { id } => transition(&client, config, id, "confirm", format).await?,
        Commands::Complete { id } => transition(&client, config, id, "complete", format).await?,
        Commands::Cancel { id } => transition(&client, config, id, "cancel", format).await?,
        Commands::Reschedule {
            id,
            provider,
            date,
            start,
            services,
        } => {
            let req = json!({
                "actor": config.actor()?,
                "provider_id": provider,
                "date": date,
                "start_time": start,
                "service_ids": services,
            });
            let appointment: Appointment = client
                .post(&format!("/v1/appointments/{}/reschedule", id), &req)
                .await?;
            output::print_item(appointment, format);
        }
    }

    Ok(())
}
