use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;
use uuid::Uuid;

use super::display_uuid_option;
use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// List notifications for the configured actor
    List {
        #[arg(long, help = "Recipient ID (defaults to the actor)")]
        recipient: Option<Uuid>,
        #[arg(long)]
        unread: bool,
        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Mark a notification as read
    Read {
        id: Uuid,
    },
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Notification {
    pub id: Uuid,
    pub category: String,
    pub content: String,
    #[tabled(display_with = "display_uuid_option")]
    pub appointment_id: Option<Uuid>,
    pub created_at: String,
    #[tabled(display_with = "display_read")]
    pub read_at: Option<String>,
}

fn display_read(r: &Option<String>) -> String {
    if r.is_some() { "yes" } else { "no" }.into()
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::List { recipient, unread, limit } => {
            let recipient = match recipient {
                Some(id) => id,
                None => config.actor()?.id,
            };
            let url = format!(
                "/v1/notifications?recipient_id={}&unread_only={}&limit={}",
                recipient, unread, limit
            );
            let notifications: Vec<Notification> = client.get(&url).await?;
            output::print_items(notifications, format);
        }
        Commands::Read { id } => {
            let notification: Notification = client
                .post(
                    &format!("/v1/notifications/{}/read", id),
                    &json!({ "recipient_id": config.actor()?.id }),
                )
                .await?;
            output::print_item(notification, format);
        }
    }

    Ok(())
}
