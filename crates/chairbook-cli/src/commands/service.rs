use anyhow::Result;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a service to a provider's catalogue
    Add {
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Duration in minutes")]
        duration: u32,
        #[arg(long)]
        price: Decimal,
    },
    /// List a provider's services
    List {
        #[arg(long)]
        provider: Option<Uuid>,
    },
}

#[derive(Debug, Serialize)]
struct CreateRequest {
    name: String,
    duration_minutes: u32,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    #[tabled(display_with = "display_minutes")]
    pub duration_minutes: Option<i32>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

fn display_minutes(m: &Option<i32>) -> String {
    m.map(|m| format!("{} min", m)).unwrap_or_else(|| "-".into())
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Add {
            provider,
            name,
            duration,
            price,
        } => {
            let provider = config.provider(provider)?;
            let req = CreateRequest {
                name,
                duration_minutes: duration,
                price,
            };
            let service: Service = client
                .post(&format!("/v1/providers/{}/services", provider), &req)
                .await?;
            output::print_created(service, format);
        }
        Commands::List { provider } => {
            let provider = config.provider(provider)?;
            let services: Vec<Service> = client
                .get(&format!("/v1/providers/{}/services", provider))
                .await?;
            output::print_items(services, format);
        }
    }

    Ok(())
}
