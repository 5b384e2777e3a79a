use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new one
    Create {
        #[arg(long)]
        name: String,
    },
    /// Show details
    Get {
        id: Uuid,
    },
}

#[derive(Debug, Serialize)]
struct CreateRequest {
    name: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Party {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

/// Providers and clients share the same shape; `collection` picks which.
pub async fn run(cmd: Commands, collection: &str, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Create { name } => {
            let party: Party = client
                .post(&format!("/v1/{}", collection), &CreateRequest { name })
                .await?;
            output::print_created(party, format);
        }
        Commands::Get { id } => {
            let party: Party = client.get(&format!("/v1/{}/{}", collection, id)).await?;
            output::print_item(party, format);
        }
    }

    Ok(())
}
