use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Provider,
}

/// Who the CLI acts as. Sent with every mutating request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Actor {
    pub role: Role,
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server")]
    pub server: String,
    pub role: Option<Role>,
    pub actor_id: Option<Uuid>,
    /// Provider used when a command does not name one.
    pub provider_id: Option<Uuid>,
}

fn default_server() -> String {
    "http://localhost:8080".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
            role: None,
            actor_id: None,
            provider_id: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("could not find config directory")?
        .join("chairbook");
    Ok(dir.join("config.toml"))
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn actor(&self) -> Result<Actor> {
        match (self.role, self.actor_id) {
            (Some(role), Some(id)) => Ok(Actor { role, id }),
            _ => bail!("no actor configured; pass --as-provider/--as-client or run `chairbook config set`"),
        }
    }

    /// `explicit`, else the configured provider, else the actor when acting
    /// as a provider.
    pub fn provider(&self, explicit: Option<Uuid>) -> Result<Uuid> {
        if let Some(id) = explicit.or(self.provider_id) {
            return Ok(id);
        }
        match (self.role, self.actor_id) {
            (Some(Role::Provider), Some(id)) => Ok(id),
            _ => bail!("no provider given; pass --provider or set a default with `chairbook config set`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_falls_back_to_provider_actor() {
        let id = Uuid::new_v4();
        let cfg = Config {
            role: Some(Role::Provider),
            actor_id: Some(id),
            ..Config::default()
        };
        assert_eq!(cfg.provider(None).unwrap(), id);

        let explicit = Uuid::new_v4();
        assert_eq!(cfg.provider(Some(explicit)).unwrap(), explicit);
    }

    #[test]
    fn test_client_actor_needs_explicit_provider() {
        let cfg = Config {
            role: Some(Role::Client),
            actor_id: Some(Uuid::new_v4()),
            ..Config::default()
        };
        assert!(cfg.provider(None).is_err());
        assert!(Config::default().actor().is_err());
    }

    #[test]
    fn test_actor_serializes_like_the_server_expects() {
        let id = Uuid::nil();
        let json = serde_json::to_value(Actor { role: Role::Provider, id }).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "provider", "id": id }));
    }
}
