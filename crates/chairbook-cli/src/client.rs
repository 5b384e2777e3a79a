use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.server.trim_end_matches('/').to_string(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await.context("request failed")?;
        self.handle_response(resp).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.post_with_idempotency(path, body, None).await
    }

    pub async fn post_with_idempotency<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);

        if let Some(idem_key) = idempotency_key {
            req = req.header("Idempotency-Key", idem_key);
        }

        let resp = req.send().await.context("request failed")?;
        self.handle_response(resp).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .context("request failed")?;
        self.handle_response(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.delete(&url).send().await.context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.context("failed to read response")?;
            bail!(error_message(status, &body));
        }
        Ok(())
    }

    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let body = resp.text().await.context("failed to read response")?;

        if !status.is_success() {
            bail!(error_message(status, &body));
        }

        serde_json::from_str(&body).context("failed to parse response")
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(error) = err.get("error") {
            let code = error
                .get("code")
                .and_then(|c| c.as_str())
                .unwrap_or("unknown");
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return format!("{}: {}", code, message);
        }
    }
    format!("request failed with status {}: {}", status, body)
}
