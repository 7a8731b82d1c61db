use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::provider::{Credentials, DnsProvider, DnsRecord, RecordUpdate, Zone};
use crate::error::{Error, Result};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

pub struct CloudflareProvider {
    client: Client,
    credentials: Credentials,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<Value>,
}

impl CloudflareProvider {
    /// Without a timeout the transport defaults apply.
    pub fn new(credentials: Credentials, api_base: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.credentials.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        Ok(response)
    }

    async fn ensure_success(response: Response, context: &str) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote(context, Some(status.as_u16()), body));
        }
        Ok(response)
    }
}

fn errors_text(errors: &[Value]) -> String {
    serde_json::to_string(errors).unwrap_or_default()
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn find_zone(&self, name: &str) -> Result<Zone> {
        let url = format!("{}/zones", self.api_base);
        debug!("Looking up zone {}", name);

        let response = self.get(&url, &[("name", name)]).await?;
        let response = Self::ensure_success(response, "Failed to fetch zone data").await?;
        let parsed: ApiResponse<Vec<Zone>> = response.json().await?;

        if !parsed.success {
            return Err(Error::remote(
                "Cloudflare API error while fetching zones",
                None,
                errors_text(&parsed.errors),
            ));
        }

        let zones = parsed.result.unwrap_or_default();
        if zones.len() > 1 {
            tracing::warn!(
                "{} zones returned for {}, using the first",
                zones.len(),
                name
            );
        }

        zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("No zones found for the given domain: {}", name)))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/zones/{}/dns_records", self.api_base, zone_id);
        debug!("Listing records for zone {}", zone_id);

        let response = self.get(&url, &[]).await?;
        let response = Self::ensure_success(response, "Failed to fetch DNS records").await?;
        let parsed: ApiResponse<Vec<DnsRecord>> = response.json().await?;

        if !parsed.success {
            return Err(Error::remote(
                "Cloudflare API error while listing records",
                None,
                errors_text(&parsed.errors),
            ));
        }

        Ok(parsed.result.unwrap_or_default())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<Value> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, zone_id, record_id
        );
        debug!("Updating record {} in zone {}", record_id, zone_id);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.credentials.api_token)
            .header("Content-Type", "application/json")
            .json(update)
            .send()
            .await?;
        let response = Self::ensure_success(response, "Failed to update DNS record").await?;
        let payload: Value = response.json().await?;

        if payload.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(Error::remote(
                "Failed to update DNS record",
                None,
                payload.to_string(),
            ));
        }

        Ok(payload)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
