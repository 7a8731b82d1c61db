use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Clone)]
pub struct Credentials {
    pub api_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    // unrelated record types may omit these
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

/// Full replacement body for a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl RecordUpdate {
    /// Point `record` at `content`, keeping its ttl and proxied settings.
    pub fn from_existing(record: &DnsRecord, name: &str, content: &str) -> Self {
        Self {
            record_type: record.record_type.clone(),
            name: name.to_string(),
            content: content.to_string(),
            ttl: record.ttl,
            proxied: record.proxied,
        }
    }
}

#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up a zone by its exact name; the first result wins
    async fn find_zone(&self, name: &str) -> Result<Zone>;

    /// List every record in a zone, in provider order
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>>;

    /// Replace a record and return the provider's confirmation unmodified
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<Value>;

    fn provider_name(&self) -> &'static str;
}
