mod cloudflare;
mod provider;

pub use cloudflare::{CloudflareProvider, CLOUDFLARE_API_BASE};
pub use provider::{Credentials, DnsProvider, DnsRecord, RecordUpdate, Zone};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::config::ProviderConfig;

pub fn create_provider(
    name: &str,
    credentials: Credentials,
    config: &ProviderConfig,
) -> Result<Arc<dyn DnsProvider>> {
    match name.to_lowercase().as_str() {
        "cloudflare" => {
            let timeout = config.timeout_seconds.map(Duration::from_secs);
            Ok(Arc::new(CloudflareProvider::new(
                credentials,
                &config.api_base,
                timeout,
            )?))
        }
        _ => Err(anyhow!("Unknown DNS provider: {}", name)),
    }
}
