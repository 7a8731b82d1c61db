use std::net::Ipv6Addr;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::dns::{DnsProvider, DnsRecord, RecordUpdate};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

const AAAA: &str = "AAAA";

/// The record being kept in sync: `<subdomain>.<domain>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    pub domain: String,
    pub subdomain: String,
}

impl RecordTarget {
    pub fn new(domain: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: subdomain.into(),
        }
    }

    /// Fully-qualified record name. An empty or `@` subdomain is the zone apex.
    pub fn fqdn(&self) -> String {
        match self.subdomain.as_str() {
            "" | "@" => self.domain.clone(),
            sub => format!("{}.{}", sub, self.domain),
        }
    }
}

pub fn validate_address(input: &str) -> Result<Ipv6Addr> {
    input
        .parse::<Ipv6Addr>()
        .map_err(|_| Error::invalid_address(input))
}

/// First AAAA record named `fqdn`, in provider order.
pub fn locate_record<'a>(records: &'a [DnsRecord], fqdn: &str) -> Result<&'a DnsRecord> {
    let mut matches = records
        .iter()
        .filter(|r| r.record_type == AAAA && r.name == fqdn);

    let record = matches
        .next()
        .ok_or_else(|| Error::not_found(format!("No AAAA record found for {}", fqdn)))?;

    let extra = matches.count();
    if extra > 0 {
        warn!(
            "{} AAAA records match {}, updating the first ({})",
            extra + 1,
            fqdn,
            record.id
        );
    }

    Ok(record)
}

/// Resolve the zone and return the currently published AAAA record.
pub async fn fetch_record(
    provider: &dyn DnsProvider,
    target: &RecordTarget,
    retry: &RetryPolicy,
) -> Result<DnsRecord> {
    let domain = target.domain.as_str();
    let zone = retry
        .run("Zone lookup", move || provider.find_zone(domain))
        .await?;
    debug!("Zone {} has id {}", zone.name, zone.id);

    let zone_id = zone.id.as_str();
    let records = retry
        .run("Record listing", move || provider.list_records(zone_id))
        .await?;

    locate_record(&records, &target.fqdn()).cloned()
}

/// Point the target's AAAA record at `new_address`.
///
/// Runs validate, zone lookup, record listing, locate and update in order and
/// stops at the first failure. ttl and proxied are carried over from the
/// existing record. Returns the provider's confirmation payload as received.
pub async fn update_ipv6_record(
    provider: &dyn DnsProvider,
    target: &RecordTarget,
    new_address: &str,
    retry: &RetryPolicy,
) -> Result<Value> {
    let address = validate_address(new_address)?;

    let domain = target.domain.as_str();
    let zone = retry
        .run("Zone lookup", move || provider.find_zone(domain))
        .await?;
    debug!("Zone {} has id {}", domain, zone.id);

    let zone_id = zone.id.as_str();
    let records = retry
        .run("Record listing", move || provider.list_records(zone_id))
        .await?;
    debug!("Zone {} holds {} records", domain, records.len());

    let fqdn = target.fqdn();
    let record = locate_record(&records, &fqdn)?;

    if record.content == address.to_string() {
        info!("{} already points to {}, rewriting anyway", fqdn, address);
    } else {
        info!("Updating {} from {} to {}", fqdn, record.content, address);
    }

    let update = RecordUpdate::from_existing(record, &fqdn, &address.to_string());
    let record_id = record.id.as_str();
    let update = &update;
    let payload = retry
        .run("Record update", move || {
            provider.update_record(zone_id, record_id, update)
        })
        .await?;

    info!("Updated {} via {}", fqdn, provider.provider_name());
    Ok(payload)
}
