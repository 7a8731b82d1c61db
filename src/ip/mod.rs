mod classify;
mod output;

pub use classify::{AddressClassifier, AddressPolicy};
pub use output::{parse_ip_output, InterfaceAddress, Lifetime};

use std::net::Ipv6Addr;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

const IP_COMMAND: &str = "ip";

/// First usable address in the order `ip` printed them, prefix stripped.
pub fn select_address(output: &str, classifier: &dyn AddressClassifier) -> Option<Ipv6Addr> {
    parse_ip_output(output)
        .into_iter()
        .find(|entry| {
            let usable = classifier.is_usable(entry);
            debug!(
                "Candidate {}/{} usable={}",
                entry.address, entry.prefix_len, usable
            );
            usable
        })
        .map(|entry| entry.address)
}

/// Look up the address to publish for `interface` using `ip -6 addr show`.
pub async fn discover_address(
    interface: &str,
    classifier: &dyn AddressClassifier,
) -> Result<Ipv6Addr> {
    let output = Command::new(IP_COMMAND)
        .args(["-6", "addr", "show", interface])
        .output()
        .await
        .map_err(|e| Error::external_command(format!("Failed to run '{}': {}", IP_COMMAND, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::external_command(format!(
            "'{} -6 addr show {}' exited with {}: {}",
            IP_COMMAND,
            interface,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8(output.stdout)
        .map_err(|e| Error::external_command(format!("Command output is not UTF-8: {}", e)))?;

    select_address(&stdout, classifier).ok_or_else(|| {
        Error::external_command(format!("No usable IPv6 address found on {}", interface))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_dynamic_entry() {
        let output = "2: eno1: <UP> mtu 1500\n    inet6 2001:db8::1/64 scope global dynamic\n       valid_lft 86400sec preferred_lft 14400sec\n";
        let ip = select_address(output, &AddressPolicy::Dynamic);
        assert_eq!(ip, Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_only_permanent_entry_yields_nothing() {
        let output = "2: eno1: <UP> mtu 1500\n    inet6 2001:db8::1/64 scope global\n       valid_lft forever preferred_lft forever\n";
        assert_eq!(select_address(output, &AddressPolicy::Dynamic), None);
    }

    #[test]
    fn test_first_usable_wins() {
        let output = "\
2: eno1: <UP> mtu 1500
    inet6 2001:db8::aaaa/64 scope global
       valid_lft forever preferred_lft forever
    inet6 2001:db8::bbbb/64 scope global temporary dynamic
       valid_lft 600sec preferred_lft 300sec
    inet6 2001:db8::cccc/64 scope global dynamic mngtmpaddr
       valid_lft 600sec preferred_lft 300sec
";
        assert_eq!(
            select_address(output, &AddressPolicy::Dynamic),
            Some("2001:db8::bbbb".parse().unwrap())
        );
        assert_eq!(
            select_address(output, &AddressPolicy::Global),
            Some("2001:db8::aaaa".parse().unwrap())
        );
    }

    #[test]
    fn test_global_policy_passes_over_ula() {
        let output = "\
2: eno1: <UP> mtu 1500
    inet6 fd00:1:2::10/64 scope global dynamic mngtmpaddr
       valid_lft 600sec preferred_lft 300sec
    inet6 2001:db8::10/64 scope global dynamic mngtmpaddr
       valid_lft 600sec preferred_lft 300sec
";
        assert_eq!(
            select_address(output, &AddressPolicy::Global),
            Some("2001:db8::10".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn test_discover_missing_interface_fails() {
        // Either `ip` is absent or it rejects the interface; both are command errors
        let result = discover_address("v6ddns-no-such-if0", &AddressPolicy::Dynamic).await;
        assert!(matches!(result, Err(Error::ExternalCommand(_))));
    }
}
