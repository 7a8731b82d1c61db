use std::fmt;

use serde::{Deserialize, Serialize};

use super::output::InterfaceAddress;

/// Decides whether an interface address may be published.
pub trait AddressClassifier: Send + Sync {
    fn is_usable(&self, entry: &InterfaceAddress) -> bool;
}

impl<F> AddressClassifier for F
where
    F: Fn(&InterfaceAddress) -> bool + Send + Sync,
{
    fn is_usable(&self, entry: &InterfaceAddress) -> bool {
        self(entry)
    }
}

/// Built-in selection policies, chosen by `address_policy` in the config.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AddressPolicy {
    /// Skip entries with a `forever` lifetime, leaving the
    /// router-assigned dynamic/temporary addresses.
    #[default]
    Dynamic,
    /// Any publicly routable global-scope address: link-local and
    /// unique-local (fc00::/7) entries are skipped.
    Global,
}

impl AddressClassifier for AddressPolicy {
    fn is_usable(&self, entry: &InterfaceAddress) -> bool {
        match self {
            AddressPolicy::Dynamic => !entry.is_permanent(),
            AddressPolicy::Global => {
                !entry.is_link_local()
                    && !entry.is_unique_local()
                    && entry.scope.as_deref().map_or(true, |s| s == "global")
            }
        }
    }
}

impl fmt::Display for AddressPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressPolicy::Dynamic => write!(f, "dynamic"),
            AddressPolicy::Global => write!(f, "global"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::output::Lifetime;

    fn entry(addr: &str, scope: &str, lft: Lifetime) -> InterfaceAddress {
        InterfaceAddress {
            address: addr.parse().unwrap(),
            prefix_len: 64,
            scope: Some(scope.to_string()),
            flags: Vec::new(),
            valid_lft: Some(lft),
            preferred_lft: Some(lft),
        }
    }

    #[test]
    fn test_dynamic_policy_skips_permanent() {
        let permanent = entry("2001:db8::1", "global", Lifetime::Forever);
        let dynamic = entry("2001:db8::2", "global", Lifetime::Seconds(600));

        assert!(!AddressPolicy::Dynamic.is_usable(&permanent));
        assert!(AddressPolicy::Dynamic.is_usable(&dynamic));
    }

    #[test]
    fn test_global_policy_accepts_permanent_global() {
        let permanent = entry("2001:db8::1", "global", Lifetime::Forever);
        let link_local = entry("fe80::1", "link", Lifetime::Forever);

        assert!(AddressPolicy::Global.is_usable(&permanent));
        assert!(!AddressPolicy::Global.is_usable(&link_local));
    }

    #[test]
    fn test_global_policy_skips_unique_local() {
        let ula = entry("fd12:3456:789a::1", "global", Lifetime::Seconds(600));
        let ula_fc = entry("fc00::5", "global", Lifetime::Forever);

        assert!(!AddressPolicy::Global.is_usable(&ula));
        assert!(!AddressPolicy::Global.is_usable(&ula_fc));
        // the dynamic policy only looks at lifetimes
        assert!(AddressPolicy::Dynamic.is_usable(&ula));
    }

    #[test]
    fn test_closure_classifier() {
        let only_temporary = |e: &InterfaceAddress| e.has_flag("temporary");
        let mut e = entry("2001:db8::3", "global", Lifetime::Seconds(10));
        assert!(!only_temporary.is_usable(&e));
        e.flags.push("temporary".to_string());
        assert!(only_temporary.is_usable(&e));
    }

    #[test]
    fn test_policy_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: AddressPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"global\"").unwrap();
        assert_eq!(w.policy, AddressPolicy::Global);
    }
}
