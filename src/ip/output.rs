use std::net::Ipv6Addr;

/// Remaining lifetime of an interface address as reported by `ip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Forever,
    Seconds(u64),
}

impl Lifetime {
    fn parse(token: &str) -> Option<Self> {
        if token == "forever" {
            return Some(Lifetime::Forever);
        }
        token
            .strip_suffix("sec")
            .and_then(|n| n.parse().ok())
            .map(Lifetime::Seconds)
    }
}

/// One `inet6` entry from `ip -6 addr show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub address: Ipv6Addr,
    pub prefix_len: u8,
    pub scope: Option<String>,
    pub flags: Vec<String>,
    pub valid_lft: Option<Lifetime>,
    pub preferred_lft: Option<Lifetime>,
}

impl InterfaceAddress {
    /// Non-expiring entry, e.g. a static or stable-privacy address.
    pub fn is_permanent(&self) -> bool {
        self.valid_lft == Some(Lifetime::Forever) || self.preferred_lft == Some(Lifetime::Forever)
    }

    pub fn is_link_local(&self) -> bool {
        (self.address.segments()[0] & 0xffc0) == 0xfe80
    }

    /// fc00::/7, which `ip` still labels `scope global`.
    pub fn is_unique_local(&self) -> bool {
        (self.address.segments()[0] & 0xfe00) == 0xfc00
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Parse the text printed by `ip -6 addr show <iface>`.
///
/// Every line starting with `inet6` opens a new entry; the lines below it
/// (lifetimes) belong to the same entry. Text before the first `inet6` line
/// is the interface header and is ignored, as are entries that carry no
/// `<address>/<prefix>` token.
pub fn parse_ip_output(output: &str) -> Vec<InterfaceAddress> {
    let mut segments: Vec<Vec<&str>> = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("inet6") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                segments.push(rest.split_whitespace().collect());
                continue;
            }
        }
        if let Some(current) = segments.last_mut() {
            current.extend(trimmed.split_whitespace());
        }
    }

    segments.iter().filter_map(|tokens| parse_segment(tokens)).collect()
}

fn parse_segment(tokens: &[&str]) -> Option<InterfaceAddress> {
    let (index, address, prefix_len) = tokens
        .iter()
        .enumerate()
        .find_map(|(i, token)| parse_cidr(token).map(|(addr, len)| (i, addr, len)))?;

    let mut entry = InterfaceAddress {
        address,
        prefix_len,
        scope: None,
        flags: Vec::new(),
        valid_lft: None,
        preferred_lft: None,
    };

    let mut rest = tokens[index + 1..].iter();
    while let Some(token) = rest.next() {
        match *token {
            "scope" => entry.scope = rest.next().map(|s| s.to_string()),
            "valid_lft" => entry.valid_lft = rest.next().and_then(|s| Lifetime::parse(s)),
            "preferred_lft" => entry.preferred_lft = rest.next().and_then(|s| Lifetime::parse(s)),
            // peer addresses and labels carry a value we don't use
            "peer" | "label" | "metric" => {
                rest.next();
            }
            flag => entry.flags.push(flag.to_string()),
        }
    }

    Some(entry)
}

fn parse_cidr(token: &str) -> Option<(Ipv6Addr, u8)> {
    let (addr, prefix) = token.split_once('/')?;
    if addr.is_empty() || !addr.chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
        return None;
    }
    let prefix_len: u8 = prefix.parse().ok()?;
    if prefix_len > 128 {
        return None;
    }
    Some((addr.parse().ok()?, prefix_len))
}
