use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::dns::CLOUDFLARE_API_BASE;
use crate::ip::AddressPolicy;
use crate::retry::RetryPolicy;
use crate::updater::RecordTarget;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub updater: UpdaterConfig,
    pub record: RecordConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub address_policy: AddressPolicy,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_attempts() -> u32 {
    1 // no retries
}

fn default_retry_delay() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub interface: String,
    pub domain: String,
    #[serde(default)]
    pub subdomain: String,
}

fn default_provider() -> String {
    "cloudflare".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

fn default_api_base() -> String {
    CLOUDFLARE_API_BASE.to_string()
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct RecordOverrides {
    pub interface: Option<String>,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// `None` when nothing exists at `path`; a file that exists must parse.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Merge an optional config file with command-line overrides.
    pub fn resolve(file: Option<Settings>, overrides: RecordOverrides) -> Result<Self> {
        let mut settings = match file {
            Some(settings) => settings,
            None => {
                let (Some(interface), Some(domain)) =
                    (overrides.interface.clone(), overrides.domain.clone())
                else {
                    bail!(
                        "No configuration file found at {} and --interface/--domain were not given",
                        Self::config_path().display()
                    );
                };
                Settings {
                    updater: UpdaterConfig::default(),
                    record: RecordConfig {
                        provider: default_provider(),
                        interface,
                        domain,
                        subdomain: String::new(),
                    },
                    provider: ProviderConfig::default(),
                }
            }
        };

        if let Some(interface) = overrides.interface {
            settings.record.interface = interface;
        }
        if let Some(domain) = overrides.domain {
            settings.record.domain = domain;
        }
        if let Some(subdomain) = overrides.subdomain {
            settings.record.subdomain = subdomain;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.record.interface.trim().is_empty() {
            bail!("record.interface must not be empty");
        }
        if self.record.domain.trim().is_empty() {
            bail!("record.domain must not be empty");
        }
        if self.updater.max_attempts == 0 {
            bail!("updater.max_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn target(&self) -> RecordTarget {
        RecordTarget::new(&self.record.domain, &self.record.subdomain)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.updater.max_attempts,
            Duration::from_secs(self.updater.retry_delay_seconds),
        )
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn config_dir() -> PathBuf {
        #[cfg(unix)]
        {
            PathBuf::from("/etc/v6ddns")
        }
        #[cfg(windows)]
        {
            PathBuf::from(r"C:\ProgramData\v6ddns")
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            address_policy: AddressPolicy::default(),
            max_attempts: default_max_attempts(),
            retry_delay_seconds: default_retry_delay(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[updater]
log_level = "debug"
address_policy = "global"
max_attempts = 3
retry_delay_seconds = 10

[record]
interface = "eno1"
domain = "example.com"
subdomain = "truenas"

[provider]
api_base = "http://localhost:8080/client/v4"
timeout_seconds = 30
"#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.updater.log_level, "debug");
        assert_eq!(settings.updater.address_policy, AddressPolicy::Global);
        assert_eq!(settings.updater.max_attempts, 3);
        assert_eq!(settings.record.provider, "cloudflare");
        assert_eq!(settings.record.interface, "eno1");
        assert_eq!(settings.target().fqdn(), "truenas.example.com");
        assert_eq!(settings.provider.timeout_seconds, Some(30));
        assert_eq!(
            settings.retry_policy(),
            RetryPolicy::new(3, Duration::from_secs(10))
        );
    }

    #[test]
    fn test_defaults() {
        let toml_str = r#"
[record]
interface = "eth0"
domain = "example.org"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.updater.log_level, "info");
        assert_eq!(settings.updater.address_policy, AddressPolicy::Dynamic);
        assert_eq!(settings.updater.max_attempts, 1);
        assert_eq!(settings.provider.api_base, CLOUDFLARE_API_BASE);
        assert_eq!(settings.provider.timeout_seconds, None);
        assert_eq!(settings.target().fqdn(), "example.org");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[record]\ninterface = \"eno1\"\ndomain = \"example.com\"\nsubdomain = \"host\""
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.record.subdomain, "host");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_optional() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Settings::load_optional(&missing).unwrap().is_none());

        let present = dir.path().join("config.toml");
        std::fs::write(&present, "[record]\ninterface = \"eno1\"\ndomain = \"example.com\"\n")
            .unwrap();
        let settings = Settings::load_optional(&present).unwrap().unwrap();
        assert_eq!(settings.record.domain, "example.com");

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[record\n").unwrap();
        assert!(Settings::load_optional(&broken).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let file: Settings = toml::from_str(
            "[record]\ninterface = \"eno1\"\ndomain = \"example.com\"\nsubdomain = \"a\"",
        )
        .unwrap();
        let overrides = RecordOverrides {
            interface: Some("eth1".to_string()),
            domain: None,
            subdomain: Some("b".to_string()),
        };

        let settings = Settings::resolve(Some(file), overrides).unwrap();
        assert_eq!(settings.record.interface, "eth1");
        assert_eq!(settings.record.domain, "example.com");
        assert_eq!(settings.record.subdomain, "b");
    }

    #[test]
    fn test_flags_without_file() {
        let overrides = RecordOverrides {
            interface: Some("eno1".to_string()),
            domain: Some("example.com".to_string()),
            subdomain: Some("host".to_string()),
        };
        let settings = Settings::resolve(None, overrides).unwrap();
        assert_eq!(settings.target().fqdn(), "host.example.com");
        assert_eq!(settings.updater.max_attempts, 1);
    }

    #[test]
    fn test_missing_domain_without_file_fails() {
        let overrides = RecordOverrides {
            interface: Some("eno1".to_string()),
            ..Default::default()
        };
        assert!(Settings::resolve(None, overrides).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut settings: Settings =
            toml::from_str("[record]\ninterface = \"eno1\"\ndomain = \"example.com\"").unwrap();
        settings.updater.max_attempts = 0;
        assert!(settings.validate().is_err());

        settings.updater.max_attempts = 1;
        settings.record.domain = " ".to_string();
        assert!(settings.validate().is_err());
    }
}
