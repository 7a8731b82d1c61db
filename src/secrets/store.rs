use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::dns::Credentials;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    providers: HashMap<String, ProviderCredentials>,
}

#[derive(Serialize, Deserialize)]
struct ProviderCredentials {
    api_token: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProviderCredentials { .. }")
    }
}

/// Open for writing, truncating; a newly created file is 0600 from the start.
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// API tokens kept in a TOML file, one table per provider.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(Settings::config_dir().join("credentials.toml"))
    }
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialsFile> {
        if !self.path.exists() {
            return Ok(CredentialsFile::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials file: {}", self.path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", self.path.display()))
    }

    fn save(&self, creds: &CredentialsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(creds).context("Failed to serialize credentials")?;

        let mut file = open_private(&self.path)
            .with_context(|| format!("Failed to open credentials file: {}", self.path.display()))?;

        // an existing file keeps its old mode on open
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .with_context(|| format!("Failed to set permissions on: {}", self.path.display()))?;
        }

        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write credentials file: {}", self.path.display()))?;

        Ok(())
    }

    pub fn store(&self, provider: &str, api_token: &str) -> Result<()> {
        if api_token.trim().is_empty() {
            return Err(anyhow!("API token must not be empty"));
        }

        let mut creds_file = self.load()?;
        creds_file.providers.insert(
            provider.to_string(),
            ProviderCredentials {
                api_token: api_token.trim().to_string(),
            },
        );
        self.save(&creds_file)
    }

    pub fn get(&self, provider: &str) -> Result<Credentials> {
        let creds_file = self.load()?;

        let provider_creds = creds_file.providers.get(provider).ok_or_else(|| {
            anyhow!(
                "Credentials not found for provider: {}. Use 'v6ddns set-key {}' or set CLOUDFLARE_API_TOKEN.",
                provider,
                provider
            )
        })?;

        Ok(Credentials {
            api_token: provider_creds.api_token.clone(),
        })
    }

    pub fn delete(&self, provider: &str) -> Result<()> {
        let mut creds_file = self.load()?;

        if creds_file.providers.remove(provider).is_none() {
            return Err(anyhow!("No credentials found for provider: {}", provider));
        }

        self.save(&creds_file)
    }
}

/// A token given on the command line or in the environment wins over the file.
pub fn resolve_credentials(
    store: &CredentialStore,
    provider: &str,
    explicit_token: Option<&str>,
) -> Result<Credentials> {
    match explicit_token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => Ok(Credentials {
            api_token: token.to_string(),
        }),
        None => store.get(provider),
    }
}
