use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use v6ddns::{
    config::{RecordOverrides, Settings},
    dns::create_provider,
    ip, secrets, updater,
};

#[derive(Parser)]
#[command(name = "v6ddns")]
#[command(about = "IPv6 dynamic DNS updater - publishes an interface's global address to an AAAA record")]
#[command(version)]
struct Cli {
    /// Configuration file (default: /etc/v6ddns/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Network interface to read the address from
    #[arg(long, global = true)]
    interface: Option<String>,

    /// Zone name, e.g. example.com
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Record label inside the zone; "@" for the apex
    #[arg(long, global = true)]
    subdomain: Option<String>,

    /// API token; falls back to the credentials file
    #[arg(long, global = true, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the interface's current address (default)
    Update,

    /// Show the discovered address and the published record
    Check,

    /// Store the API token for a DNS provider
    SetKey {
        /// DNS provider name (e.g., cloudflare)
        provider: String,
    },

    /// Delete the stored API token for a DNS provider
    DeleteKey {
        /// DNS provider name (e.g., cloudflare)
        provider: String,
    },

    /// Show configuration file location and contents
    Config,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// An explicit --config must exist; the default location is optional.
fn load_file(explicit: Option<&Path>) -> Result<Option<Settings>> {
    match explicit {
        Some(path) => Settings::load(path).map(Some),
        None => Settings::load_optional(&Settings::config_path()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = load_file(cli.config.as_deref());

    let log_level = file
        .as_ref()
        .ok()
        .and_then(|f| f.as_ref())
        .map(|s| s.updater.log_level.as_str())
        .unwrap_or("info");
    init_logging(log_level);

    let overrides = RecordOverrides {
        interface: cli.interface.clone(),
        domain: cli.domain.clone(),
        subdomain: cli.subdomain.clone(),
    };
    let store = secrets::CredentialStore::default();

    match cli.command.unwrap_or(Commands::Update) {
        Commands::Update => {
            let result = match file.and_then(|f| Settings::resolve(f, overrides)) {
                Ok(settings) => run_update(&settings, &store, cli.api_token.as_deref()).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(payload) => println!("DNS record updated successfully: {}", payload),
                Err(e) => {
                    error!("Update failed: {:#}", e);
                    println!("Error: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Check => {
            let settings = Settings::resolve(file?, overrides)?;
            check_status(&settings, &store, cli.api_token.as_deref()).await?;
        }

        Commands::SetKey { provider } => {
            let token = rpassword::prompt_password("API Token: ")?;
            store.store(&provider, &token)?;
            println!("Credentials stored for provider: {}", provider);
        }

        Commands::DeleteKey { provider } => {
            store.delete(&provider)?;
            println!("Credentials deleted for provider: {}", provider);
        }

        Commands::Config => {
            let path = cli.config.clone().unwrap_or_else(Settings::config_path);
            // a missing file, even an explicit one, gets the example instead
            let settings = match file {
                Ok(settings) => settings,
                Err(_) => Settings::load_optional(&path)?,
            };
            show_config(&path, &settings)?;
        }
    }

    Ok(())
}

async fn run_update(
    settings: &Settings,
    store: &secrets::CredentialStore,
    api_token: Option<&str>,
) -> Result<Value> {
    let credentials = secrets::resolve_credentials(store, &settings.record.provider, api_token)?;
    let provider = create_provider(&settings.record.provider, credentials, &settings.provider)?;

    let address =
        ip::discover_address(&settings.record.interface, &settings.updater.address_policy).await?;
    info!(
        "Discovered {} on {} (policy: {})",
        address, settings.record.interface, settings.updater.address_policy
    );

    let payload = updater::update_ipv6_record(
        provider.as_ref(),
        &settings.target(),
        &address.to_string(),
        &settings.retry_policy(),
    )
    .await?;

    Ok(payload)
}

async fn check_status(
    settings: &Settings,
    store: &secrets::CredentialStore,
    api_token: Option<&str>,
) -> Result<()> {
    let target = settings.target();
    println!("Checking {} on {}...\n", target.fqdn(), settings.record.interface);

    let discovered =
        ip::discover_address(&settings.record.interface, &settings.updater.address_policy).await;
    match &discovered {
        Ok(ip) => println!("Interface address: {}", ip),
        Err(e) => println!("Interface address: Error - {}", e),
    }

    let credentials = secrets::resolve_credentials(store, &settings.record.provider, api_token)?;
    let provider = create_provider(&settings.record.provider, credentials, &settings.provider)?;

    match updater::fetch_record(provider.as_ref(), &target, &settings.retry_policy()).await {
        Ok(record) => {
            println!(
                "{} ({}): {} -> {} (ttl {}, proxied {})",
                record.name,
                provider.provider_name(),
                record.record_type,
                record.content,
                record.ttl,
                record.proxied
            );
            if let Ok(ip) = discovered {
                if record.content == ip.to_string() {
                    println!("\nRecord is up to date.");
                } else {
                    println!("\nRecord differs from the interface address; run 'v6ddns update'.");
                }
            }
        }
        Err(e) => println!("{} ({}): Error - {}", target.fqdn(), provider.provider_name(), e),
    }

    Ok(())
}

fn show_config(path: &Path, settings: &Option<Settings>) -> Result<()> {
    println!("Configuration file location: {}\n", path.display());

    match settings {
        Some(s) => {
            println!("Current configuration:\n");
            println!("{}", toml::to_string_pretty(s)?);
        }
        None => {
            println!("Configuration file not found.");
            println!("\nCreate a configuration file at the location above.");
            println!("Example configuration:\n");
            println!(
                r#"[updater]
log_level = "info"
address_policy = "dynamic"
max_attempts = 1

[record]
provider = "cloudflare"
interface = "eno1"
domain = "example.com"
subdomain = "host"
"#
            );
            println!(
                "Store the API token with 'v6ddns set-key cloudflare' or set CLOUDFLARE_API_TOKEN."
            );
        }
    }

    Ok(())
}
