use anyhow::Context;
use asomap_cms::api::admin;
use asomap_cms::config::{Config, DatabaseConfig};
use asomap_cms::email::{self, SmtpBackend};
use asomap_cms::{logging, seed, server, AppState};
use clap::{Parser, Subcommand};
use cms_core::storage::{InMemoryStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "asomap_cms")]
#[command(about = "Content API backend for the ASOMAP website")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations and serve the HTTP API
    Serve {
        /// Port to listen on, overriding the config
        #[arg(long)]
        port: Option<u16>,
    },
    /// Insert sample content
    Seed {
        /// Only this domain (about, home, header, layout, news, products,
        /// locations, user-support, service, guidance)
        #[arg(long)]
        domain: Option<String>,
    },
    /// Check storage connectivity and count rows per kind
    HealthCheck,
    /// Send a test email with the active email configuration
    TestEmail {
        #[arg(long)]
        to: String,
    },
    /// Delete every record
    ClearDatabase,
}

#[cfg(feature = "db")]
async fn open_storage(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn Storage>> {
    use cms_core::storage::DatabaseStorage;
    use cms_core::DatabaseManager;

    let Some(url) = config.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        warn!("No database configured, content lives in memory only");
        return Ok(Arc::new(InMemoryStorage::new()));
    };
    let manager = DatabaseManager::new(url, config.auth_token.as_deref())
        .await
        .context("opening database")?;
    manager.run_migrations().await.context("running migrations")?;
    Ok(Arc::new(DatabaseStorage::new(manager)))
}

#[cfg(not(feature = "db"))]
async fn open_storage(_config: &DatabaseConfig) -> anyhow::Result<Arc<dyn Storage>> {
    warn!("Built without the db feature, content lives in memory only");
    Ok(Arc::new(InMemoryStorage::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let storage = open_storage(&config.database).await?;
            let state = AppState::new(config, storage, Arc::new(SmtpBackend::new()));
            server::serve(state).await?;
        }
        Commands::Seed { domain } => {
            println!("🌱 Seeding sample content...");
            let storage = open_storage(&config.database).await?;
            let report = seed::seed(storage.as_ref(), domain.as_deref()).await?;
            for (name, rows) in &report.inserted {
                println!("   {name}: {rows} rows");
            }
            for name in &report.skipped {
                println!("   {name}: skipped (already has content)");
            }
            println!("✅ Inserted {} rows", report.total());
        }
        Commands::HealthCheck => {
            println!("🔍 Checking storage...");
            let storage = open_storage(&config.database).await?;
            if let Err(e) = storage.ping().await {
                error!("Storage health check failed: {}", e);
                println!("❌ Storage unreachable: {e}");
                std::process::exit(1);
            }
            println!("✅ Storage reachable");
            for (slug, kind) in admin::registry() {
                let (active, total) = kind.counts(storage.as_ref()).await?;
                if total > 0 {
                    println!("   {slug}: {active} active / {total} total");
                }
            }
        }
        Commands::TestEmail { to } => {
            let storage = open_storage(&config.database).await?;
            let Some(email_config) = email::active_configuration(storage.as_ref()).await? else {
                println!("❌ No active email configuration");
                std::process::exit(1);
            };
            info!("Sending test email to {} with '{}'", to, email_config.name);
            let backend = SmtpBackend::new();
            let (sent, message) =
                email::send_test_email(storage.as_ref(), &backend, email_config, &to).await?;
            if sent {
                println!("✅ {message}");
            } else {
                println!("❌ {message}");
                std::process::exit(1);
            }
        }
        Commands::ClearDatabase => {
            let storage = open_storage(&config.database).await?;
            storage.clear().await?;
            warn!("All records deleted");
            println!("🗑️  Database cleared");
        }
    }

    Ok(())
}
