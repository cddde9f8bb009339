//! rulecast Engine - Main entry point.
//!
//! Migrates one copied dnd5e module to swade in place, configured from the
//! environment (`RULECAST_*`, see `infrastructure::config`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rulecast_engine::infrastructure::config::MigrationConfig;
use rulecast_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rulecast_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MigrationConfig::from_env()?;
    tracing::info!(
        module = %config.module_path.display(),
        source = %config.source_module,
        target = %config.target_module,
        "Starting rulecast migration"
    );

    let app = App::from_config(&config).await?;
    match app.run().await {
        Ok(summary) => {
            for pack in &summary.packs {
                tracing::info!(
                    path = %pack.path.display(),
                    backend = %pack.backend,
                    records = pack.converted,
                    "Migrated pack"
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Migration failed");
            std::process::exit(1);
        }
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
