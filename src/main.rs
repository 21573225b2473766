use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Parser;
use saml_sp_conf::{
    config::AppConfig,
    db::{self, SamlConfigRepo},
    get_config,
    loader::LoaderRegistry,
    models::{CURRENT_SCHEMA_VERSION, CreateSamlConfig},
    observability,
    saml::AssemblyContext,
};

/// Config file looked up in the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "saml-sp-conf.toml";

/// CLI arguments for the SAML SP configuration loader
#[derive(Parser, Debug)]
#[command(version, about = "SAML SP configuration loader", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (defaults to ./saml-sp-conf.toml if it exists,
    /// otherwise built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Load the SP configuration and print it as JSON
    Render {
        /// Loader path overriding `saml.config_loader`
        #[arg(long)]
        loader: Option<String>,
    },
    /// Load the SP configuration and report whether it succeeded
    Check {
        /// Loader path overriding `saml.config_loader`
        #[arg(long)]
        loader: Option<String>,
    },
    /// List registered config loader paths
    Loaders,
    /// Run database migrations and exit
    Migrate,
    /// Store an SP settings record read from a JSON file
    Import {
        /// JSON file holding the settings object
        #[arg(short, long)]
        file: PathBuf,
        /// Revision of the settings object
        #[arg(long, default_value_t = CURRENT_SCHEMA_VERSION)]
        schema_version: i64,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match args.command {
        Command::Render { loader } => run_render(&config, loader.as_deref()).await,
        Command::Check { loader } => run_check(&config, loader.as_deref()).await,
        Command::Loaders => run_loaders(&config).await,
        Command::Migrate => run_migrate(&config).await,
        Command::Import {
            file,
            schema_version,
        } => run_import(&config, &file, schema_version).await,
    }
}

/// Load configuration, exiting with code 1 on failure.
fn load_config(explicit_path: Option<&str>) -> AppConfig {
    let path = match explicit_path {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let cwd_config = PathBuf::from(DEFAULT_CONFIG_FILE);
            cwd_config.exists().then_some(cwd_config)
        }
    };

    let config = match &path {
        Some(path) => AppConfig::from_file(path),
        None => Ok(AppConfig::default()),
    };

    match config {
        Ok(config) => config,
        Err(e) => {
            match &path {
                Some(path) => eprintln!(
                    "Failed to load config from {}: {}",
                    path.display(),
                    e
                ),
                None => eprintln!("Failed to load default config: {}", e),
            }
            std::process::exit(1);
        }
    }
}

/// Build the loader registry, opening the database when one is configured.
async fn build_registry(config: &AppConfig) -> Result<LoaderRegistry, String> {
    if config.database.is_none() {
        tracing::debug!("No database configured; the built-in loader is unavailable");
        return Ok(LoaderRegistry::builtin());
    }

    let repo = open_repo(config).await?;
    let ctx = AssemblyContext::from_config(config)
        .map_err(|e| format!("Failed to resolve media directory: {}", e))?;

    Ok(LoaderRegistry::with_defaults(repo, ctx))
}

async fn open_repo(config: &AppConfig) -> Result<Arc<dyn SamlConfigRepo>, String> {
    let pool = db::DbPool::from_config(&config.database)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;
    Ok(pool.saml_configs())
}

async fn load_or_exit(config: &AppConfig, loader: Option<&str>) -> saml_sp_conf::SpConfig {
    let registry = match build_registry(config).await {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match get_config(&registry, &config.saml, loader, None).await {
        Ok(sp_config) => sp_config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load SAML configuration");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the loaded configuration document as JSON.
async fn run_render(config: &AppConfig, loader: Option<&str>) {
    let sp_config = load_or_exit(config, loader).await;

    match sp_config.to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Failed to serialize configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load the configuration and report the outcome.
///
/// Exits with code 0 on success, 1 on failure.
async fn run_check(config: &AppConfig, loader: Option<&str>) {
    let path = loader.unwrap_or_else(|| config.saml.loader_path());
    let sp_config = load_or_exit(config, loader).await;

    println!("Loader:      {}", path);
    println!("Entity ID:   {}", sp_config.entity_id());
    println!("NameID:      {}", sp_config.name_id_format());
    for endpoint in sp_config.acs_endpoints() {
        println!("ACS:         {} ({})", endpoint.url(), endpoint.binding());
    }
    for endpoint in sp_config.slo_endpoints() {
        println!("SLO:         {} ({})", endpoint.url(), endpoint.binding());
    }
    println!("Attributes:  {}", sp_config.attribute_map_dir());

    #[cfg(feature = "saml")]
    {
        if let Err(e) = sp_config.service_provider() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        println!("Toolkit:     ServiceProvider built");
    }

    println!("OK");
}

/// List registered loader paths, marking the one in effect.
async fn run_loaders(config: &AppConfig) {
    let registry = match build_registry(config).await {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let active = config.saml.loader_path();
    for path in registry.paths() {
        let marker = if path == active { "*" } else { " " };
        println!("{} {}", marker, path);
    }
}

/// Run database migrations, then upgrade revision 1 settings records.
///
/// Exits with code 0 on success, 1 on failure.
async fn run_migrate(config: &AppConfig) {
    if config.database.is_none() {
        eprintln!("Error: Database is not configured. Nothing to migrate.");
        std::process::exit(1);
    }

    let pool = match db::DbPool::from_config(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            eprintln!("Error: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        tracing::error!(error = %e, "Database migrations failed");
        eprintln!("Error: Database migrations failed: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Database migrations completed successfully");

    let repo = pool.saml_configs();
    match db::upgrade_legacy_records(repo.as_ref(), &config.saml.attribute_map_filename).await {
        Ok(report) => {
            tracing::info!(
                upgraded = report.upgraded,
                skipped = report.skipped,
                "Revision 1 settings upgrade completed"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Revision 1 settings upgrade failed");
            eprintln!("Error: Settings upgrade failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Store a settings record read from a JSON file.
async fn run_import(config: &AppConfig, file: &Path, schema_version: i64) {
    if config.database.is_none() {
        eprintln!("Error: Database is not configured. Nowhere to import into.");
        std::process::exit(1);
    }

    let settings = match std::fs::read_to_string(file)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).map_err(|e| e.to_string()))
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: Failed to read {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let repo = match open_repo(config).await {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match repo
        .create(CreateSamlConfig {
            schema_version,
            settings,
        })
        .await
    {
        Ok(row) => {
            tracing::info!(record_id = %row.id, schema_version, "Stored SP settings record");
            println!("{}", row.id);
        }
        Err(e) => {
            eprintln!("Error: Failed to store settings: {}", e);
            std::process::exit(1);
        }
    }
}
