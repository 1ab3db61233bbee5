use std::path::PathBuf;
use std::sync::Arc;

use actix_files as fs;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use profolio::app_config::{AppConfig, ConfigManager, CONFIG_FILE};
use profolio::app_state::AppState;
use profolio::datastore::{Datastore, MemoryDatastore, RestDatastore};
use profolio::generator::ContentGenerator;
use profolio::identity::{Caller, IdentityProvider, RestIdentityProvider, StaticIdentityProvider};
use profolio::llm_handler::LLMProviderImpl;
use profolio::routes;

const DEV_TOKEN_VAR: &str = "PROFOLIO_DEV_TOKEN";
const DEFAULT_DEV_TOKEN: &str = "dev-token";

#[derive(Debug, Parser)]
#[command(name = "profolio", about = "UX portfolio builder backend")]
struct Args {
    /// Path to the JSON config file
    #[arg(long, default_value = CONFIG_FILE)]
    config: String,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<String>,

    /// In-memory datastore and a single static development user
    #[arg(long)]
    dev: bool,

    /// Built frontend to serve at `/`
    #[arg(long)]
    static_dir: Option<String>,

    /// Write the effective config (without secrets) back to the config file and exit
    #[arg(long)]
    write_config: bool,
}

fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "profolio.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn load_config(args: &Args, manager: &ConfigManager) -> std::io::Result<AppConfig> {
    let mut config = manager
        .load_config()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    config.apply_env_overrides(|name| std::env::var(name).ok());

    // Command line flags win over both the file and the environment
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.static_dir {
        config.static_dir = Some(dir.clone());
    }

    Ok(config)
}

fn build_backends(config: &AppConfig, dev: bool) -> std::io::Result<(Arc<dyn Datastore>, Arc<dyn IdentityProvider>)> {
    if dev {
        let token = std::env::var(DEV_TOKEN_VAR).unwrap_or_else(|_| DEFAULT_DEV_TOKEN.to_string());
        let caller = Caller {
            user_id: Uuid::new_v4(),
            email: Some("dev@localhost".to_string()),
        };
        warn!("Development mode: in-memory datastore, data is lost on exit");
        info!("Development user {} authenticates with bearer token from {}", caller.user_id, DEV_TOKEN_VAR);

        return Ok((
            Arc::new(MemoryDatastore::new()),
            Arc::new(StaticIdentityProvider::new().with_token(&token, caller)),
        ));
    }

    let (url, key) = config
        .backend()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    info!("Using hosted backend at {}", url);

    Ok((
        Arc::new(RestDatastore::new(url, key)),
        Arc::new(RestIdentityProvider::new(url, key)),
    ))
}

struct StaticDir(PathBuf);

// Index handler to serve the frontend
async fn index(dir: web::Data<StaticDir>) -> actix_web::Result<fs::NamedFile> {
    Ok(fs::NamedFile::open_async(dir.0.join("index.html")).await?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let manager = ConfigManager::new(&args.config);
    let config = load_config(&args, &manager)?;
    let _guard = init_tracing(config.log_dir.as_deref());

    if args.write_config {
        manager
            .save_config(&config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        info!("Wrote config to {}", manager.config_file());
        return Ok(());
    }

    let (datastore, identity) = build_backends(&config, args.dev)?;

    let provider = LLMProviderImpl::new(config.llm_provider, config.model(), config.llm_api_key.clone());
    if config.llm_api_key.is_none() {
        warn!(
            "{} is not set; generation requests will fail",
            config.llm_provider.api_key_var()
        );
    }
    info!("Generating with {:?} model {}", provider.provider(), provider.model());
    let generator = ContentGenerator::new(Arc::new(provider), &config.prompts);

    let app_state = web::Data::new(AppState::new(datastore, identity, generator));
    let static_dir = config.static_dir.clone().map(PathBuf::from);

    info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let app = App::new()
            .app_data(app_state.clone())
            .configure(routes::configure);

        // Serve the built frontend, with index.html for every other GET
        match &static_dir {
            Some(dir) => app
                .app_data(web::Data::new(StaticDir(dir.clone())))
                .service(fs::Files::new("/assets", dir.join("assets")))
                .default_service(web::get().to(index)),
            None => app,
        }
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
