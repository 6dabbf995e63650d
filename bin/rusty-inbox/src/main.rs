//! # Rusty-Inbox Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand};
use ri_api::handlers::AppState;
use ri_api::{configure_routes, middleware};
use ri_auth_simple::{hash_secret, Argon2CredentialValidator, JwtSessionSigner};
use ri_config::Settings;
use ri_core::traits::MessageRepo;
use ri_services::{FeedLimits, ModerationService, ReplyFeed, SessionGate, SubmissionService};
use secrecy::ExposeSecret;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use ri_db_sqlite::SqliteMessageRepo;

#[cfg(all(feature = "store-memory", not(feature = "db-sqlite")))]
use ri_store_memory::MemoryMessageRepo;

#[cfg(not(any(feature = "db-sqlite", feature = "store-memory")))]
compile_error!("enable one message store feature: `db-sqlite` or `store-memory`");

#[derive(Parser)]
#[command(name = "rusty-inbox", version, about = "Anonymous message inbox")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print an Argon2 hash of SECRET for `auth.operator_secret_hash`
    HashSecret { secret: String },
}

fn init_tracing(filter: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(feature = "db-sqlite")]
async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn MessageRepo>> {
    let repo = SqliteMessageRepo::with_max_connections(&settings.database.url, settings.database.max_connections)
        .await
        .context("Failed to init SQLite")?;
    Ok(Arc::new(repo))
}

#[cfg(all(feature = "store-memory", not(feature = "db-sqlite")))]
async fn open_store(_settings: &Settings) -> anyhow::Result<Arc<dyn MessageRepo>> {
    tracing::warn!("using the in-memory message store; messages are lost on restart");
    Ok(Arc::new(MemoryMessageRepo::new()))
}

async fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    // 1. Initialize Store Implementation
    let repo = open_store(settings).await?;

    // 2. Initialize Auth Implementation
    let validator = Argon2CredentialValidator::new(settings.auth.operator_secret_hash.expose_secret());
    let ttl = chrono::Duration::from_std(settings.auth.session_ttl()).context("session TTL out of range")?;
    let signer = JwtSessionSigner::new(
        settings.auth.session_signing_key.expose_secret().as_bytes(),
        ttl,
        settings.auth.issuer.clone(),
    )?;
    let gate = Arc::new(SessionGate::new(
        Arc::new(validator),
        Arc::new(signer),
        settings.limits.auth_timeout(),
    ));

    // 3. Wire the services (dynamic dispatch over the chosen store)
    let store_timeout = settings.limits.store_timeout();
    let limits = FeedLimits {
        default_limit: settings.limits.feed_default_limit,
        max_limit: settings.limits.feed_max_limit,
    };

    Ok(AppState {
        submissions: SubmissionService::new(repo.clone(), store_timeout),
        moderation: ModerationService::new(repo.clone(), gate.clone(), store_timeout),
        feed: ReplyFeed::new(repo, limits, store_timeout),
        gate,
    })
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::debug!(
        host = %settings.server.host,
        port = settings.server.port,
        database = %settings.database.url,
        workers = settings.server.workers,
        "configuration loaded"
    );
    let state = web::Data::new(build_state(&settings).await?);
    let bind = (settings.server.host.clone(), settings.server.port);

    tracing::info!("🚀 Rusty-Inbox starting on http://{}:{}", bind.0, bind.1);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .wrap(middleware::security_headers())
            .configure(configure_routes)
    });
    if settings.server.workers > 0 {
        server = server.workers(settings.server.workers);
    }

    server
        .bind(bind)
        .context("Failed to bind HTTP listener")?
        .run()
        .await?;

    tracing::info!("Rusty-Inbox stopped");
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::HashSecret { secret } => {
            println!("{}", hash_secret(&secret)?);
            Ok(())
        }
        Command::Serve => {
            let settings = Settings::load().context("Failed to load configuration")?;
            init_tracing(&settings.log.filter, settings.log.json);
            serve(settings).await
        }
    }
}
