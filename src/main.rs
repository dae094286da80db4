//! VITAL - authority registration service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vital::{
    auth::{AuthService, CredentialAuthService},
    config::Args,
    db::schemas::{
        AuthorityProfile, CredentialDoc, District, Panchayat, Taluk, UserRecord, Village,
        AUTHORITY_COLLECTION, CREDENTIAL_COLLECTION, DISTRICT_COLLECTION, PANCHAYAT_COLLECTION,
        TALUK_COLLECTION, USER_COLLECTION, VILLAGE_COLLECTION,
    },
    db::{DocumentStore, MemoryStore, MongoStore},
    notify::{HttpNotifier, LogNotifier, Notifier},
    server::{self, AppState},
};

async fn ensure_indexes(mongo: &MongoStore) -> vital::Result<()> {
    mongo.ensure_indexes::<District>(DISTRICT_COLLECTION).await?;
    mongo.ensure_indexes::<Taluk>(TALUK_COLLECTION).await?;
    mongo.ensure_indexes::<Village>(VILLAGE_COLLECTION).await?;
    mongo.ensure_indexes::<Panchayat>(PANCHAYAT_COLLECTION).await?;
    mongo.ensure_indexes::<AuthorityProfile>(AUTHORITY_COLLECTION).await?;
    mongo.ensure_indexes::<UserRecord>(USER_COLLECTION).await?;
    mongo.ensure_indexes::<CredentialDoc>(CREDENTIAL_COLLECTION).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vital={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  VITAL - Authority Registration");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!(
        "Notifications: {}",
        if args.notify_enabled { "HTTP" } else { "log only" }
    );
    info!("======================================");

    // MongoDB is optional in dev mode
    let (store, store_kind): (Arc<dyn DocumentStore>, &'static str) =
        match MongoStore::connect(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(mongo) => {
                if let Err(e) = ensure_indexes(&mongo).await {
                    warn!("Failed to create indexes: {}", e);
                }
                (Arc::new(mongo), "mongodb")
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                    (Arc::new(MemoryStore::new()), "memory")
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    let auth: Arc<dyn AuthService> = Arc::new(CredentialAuthService::new(
        Arc::clone(&store),
        args.email_signin_enabled,
    ));

    let notifier: Arc<dyn Notifier> = match (&args.notify_url, args.notify_enabled) {
        (Some(url), true) => Arc::new(HttpNotifier::new(url.clone(), args.notify_timeout())),
        _ => Arc::new(LogNotifier),
    };

    let state = AppState::new(args, store, store_kind, auth, notifier)?;
    server::run(Arc::new(state)).await?;

    Ok(())
}
