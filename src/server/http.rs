//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Every non-API path runs
//! through the locale router before it is matched.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::AuthService;
use crate::config::Args;
use crate::db::DocumentStore;
use crate::hierarchy::HierarchyLoader;
use crate::i18n::{resolve_with_query, strip_locale, Catalogs, Locale, LocaleRoute};
use crate::notify::Notifier;
use crate::registration::{RegistrationService, RegistrationSettings};
use crate::routes::{self, BoxBody};
use crate::types::VitalError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn DocumentStore>,
    /// "mongodb" or "memory"
    pub store_kind: &'static str,
    pub catalogs: Catalogs,
    pub loader: HierarchyLoader,
    pub registration: RegistrationService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        store: Arc<dyn DocumentStore>,
        store_kind: &'static str,
        auth: Arc<dyn AuthService>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, VitalError> {
        let catalogs = Catalogs::load()?;
        let settings = RegistrationSettings {
            default_state: args.default_state.clone(),
            status_path: args.status_path.clone(),
        };

        Ok(Self {
            loader: HierarchyLoader::new(Arc::clone(&store)),
            registration: RegistrationService::new(Arc::clone(&store), auth, notifier, settings),
            args,
            store,
            store_kind,
            catalogs,
            started_at: Instant::now(),
        })
    }
}

/// Accept connections until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<(), VitalError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("VITAL listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    info!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(routes::cors_preflight());
    }

    let response = match resolve_with_query(&path, query.as_deref()) {
        LocaleRoute::Redirect(location) => {
            debug!("Redirecting {} to {}", path, location);
            routes::redirect_response(&location)
        }
        LocaleRoute::Excluded => handle_api_request(&state, &method, &path, query.as_deref()).await,
        LocaleRoute::Localized(locale) => {
            handle_page_request(&state, locale, req, &path, query.as_deref()).await
        }
    };

    Ok(response)
}

/// Paths outside the locale router
async fn handle_api_request(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> Response<BoxBody> {
    match (method, path) {
        (&Method::GET, "/api/health") => routes::health_check(state),
        (&Method::GET, "/api/version") => routes::version_info(),
        (&Method::GET, p) if p.starts_with("/api/hierarchy/") => {
            let segment = &p["/api/hierarchy/".len()..];
            routes::handle_hierarchy_request(state, segment, query).await
        }
        _ => routes::not_found_response(path),
    }
}

/// Locale-prefixed pages
async fn handle_page_request(
    state: &AppState,
    locale: Locale,
    req: Request<Incoming>,
    path: &str,
    query: Option<&str>,
) -> Response<BoxBody> {
    let (_, rest) = strip_locale(path);
    let method = req.method().clone();

    match (method, rest) {
        (Method::GET, "/") => {
            routes::redirect_response(&format!("/{}/authority/register", locale))
        }
        (Method::GET, "/authority/register") => routes::register_page(state, locale),
        (Method::POST, "/authority/register") => routes::handle_register(state, locale, req).await,
        (Method::GET, p) if p == state.args.status_path => {
            routes::handle_status(state, locale, query).await
        }
        _ => routes::not_found_response(path),
    }
}
