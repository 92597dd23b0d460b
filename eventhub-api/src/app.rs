/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use eventhub_api::{app::AppState, config::Config};
/// use eventhub_shared::{db::pool::{create_pool, DatabaseConfig}, repository::PgRepository};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(&DatabaseConfig::new(&config.database.url)).await?;
/// let state = AppState::new(Arc::new(PgRepository::new(pool)), config);
/// let app = eventhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::require_auth};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use eventhub_shared::{
    catalog::EventCatalog,
    directory::UserDirectory,
    repository::{EventRepository, Repository, StorageHealth, UserRepository},
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub catalog: EventCatalog,
    pub directory: UserDirectory,

    /// Storage probe for `/health`
    pub storage: Arc<dyn StorageHealth>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state over one storage backend
    pub fn new<R: Repository + 'static>(repo: Arc<R>, config: Config) -> Self {
        let users: Arc<dyn UserRepository> = repo.clone();
        let events: Arc<dyn EventRepository> = repo.clone();
        let storage: Arc<dyn StorageHealth> = repo;

        Self {
            catalog: EventCatalog::new(events),
            directory: UserDirectory::with_policy(users, config.api.registration_policy),
            storage,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// GET  /health               public
/// GET  /api/events/          public, future events
/// POST /api/events/          admin, create event
/// GET  /api/events/my/       authenticated, own signups
/// POST /api/event/:id/       authenticated, sign up
/// GET  /api/users/           admin, list users
/// POST /api/users/           public, register
/// POST /api/token/           public, obtain token pair
/// POST /api/token/refresh/   public, new access token
/// ```
///
/// Authentication is attached per method, so one path can mix public and
/// protected methods.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth = || axum::middleware::from_fn_with_state(state.clone(), require_auth);

    let api_routes = Router::new()
        .route(
            "/events/",
            get(routes::events::list_events)
                .merge(post(routes::events::create_event).route_layer(auth())),
        )
        .route(
            "/events/my/",
            get(routes::events::my_events).route_layer(auth()),
        )
        .route(
            "/event/:id/",
            post(routes::events::signup).route_layer(auth()),
        )
        .route(
            "/users/",
            post(routes::users::register)
                .merge(get(routes::users::list_users).route_layer(auth())),
        )
        .route("/token/", post(routes::auth::obtain_token))
        .route("/token/refresh/", post(routes::auth::refresh_token));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
