//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{PgDocStore, StoreIdentityResolver},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, renew_handler, signup_handler},
        middleware::require_auth,
        rest::ApiDoc,
        state::AppState,
        list_conversations_handler, lookup_user_handler, post_message_handler,
        start_conversation_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use messenger_core::{
    conversation::ConversationAggregator,
    ports::{DocumentStore, IdentityResolver},
    session::SessionManager,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    // One long-lived pool for the whole process; every logical operation
    // shares it. The acquire timeout is the per-call bound on store access.
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(config.store_timeout_secs))
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgDocStore::new(db_pool));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Wire Up the Core Components ---
    let store: Arc<dyn DocumentStore> = store;
    let identity: Arc<dyn IdentityResolver> =
        Arc::new(StoreIdentityResolver::new(store.clone()));
    let sessions = Arc::new(SessionManager::with_ttl(
        store.clone(),
        identity.clone(),
        Duration::days(config.session_ttl_days),
    ));
    let conversations = Arc::new(ConversationAggregator::new(
        store.clone(),
        identity.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        identity,
        sessions,
        conversations,
        config: config.clone(),
    });

    let allowed_origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/renew", post(renew_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/conversations",
            get(list_conversations_handler).post(start_conversation_handler),
        )
        .route("/conversations/{chat_id}/messages", post(post_message_handler))
        .route("/users/lookup", get(lookup_user_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
