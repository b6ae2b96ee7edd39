use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    AuditRecorder, AuthService, ContentService, Geocoder, GeocodingProvider, IdentityVerifier,
    ImageUploader, ObjectStorage,
};
use domain::store::{AuditLogStore, DocumentStore, UserStore};
use persistence::InMemoryStore;
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::services::LocalObjectStorage;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, require_user_auth,
    security_headers_middleware, trace_id,
};
use crate::routes::{
    audit_logs, auth, content, gallery, geocode, health, services, settings, site, testimonials,
    uploads, users,
};

/// Storage backends and outbound clients the application runs on.
pub struct Backends {
    pub documents: Arc<dyn DocumentStore>,
    pub users: Arc<dyn UserStore>,
    pub audit_logs: Arc<dyn AuditLogStore>,
    pub objects: Arc<dyn ObjectStorage>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub geocoding: Arc<dyn GeocodingProvider>,
    pub jwt: Arc<JwtConfig>,
    /// Set when running on PostgreSQL; used by readiness checks.
    pub pool: Option<PgPool>,
}

impl Backends {
    /// Backends over a single in-memory store.
    pub fn in_memory(
        store: Arc<InMemoryStore>,
        objects: Arc<dyn ObjectStorage>,
        identity: Arc<dyn IdentityVerifier>,
        geocoding: Arc<dyn GeocodingProvider>,
        jwt: Arc<JwtConfig>,
    ) -> Self {
        Self {
            documents: store.clone(),
            users: store.clone(),
            audit_logs: store,
            objects,
            identity,
            geocoding,
            jwt,
            pool: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: Option<PgPool>,
    pub documents: Arc<dyn DocumentStore>,
    pub audit_logs: Arc<dyn AuditLogStore>,
    pub content: ContentService,
    pub auth: AuthService,
    pub uploader: ImageUploader,
    pub geocoder: Geocoder,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        let audit = AuditRecorder::new(backends.audit_logs.clone());
        let content = ContentService::new(backends.documents.clone(), audit.clone());
        let auth = AuthService::new(
            backends.identity,
            backends.users,
            backends.jwt.clone(),
            audit,
            &config.identity.admin_emails,
        );
        let geocoder = Geocoder::new(backends.geocoding, config.geocoding.fallback_query.clone());

        Self {
            config: Arc::new(config),
            pool: backends.pool,
            documents: backends.documents,
            audit_logs: backends.audit_logs,
            content,
            auth,
            uploader: ImageUploader::new(backends.objects),
            geocoder,
            jwt: backends.jwt,
        }
    }
}

pub fn create_app(config: Config, backends: Backends) -> Router {
    let state = AppState::new(config, backends);
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public site: published content only
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1/services", services::public_router())
        .nest("/api/v1/testimonials", testimonials::public_router())
        .nest("/api/v1/gallery", gallery::public_router())
        .nest("/api/v1/settings", settings::public_router())
        .nest("/api/v1/content", content::public_router())
        .nest("/api/v1/site", site::router())
        .route("/api/v1/auth/sign-in", post(auth::sign_in));

    // Signed-in users
    let user_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Admin console: role re-read from the user record on every request
    let admin_routes = Router::new()
        .nest("/services", services::admin_router())
        .nest("/testimonials", testimonials::admin_router())
        .nest("/gallery", gallery::admin_router())
        .nest("/settings", settings::admin_router())
        .nest("/content", content::admin_router())
        .nest("/uploads", uploads::router())
        .nest("/geocode", geocode::router())
        .nest("/audit-logs", audit_logs::router())
        .nest("/users", users::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .nest("/api/v1/admin", admin_routes);

    if let Some(mount) = uploads_mount_path(&config.uploads.public_base_url) {
        let served = LocalObjectStorage::public_dir(&config.uploads.root_dir);
        app = app.nest_service(&mount, ServeDir::new(served));
    }

    app.layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

/// Path under which stored uploads are served, taken from their public URL.
///
/// `None` when the URL points at another host path root (served elsewhere).
fn uploads_mount_path(public_base_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(public_base_url).ok()?;
    let path = url.path().trim_end_matches('/');
    if path.is_empty() || path.starts_with("/api") {
        None
    } else {
        Some(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploads_mount_path() {
        assert_eq!(
            uploads_mount_path("http://localhost:8080/uploads").as_deref(),
            Some("/uploads")
        );
        assert_eq!(
            uploads_mount_path("https://cdn.drsmile.co/media/images/").as_deref(),
            Some("/media/images")
        );
        assert_eq!(uploads_mount_path("https://cdn.drsmile.co/"), None);
        assert_eq!(uploads_mount_path("not a url"), None);
    }
}
