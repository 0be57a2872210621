use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::database::models::{
    Class, Department, Enrollment, Grade, Guardian, Period, Professor, SchoolYear, Student,
    StudentGuardian, Subject, Term, User,
};
use crate::database::{Database, Entity};
use crate::handlers::{self, protected, public};
use crate::middleware::{cors_layer, jwt_auth_middleware};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        Self {
            db,
            default_page_size: config.api.default_page_size,
            max_page_size: config.api.max_page_size,
        }
    }
}

/// The complete HTTP surface
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(auth_public_routes())
        .merge(protected_routes())
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(public::auth::login))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route("/api/auth/refresh", post(protected::auth::refresh))
        .route("/api/audit", get(protected::audit::list))
        .merge(resource_routes::<SchoolYear>())
        .merge(resource_routes::<Term>())
        .merge(resource_routes::<Period>())
        .merge(resource_routes::<Department>())
        .merge(resource_routes::<Subject>())
        .merge(resource_routes::<Professor>())
        .merge(resource_routes::<Student>())
        .merge(resource_routes::<Guardian>())
        .merge(resource_routes::<StudentGuardian>())
        .merge(resource_routes::<Class>())
        .merge(resource_routes::<Enrollment>())
        .merge(resource_routes::<Grade>())
        .merge(resource_routes::<User>())
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn resource_routes<T: Entity>() -> Router<AppState> {
    use protected::resource;

    Router::new()
        .route(
            &format!("/api/{}", T::PATH),
            get(resource::list::<T>).post(resource::create::<T>),
        )
        .route(
            &format!("/api/{}/:id", T::PATH),
            get(resource::get::<T>)
                .put(resource::update::<T>)
                .patch(resource::update::<T>)
                .delete(resource::delete::<T>),
        )
}
