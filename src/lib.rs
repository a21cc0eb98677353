use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services.
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod storage;

// Domain rules shared by handlers and repositories.
pub mod guard;
pub mod pagination;
pub mod visibility;

// HTTP surface.
pub mod csrf;
pub mod handlers;
pub mod pages;
pub mod routes;

use auth::AuthUser;
use handlers::{account, admin as admin_handlers, comments, posts, profiles};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// The OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        posts::index, posts::post_detail, posts::category_posts, posts::new_post_form,
        posts::create_post, posts::edit_post_form, posts::edit_post, posts::delete_post_form,
        posts::delete_post,
        comments::add_comment, comments::edit_comment_form, comments::edit_comment,
        comments::delete_comment_form, comments::delete_comment,
        profiles::profile, profiles::edit_profile_form, profiles::edit_profile,
        account::register_user, account::get_presigned_url,
        admin_handlers::list_posts, admin_handlers::update_post, admin_handlers::list_categories,
        admin_handlers::create_category, admin_handlers::set_category_status,
        admin_handlers::list_locations, admin_handlers::create_location,
        pages::about, pages::rules
    ),
    components(
        schemas(
            models::User, models::Category, models::Location, models::Post, models::Comment,
            models::PostForm, models::CommentForm, models::ProfileForm,
            models::RegisterUserRequest, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::CategoryForm, models::LocationForm,
            models::AdminPostUpdate, models::PostDetail, models::PostFormChoices,
            models::PostEditPage, models::PublicProfile, models::ProfilePage,
            models::CategoryPage, models::AdminPostRow,
        )
    ),
    tags(
        (name = "blogicum", description = "Blogicum multi-user blog")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, cloned cheaply into each handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Extracting `AuthUser` rejects the request with 401
/// before routing reaches the handler or reads the body.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, the security layers (authentication, CSRF) and the
/// observability stack around them.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest("/admin", admin::admin_routes())
        // Unknown paths render the 404 page.
        .fallback(pages::page_not_found)
        // Cross-site form posts are refused before routing.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            csrf::csrf_protect,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // A panicking handler renders the 500 page.
                .layer(CatchPanicLayer::custom(pages::server_error)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
