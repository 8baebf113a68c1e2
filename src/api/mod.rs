//! HTTP surface: router, middleware stack and server loop.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

mod error;
pub mod handlers;

pub use error::{ApiError, ErrorBody};

use crate::{
    auth::{require_owner, TokenCodec},
    country::{CountryImporter, RestCountriesClient},
    store::Store,
};
use handlers::{countries, health, root, user_login, user_signup, users};

const REQUEST_ID: &str = "x-request-id";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        user_signup::signup,
        user_login::login,
        users::get_user,
        users::update_user,
        users::delete_user,
        countries::list_countries,
        countries::rest_countries,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Signup, login and owner-scoped user records"),
        (name = "countries", description = "Country catalogue and REST Countries import"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Shared services handed to every request through `Extension` layers.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn Store>,
    pub codec: Arc<TokenCodec>,
    pub countries: Arc<RestCountriesClient>,
    pub importer: CountryImporter,
}

impl AppContext {
    /// Wire a context around `store`, starting the country import worker on it.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, codec: TokenCodec, countries: RestCountriesClient) -> Self {
        let importer = CountryImporter::spawn(store.clone());

        Self {
            store,
            codec: Arc::new(codec),
            countries: Arc::new(countries),
            importer,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("codec", &self.codec)
            .field("countries", &self.countries)
            .finish_non_exhaustive()
    }
}

/// Build the application router.
///
/// `/users/{id}` routes go through `require_owner` before reaching a handler.
pub fn router(ctx: AppContext) -> Router {
    let owner_routes = Router::new()
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn(require_owner));

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .route("/signup", axum::routing::post(user_signup::signup))
        .route("/login", axum::routing::post(user_login::login))
        .route("/countries", get(countries::list_countries))
        .route("/rest-countries", get(countries::rest_countries))
        .route("/openapi.json", get(|| async { Json(openapi()) }))
        .merge(owner_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(ctx.store))
                .layer(Extension(ctx.codec))
                .layer(Extension(ctx.countries))
                .layer(Extension(ctx.importer)),
        )
}

/// Start the server and block until ctrl-c.
/// # Errors
/// Return error if the listener cannot be bound or the server fails
pub async fn new(port: u16, ctx: AppContext) -> Result<()> {
    let app = router(ctx);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
