use axum::{
    http::header,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth, handlers, AppState};

pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/sign-up", post(auth::handlers::sign_up))
        .route("/sign-in", post(auth::handlers::sign_in))
        .route("/sign-out", post(auth::handlers::sign_out))
        .route(
            "/me",
            get(auth::handlers::me).layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        );

    let user_routes = Router::new()
        .route("/", get(handlers::list_users))
        .route(
            "/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api", get(handlers::api_handler))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::expose_error_detail,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::add_security_headers,
        ))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
