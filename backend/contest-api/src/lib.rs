use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod delivery;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .nest("/api/contests", contest_routes())
        .route("/api/students", post(handlers::contests::create_student))
        .nest("/api/sessions", session_routes())
        .nest("/api/mcq", mcq_routes(app_state.clone()))
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn contest_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::contests::list_contests).post(handlers::contests::create_contest),
        )
        .route(
            "/{contest_id}",
            get(handlers::contests::get_contest).delete(handlers::contests::delete_contest),
        )
        .route("/{contest_id}/stats", get(handlers::contests::contest_stats))
        .route(
            "/{contest_id}/students",
            get(handlers::contests::contest_students),
        )
        .route(
            "/{contest_id}/registrations",
            post(handlers::contests::register_student),
        )
        .route(
            "/{contest_id}/coding-assessment",
            put(handlers::contests::save_coding_assessment),
        )
        .route(
            "/{contest_id}/problem-set",
            get(handlers::contests::problem_set),
        )
        .route(
            "/{contest_id}/sessions/{student_id}",
            get(handlers::contests::session_status),
        )
        .route(
            "/{contest_id}/mcq",
            get(handlers::contests::present_assessment),
        )
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::sessions::start_coding_test))
        .route("/start-mcq", post(handlers::sessions::start_session))
        .route("/finish", post(handlers::sessions::finish_session))
}

fn mcq_routes(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new().route("/token", post(handlers::questions::issue_token));

    let protected_routes = Router::new()
        .route("/assessment", post(handlers::questions::save_assessment))
        .route(
            "/questions",
            get(handlers::questions::list_questions)
                .post(handlers::questions::append_questions)
                .put(handlers::questions::update_question),
        )
        .route(
            "/questions/finish",
            post(handlers::questions::replace_questions),
        )
        .route(
            "/questions/import",
            post(handlers::questions::import_questions),
        )
        .route("/publish", post(handlers::questions::publish))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::contest_token_middleware,
        ));

    public_routes.merge(protected_routes)
}
