pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::Router;
use state::ApiState;
use tower_http::trace::TraceLayer;

/// Builds the complete `/api` router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<ApiState> {
    Router::new()
        .nest("/characters", routes::marriage::router())
        .merge(routes::health::router())
}
