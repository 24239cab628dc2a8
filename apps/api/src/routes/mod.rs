pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::export::handlers::handle_export_pdf;
use crate::rams::handlers::handle_generate;
use crate::rate_limit;
use crate::state::AppState;
use crate::toolbox::handlers::handle_toolbox_talk;

pub fn build_router(state: AppState) -> Router {
    // Only the endpoints that spend provider tokens are rate limited.
    let generation = Router::new()
        .route("/api/v1/generate", post(handle_generate))
        .route("/api/v1/toolbox-talk", post(handle_toolbox_talk))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(generation)
        .route("/api/v1/export/pdf", post(handle_export_pdf))
        .with_state(state)
}
