mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::db::Database;

/// Router with no authentication and permissive CORS.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, &ServerConfig::local())
}

pub fn create_router_with_config(db: Database, config: &ServerConfig) -> Router {
    let mut api = Router::new()
        // Workspaces
        .route(
            "/workspaces",
            get(handlers::list_workspaces).post(handlers::create_workspace),
        )
        .route(
            "/workspaces/{id}",
            get(handlers::get_workspace)
                .put(handlers::update_workspace)
                .delete(handlers::delete_workspace),
        )
        .route(
            "/workspaces/{id}/nodes",
            get(handlers::list_workspace_nodes).post(handlers::create_node),
        )
        .route("/workspaces/{id}/nodes/roots", get(handlers::list_root_nodes))
        .route("/workspaces/{id}/tree", get(handlers::get_node_tree))
        .route("/workspaces/{id}/scaffold", post(handlers::create_scaffold))
        // Nodes
        .route(
            "/nodes/{id}",
            get(handlers::get_node)
                .put(handlers::update_node)
                .delete(handlers::delete_node),
        )
        .route("/nodes/{id}/children", get(handlers::list_children))
        .route("/nodes/{id}/status", put(handlers::set_node_status))
        .route("/nodes/{id}/auto-status", post(handlers::enable_auto_status))
        .route("/nodes/{id}/critical", post(handlers::toggle_critical))
        .route("/nodes/{id}/progress", get(handlers::get_progress))
        .route("/nodes/{id}/confirm", post(handlers::confirm_node));

    if let Some(key) = &config.api_key {
        api = api.route_layer(axum::middleware::from_fn_with_state(
            Arc::new(key.clone()),
            middleware::auth_middleware,
        ));
    }

    let api = api.route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(db)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
