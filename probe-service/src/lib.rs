//! 数据库连通性探测服务
//!
//! 每个请求对一个后端发起一次连接探测：
//! - PostgreSQL / MySQL / MongoDB
//! - 成功返回 200，失败返回 500（纯文本）
//! - 收到终止信号时优雅退出

pub mod connectors;
pub mod handlers;
pub mod lifecycle;
pub mod outcome;
pub mod routes;
pub mod service;
pub mod shutdown;
pub mod state;

use axum::{middleware, routing::get, Json, Router};
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub const SERVICE_NAME: &str = "probe-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "探测服务 API",
        version = "0.1.0",
        description = "数据库连通性探测服务"
    ),
    paths(
        handlers::index,
        handlers::probe_postgresql,
        handlers::probe_mysql,
        handlers::probe_mongodb,
        handlers::health_check,
    ),
    components(schemas(
        common::models::BackendKind,
        handlers::HealthResponse,
    )),
    tags(
        (name = "probe", description = "连接探测端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

/// Builds the HTTP router: probe routes, OpenAPI document, request id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
