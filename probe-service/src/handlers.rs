//! Handler模块

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use common::models::BackendKind;
use serde::Serialize;
use utoipa::ToSchema;

use crate::outcome::plain_text;
use crate::service::ProbeServiceTrait;
use crate::state::AppState;

pub const HELP_TEXT: &str = r#"Hello DB! Try "/postgresql", "/mysql", or "/mongodb"."#;

/// 首页，列出可用的探测路径
#[utoipa::path(
    get,
    path = "/",
    tag = "probe",
    responses(
        (status = 200, description = "帮助信息", body = String, content_type = "text/plain")
    )
)]
pub async fn index() -> Response {
    plain_text(StatusCode::OK, HELP_TEXT)
}

/// 探测 PostgreSQL 连接
#[utoipa::path(
    get,
    path = "/postgresql",
    tag = "probe",
    responses(
        (status = 200, description = "Connected successfully", body = String, content_type = "text/plain"),
        (status = 500, description = "Could not connect to database", body = String, content_type = "text/plain")
    )
)]
pub async fn probe_postgresql(State(state): State<AppState>) -> Response {
    probe(&state, BackendKind::Postgres).await
}

/// 探测 MySQL 连接
#[utoipa::path(
    get,
    path = "/mysql",
    tag = "probe",
    responses(
        (status = 200, description = "Connected successfully", body = String, content_type = "text/plain"),
        (status = 500, description = "Could not connect to database", body = String, content_type = "text/plain")
    )
)]
pub async fn probe_mysql(State(state): State<AppState>) -> Response {
    probe(&state, BackendKind::MySql).await
}

/// 探测 MongoDB 连接
#[utoipa::path(
    get,
    path = "/mongodb",
    tag = "probe",
    responses(
        (status = 200, description = "Connected successfully", body = String, content_type = "text/plain"),
        (status = 500, description = "Could not connect to database", body = String, content_type = "text/plain")
    )
)]
pub async fn probe_mongodb(State(state): State<AppState>) -> Response {
    probe(&state, BackendKind::MongoDb).await
}

async fn probe(state: &AppState, kind: BackendKind) -> Response {
    state.probe_service().probe(kind).await.into_response()
}

/// 健康检查端点，不访问数据库
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: crate::SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// 未知路径
pub async fn not_found() -> Response {
    plain_text(StatusCode::NOT_FOUND, "Not found")
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
