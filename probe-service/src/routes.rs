//! 探测服务路由模块
//!
//! The route table is fixed at startup: `/` plus one path per backend kind.

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use common::models::BackendKind;

use crate::handlers;
use crate::state::AppState;

/// 创建探测路由
pub fn router() -> Router<AppState> {
    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check));

    BackendKind::ALL
        .into_iter()
        .fold(router, |router, kind| router.route(kind.path(), probe_route(kind)))
        .fallback(handlers::not_found)
}

fn probe_route(kind: BackendKind) -> MethodRouter<AppState> {
    match kind {
        BackendKind::Postgres => get(handlers::probe_postgresql),
        BackendKind::MySql => get(handlers::probe_mysql),
        BackendKind::MongoDb => get(handlers::probe_mongodb),
    }
}
