//! 探测服务模块

use std::sync::Arc;

use async_trait::async_trait;
use common::config::AppConfig;
use common::errors::AppError;
use common::models::BackendKind;

use crate::connectors::ConnectorRegistry;
use crate::outcome::ProbeOutcome;

/// 探测服务 Trait
#[async_trait]
pub trait ProbeServiceTrait: Send + Sync {
    /// 对指定后端发起一次连接探测
    async fn probe(&self, kind: BackendKind) -> ProbeOutcome;
}

/// 数据库连通性探测服务
pub struct ProbeService {
    config: Arc<AppConfig>,
    connectors: Arc<ConnectorRegistry>,
}

impl ProbeService {
    pub fn new(config: Arc<AppConfig>, connectors: Arc<ConnectorRegistry>) -> Self {
        Self { config, connectors }
    }
}

#[async_trait]
impl ProbeServiceTrait for ProbeService {
    async fn probe(&self, kind: BackendKind) -> ProbeOutcome {
        let attempt = match self.connectors.get(kind) {
            Some(connector) => connector.connect(&self.config.db).await,
            None => Err(AppError::Config(format!("no connector registered for {}", kind))),
        };
        ProbeOutcome::from_attempt(kind, attempt)
    }
}
