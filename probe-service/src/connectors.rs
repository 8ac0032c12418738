//! Connector adapters.
//!
//! Each adapter opens exactly one connection to its backend, closes it once the
//! attempt has resolved, and reports the result as `AppResult<()>`. No pools,
//! no retries, no timeouts beyond the client defaults.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::config::DbSettings;
use common::errors::{AppError, AppResult};
use common::models::{BackendKind, ConnectionTarget};
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, MySqlConnection, PgConnection};

/// A backend-specific connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Backend this connector talks to.
    fn kind(&self) -> BackendKind;

    /// Opens one connection and closes it again.
    async fn connect(&self, settings: &DbSettings) -> AppResult<()>;
}

/// PostgreSQL adapter backed by a single `sqlx::PgConnection`.
pub struct PostgresConnector;

/// Connect options with every setting passed as its own field.
///
/// An empty user, password or database name is left to the client default.
pub fn postgres_options(settings: &DbSettings) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port);
    if !settings.user.is_empty() {
        options = options.username(&settings.user);
    }
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }
    if !settings.name.is_empty() {
        options = options.database(&settings.name);
    }
    options
}

#[async_trait]
impl Connector for PostgresConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn connect(&self, settings: &DbSettings) -> AppResult<()> {
        let target = ConnectionTarget::new(self.kind(), settings);
        tracing::debug!(url = %target.redacted_url(), "Connecting to PostgreSQL");

        let conn = PgConnection::connect_with(&postgres_options(settings))
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "PostgreSQL connection did not close cleanly");
        }
        Ok(())
    }
}

/// MySQL adapter backed by a single `sqlx::MySqlConnection`.
pub struct MySqlConnector;

/// Connect options with host, port and user passed as configured.
///
/// No default schema is selected when the database name is empty.
pub fn mysql_options(settings: &DbSettings) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user);
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }
    if !settings.name.is_empty() {
        options = options.database(&settings.name);
    }
    options
}

#[async_trait]
impl Connector for MySqlConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::MySql
    }

    async fn connect(&self, settings: &DbSettings) -> AppResult<()> {
        let target = ConnectionTarget::new(self.kind(), settings);
        tracing::debug!(url = %target.redacted_url(), "Connecting to MySQL");

        let conn = MySqlConnection::connect_with(&mysql_options(settings))
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "MySQL connection did not close cleanly");
        }
        Ok(())
    }
}

/// MongoDB adapter.
///
/// The driver connects lazily, so a `ping` on `admin` forces the handshake
/// (and authentication, when credentials are configured).
pub struct MongoConnector;

/// Client options for a single host.
///
/// Credentials are attached only when a user is configured; the database
/// name becomes their authentication source.
pub fn mongo_options(settings: &DbSettings) -> ClientOptions {
    let mut options = ClientOptions::builder()
        .hosts(vec![ServerAddress::Tcp {
            host: settings.host.clone(),
            port: Some(settings.port),
        }])
        .build();

    if settings.user.is_empty() {
        if !settings.password.is_empty() {
            tracing::warn!("DB_PASSWORD is set without DB_USER; MongoDB is contacted without credentials");
        }
        return options;
    }

    let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());
    options.credential = Some(
        Credential::builder()
            .username(settings.user.clone())
            .password(non_empty(&settings.password))
            .source(non_empty(&settings.name))
            .build(),
    );
    options
}

/// Builds a client, pings `admin`, and shuts the client down.
async fn ping(options: ClientOptions) -> AppResult<()> {
    let client = mongodb::Client::with_options(options)
        .map_err(|e| AppError::MongoConnection(e.to_string()))?;

    let result = client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|e| AppError::MongoConnection(e.to_string()));

    client.shutdown().await;
    result
}

#[async_trait]
impl Connector for MongoConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::MongoDb
    }

    async fn connect(&self, settings: &DbSettings) -> AppResult<()> {
        let target = ConnectionTarget::new(self.kind(), settings);
        tracing::debug!(url = %target.redacted_url(), "Connecting to MongoDB");

        ping(mongo_options(settings)).await
    }
}

/// Immutable mapping from backend kind to its connector.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<BackendKind, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry wired to the real database clients.
    pub fn standard() -> Self {
        Self::new()
            .with(PostgresConnector)
            .with(MySqlConnector)
            .with(MongoConnector)
    }

    /// Registers a connector under its own kind, replacing any previous one.
    pub fn with<C: Connector + 'static>(mut self, connector: C) -> Self {
        self.connectors.insert(connector.kind(), Arc::new(connector));
        self
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn Connector>> {
        self.connectors.get(&kind).cloned()
    }

    /// Registered kinds in route order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.connectors.contains_key(kind))
            .collect()
    }
}
