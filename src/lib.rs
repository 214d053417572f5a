// Core modules
mod config;
mod db;
mod model;
mod storage;
mod types;
mod urlgen;

pub mod api;
pub mod auth;
pub mod server;

// Re-export key types and functions
pub use api::{AppState, create_router};
pub use auth::{AuthStrategy, StrategyRegistry, UserContext, UserStore, protect};
pub use config::{AppConfig, ConfigFile, load_app_config, parse_config};
pub use db::schema::{AccessTokenRecord, MediaEntryCreate, record_key};
pub use db::{DatabaseConfig, Db, QueryBuilder, create_connection, ensure_schema};
pub use model::{MediaEntry, MediaState, User};
pub use storage::{PublicStore, StorageError};
pub use types::{FileRole, StrategyName, TokenHash, TokenPrefix, Username};
pub use urlgen::UrlGen;

use anyhow::Result;

/// Connect to the database, make sure the schema exists and build the
/// application state with the configured strategies.
pub async fn create_app_state(db_config: DatabaseConfig, config: AppConfig) -> Result<AppState> {
    let db = create_connection(db_config).await?;
    ensure_schema(&db).await?;
    AppState::new(db, config)
}
