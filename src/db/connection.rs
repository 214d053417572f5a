use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SURREALDB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "mediagoblin".to_string()),
            database: env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "api".to_string()),
            username: env::var("SURREALDB_USERNAME").ok(),
            password: env::var("SURREALDB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = vec![
        // Users
        "DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS user_username ON TABLE user COLUMNS username UNIQUE;",
        // Media entries
        "DEFINE TABLE IF NOT EXISTS media_entry SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS media_entry_uploader ON TABLE media_entry COLUMNS uploader;
         DEFINE INDEX IF NOT EXISTS media_entry_state ON TABLE media_entry COLUMNS state;",
        // Access tokens
        "DEFINE TABLE IF NOT EXISTS access_token SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS access_token_hash ON TABLE access_token COLUMNS token_hash UNIQUE;
         DEFINE INDEX IF NOT EXISTS access_token_prefix ON TABLE access_token COLUMNS token_prefix;",
    ];

    for query in schema_queries {
        db.query(query).await?.check()?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_db() -> Db {
    let config = DatabaseConfig {
        url: "memory".to_string(),
        ..Default::default()
    };
    let db = create_connection(config).await.unwrap();
    ensure_schema(&db).await.unwrap();
    db
}
