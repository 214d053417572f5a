// REST API endpoints for media entries

pub mod error;
pub mod response;
pub mod serialize;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use surrealdb::RecordId;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::auth::{StrategyRegistry, UserContext, UserStore, build_registry, protect};
use crate::config::AppConfig;
use crate::db::schema::MediaEntryRecord;
use crate::db::{Db, QueryBuilder};
use crate::model::{MediaEntry, MediaState, User};
use crate::urlgen::UrlGen;

use self::error::ApiError;
use self::response::{Cors, json_response};
use self::serialize::{EntrySerializable, entry_serializable};

/// Shared, read-only state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub users: UserStore,
    pub config: Arc<AppConfig>,
    pub urlgen: Arc<UrlGen>,
    pub registry: Arc<StrategyRegistry>,
}

impl AppState {
    /// State with the built-in strategies named in `config`.
    pub fn new(db: Db, config: AppConfig) -> anyhow::Result<Self> {
        let registry = build_registry(&config.strategies, &db)?;
        Self::with_registry(db, config, registry)
    }

    pub fn with_registry(
        db: Db,
        config: AppConfig,
        registry: StrategyRegistry,
    ) -> anyhow::Result<Self> {
        let urlgen = UrlGen::new(config.site_root.clone())?;
        Ok(Self {
            users: UserStore::new(db.clone()),
            db,
            config: Arc::new(config),
            urlgen: Arc::new(urlgen),
            registry: Arc::new(registry),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/test", get(api_test))
        .route("/api/entries", get(get_entries))
        .route("/api/entries/{entry_id}", get(get_entry));

    Router::new()
        .route("/health", get(health_check))
        .merge(protect(protected, state.registry.clone()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Echo the authenticated user.
async fn api_test(Extension(user): Extension<UserContext>) -> Result<Response, ApiError> {
    json_response(
        &serde_json::json!({
            "username": user.username(),
            "email": user.email(),
        }),
        Cors::Allow,
    )
}

#[derive(Debug, Deserialize)]
struct EntriesQuery {
    limit: Option<String>,
}

/// Requested page size, defaulted and capped by configuration.
fn entries_limit(raw: Option<&str>, config: &AppConfig) -> Result<u32, ApiError> {
    let limit = match raw.map(str::trim) {
        None | Some("") => config.default_entries_limit,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ApiError::BadRequest(format!("invalid limit `{}`", raw)))?,
    };
    Ok(limit.min(config.max_entries_limit))
}

/// Processed entries, newest first.
async fn get_entries(
    State(state): State<AppState>,
    Query(query): Query<EntriesQuery>,
) -> Result<Response, ApiError> {
    let limit = entries_limit(query.limit.as_deref(), &state.config)?;

    let records =
        QueryBuilder::list_media_entries_by_state(&state.db, MediaState::Processed.as_str(), limit)
            .await?;
    debug!(count = records.len(), limit, "Listing media entries");

    let mut uploaders: HashMap<String, User> = HashMap::new();
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        entries.push(serialize_record(&state, record, &mut uploaders).await?);
    }

    json_response(&entries, Cors::Allow)
}

async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = RecordId::from_table_key("media_entry", entry_id.as_str());
    let record = QueryBuilder::find_media_entry_by_id(&state.db, id)
        .await?
        .filter(|record| record.state == MediaState::Processed.as_str())
        .ok_or_else(|| ApiError::NotFound(format!("No media entry `{}`", entry_id)))?;

    let entry = serialize_record(&state, record, &mut HashMap::new()).await?;
    json_response(&entry, Cors::Allow)
}

async fn serialize_record(
    state: &AppState,
    record: MediaEntryRecord,
    uploaders: &mut HashMap<String, User>,
) -> Result<EntrySerializable, ApiError> {
    let uploader_key = record.uploader.to_string();
    if !uploaders.contains_key(&uploader_key) {
        let uploader = state
            .users
            .get_user_by_id(&record.uploader)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("uploader {} not found", uploader_key)))?;
        uploaders.insert(uploader_key.clone(), User::from(uploader));
    }
    let uploader = &uploaders[&uploader_key];

    let entry = MediaEntry::try_from(record)?;
    Ok(entry_serializable(
        &entry,
        uploader,
        &state.urlgen,
        &state.config.public_store,
    )?)
}
