use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use media_api::auth::strategies::issue_access_token;
use media_api::{
    AppState, DatabaseConfig, Db, MediaEntryCreate, MediaState, QueryBuilder, TokenPrefix,
    UserStore, create_connection, ensure_schema, load_app_config, record_key,
};

#[derive(Parser)]
#[command(name = "media-api")]
#[command(about = "JSON API for a media hosting site")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Server {
        /// Bind address, e.g. 0.0.0.0:6543
        #[arg(long, env = "MEDIA_API_BIND", default_value = "0.0.0.0:6543")]
        bind: String,
        #[arg(long, env = "MEDIA_API_DB_URL", default_value = "memory")]
        db_url: String,
        /// Path to media-api.json (defaults to the usual search locations)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Initialize the database
    Init {
        #[arg(long, env = "MEDIA_API_DB_URL", default_value = "memory")]
        db_url: String,
    },
    /// Create a user that can log in with HTTP Basic auth
    CreateUser {
        username: String,
        #[arg(long, env = "MEDIA_API_PASSWORD")]
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Rendered bio (defaults to the plain bio)
        #[arg(long)]
        bio_html: Option<String>,
        #[arg(long, env = "MEDIA_API_DB_URL", default_value = "memory")]
        db_url: String,
    },
    /// Create an access token for a user
    CreateToken {
        username: String,
        /// Human-readable name for this token
        #[arg(long)]
        name: Option<String>,
        /// Number of days until the token expires (omit for no expiration)
        #[arg(long)]
        expires_days: Option<u32>,
        #[arg(long, env = "MEDIA_API_DB_URL", default_value = "memory")]
        db_url: String,
    },
    /// List access tokens
    ListTokens {
        #[arg(long, env = "MEDIA_API_DB_URL", default_value = "memory")]
        db_url: String,
        /// Show only active tokens
        #[arg(long, default_value_t = false)]
        active_only: bool,
    },
    /// Revoke an access token by its prefix
    RevokeToken {
        /// The token prefix to revoke (e.g., "mg_abc12345")
        token_prefix: String,
        #[arg(long, env = "MEDIA_API_DB_URL", default_value = "memory")]
        db_url: String,
    },
    /// Register an already stored media file as an entry
    AddEntry {
        /// Uploader username
        username: String,
        title: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        description_html: Option<String>,
        #[arg(long)]
        license: Option<String>,
        #[arg(long, default_value = "mediagoblin.media_types.image")]
        media_type: String,
        #[arg(long, default_value = "processed")]
        state: String,
        /// File as role=segment/segment/..., e.g. original=media_entries/1/sunset.jpg
        #[arg(long = "file", value_parser = parse_media_file)]
        files: Vec<(String, Vec<String>)>,
        #[arg(long, env = "MEDIA_API_DB_URL", default_value = "memory")]
        db_url: String,
    },
}

fn parse_media_file(raw: &str) -> Result<(String, Vec<String>), String> {
    let (role, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected role=path, got `{}`", raw))?;
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if role.is_empty() || segments.is_empty() {
        return Err(format!("expected role=path, got `{}`", raw));
    }
    Ok((role.to_string(), segments))
}

async fn open_db(db_url: String) -> Result<Db> {
    let db_config = DatabaseConfig {
        url: db_url,
        ..Default::default()
    };
    info!("Using database url: {}", db_config.url);

    let db = create_connection(db_config).await?;
    ensure_schema(&db).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("media_api=info".parse()?))
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server {
            bind,
            db_url,
            config,
        } => {
            let app_config = load_app_config(config)?;
            info!(
                "Starting media API on {} (site root {})",
                bind, app_config.site_root
            );

            let db = open_db(db_url).await?;
            let state = AppState::new(db, app_config)?;

            media_api::server::start_http(state, &bind).await?;
        }
        Commands::Init { db_url } => {
            info!("Initializing database...");
            open_db(db_url).await?;
            info!("Database initialized successfully");
        }
        Commands::CreateUser {
            username,
            password,
            email,
            bio,
            bio_html,
            db_url,
        } => {
            let users = UserStore::new(open_db(db_url).await?);
            let user = users
                .create_user(&username, &password, email.as_deref())
                .await?;

            if let Some(bio) = bio {
                let bio_html = bio_html.unwrap_or_else(|| bio.clone());
                users.set_bio(&user.id, &bio, &bio_html).await?;
            }

            println!("User '{}' created (id {}).", user.username, record_key(&user.id));
        }
        Commands::CreateToken {
            username,
            name,
            expires_days,
            db_url,
        } => {
            let db = open_db(db_url).await?;
            let user = UserStore::new(db.clone())
                .get_user_by_username(&username)
                .await?
                .ok_or_else(|| anyhow!("No user named '{}'", username))?;

            let (token, record) =
                issue_access_token(&db, user.id, name.clone(), expires_days.map(i64::from))
                    .await?;

            println!("Access token created successfully!");
            println!();
            println!("  Token:   {}", token);
            println!("  Prefix:  {}", record.token_prefix);
            println!("  User:    {}", username);
            if let Some(n) = &name {
                println!("  Name:    {}", n);
            }
            match &record.expires_at {
                Some(exp) => println!("  Expires: {}", exp),
                None => println!("  Expires: Never"),
            }
            println!();
            println!("IMPORTANT: Save this token now. It cannot be retrieved later.");
            println!("Use with: /api/test?access_token={}", token);
        }
        Commands::ListTokens {
            db_url,
            active_only,
        } => {
            let db = open_db(db_url).await?;
            let tokens = QueryBuilder::list_access_tokens(&db, active_only).await?;

            if tokens.is_empty() {
                println!("No access tokens found.");
                return Ok(());
            }

            println!(
                "{:<20} {:<20} {:<10} {:<25} {:<25}",
                "PREFIX", "NAME", "STATUS", "CREATED", "LAST USED"
            );
            println!("{}", "-".repeat(100));

            for token in tokens {
                let status = if token.is_active { "Active" } else { "Revoked" };
                let name = token.name.unwrap_or_else(|| "-".to_string());
                let created = token
                    .created_at
                    .map(|dt| dt.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let last_used = token
                    .last_used_at
                    .map(|dt| dt.to_string())
                    .unwrap_or_else(|| "Never".to_string());

                println!(
                    "{:<20} {:<20} {:<10} {:<25} {:<25}",
                    token.token_prefix, name, status, created, last_used
                );
            }
        }
        Commands::RevokeToken {
            token_prefix,
            db_url,
        } => {
            let db = open_db(db_url).await?;
            let revoked =
                QueryBuilder::deactivate_access_token_by_prefix(&db, &TokenPrefix::new(&token_prefix))
                    .await?;

            if revoked {
                println!("Access token '{}' has been revoked.", token_prefix);
            } else {
                println!("No access token found with prefix '{}'.", token_prefix);
            }
        }
        Commands::AddEntry {
            username,
            title,
            slug,
            description,
            description_html,
            license,
            media_type,
            state,
            files,
            db_url,
        } => {
            let state: MediaState = state.parse()?;
            let db = open_db(db_url).await?;
            let uploader = UserStore::new(db.clone())
                .get_user_by_username(&username)
                .await?
                .ok_or_else(|| anyhow!("No user named '{}'", username))?;

            let entry = QueryBuilder::create_media_entry(
                &db,
                &MediaEntryCreate {
                    uploader: uploader.id,
                    title,
                    slug,
                    description_html: description_html.unwrap_or_else(|| description.clone()),
                    description,
                    license,
                    media_type,
                    state,
                    media_files: files.into_iter().collect::<BTreeMap<_, _>>(),
                },
            )
            .await?;

            println!("Media entry '{}' created (id {}).", entry.title, record_key(&entry.id));
        }
    }

    Ok(())
}
