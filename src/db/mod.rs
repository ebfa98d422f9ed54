pub mod models;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/site".to_string()),
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// Connection URL for logs: rebuilt from the parsed options, password masked.
fn redact_url(url: &str) -> String {
    match PgConnectOptions::from_str(url) {
        Ok(options) => format!(
            "postgresql://{}:****@{}:{}/{}",
            options.get_username(),
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or_default()
        ),
        Err(_) => "<unparseable DATABASE_URL>".to_string(),
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!("Database URL: {}", redact_url(&config.url));

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

/// Idempotent schema statements, applied in order at startup.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS site_settings (
        id BIGSERIAL PRIMARY KEY,
        singleton BOOLEAN NOT NULL DEFAULT true UNIQUE CHECK (singleton),
        logo TEXT,
        site_name TEXT NOT NULL,
        contact_email TEXT NOT NULL,
        contact_phone TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS content_blocks (
        id BIGSERIAL PRIMARY KEY,
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        media TEXT,
        is_active BOOLEAN NOT NULL DEFAULT true,
        sort_order INTEGER NOT NULL DEFAULT 0,
        data JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_content_blocks_kind_order
        ON content_blocks(kind, sort_order, created_at DESC)
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_content_blocks_singleton
        ON content_blocks(kind) WHERE kind = 'newsletter'
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS free_ebooks (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        subtitle TEXT NOT NULL,
        description TEXT NOT NULL,
        ebook_file TEXT,
        cover_image TEXT,
        is_active BOOLEAN NOT NULL DEFAULT true,
        download_count BIGINT NOT NULL DEFAULT 0 CHECK (download_count >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_free_ebooks_single_active
        ON free_ebooks(is_active) WHERE is_active
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contact_submissions (
        id BIGSERIAL PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        organization TEXT NOT NULL,
        event_type TEXT NOT NULL,
        event_details TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'new',
        submitted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        contacted_at TIMESTAMPTZ,
        notes TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_contact_submissions_submitted_at
        ON contact_submissions(submitted_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS newsletter_subscriptions (
        id BIGSERIAL PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        source TEXT NOT NULL DEFAULT 'footer',
        is_active BOOLEAN NOT NULL DEFAULT true,
        agreed_to_terms BOOLEAN NOT NULL DEFAULT true,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS system_logs (
        id BIGSERIAL PRIMARY KEY,
        log_level TEXT NOT NULL DEFAULT 'info',
        message TEXT NOT NULL,
        source TEXT NOT NULL,
        user_ip TEXT,
        user_agent TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_system_logs_created_at
        ON system_logs(created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS form_submissions (
        id BIGSERIAL PRIMARY KEY,
        source TEXT NOT NULL,
        form_data JSONB NOT NULL,
        processed BOOLEAN NOT NULL DEFAULT false,
        submitted_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(
        statements = MIGRATIONS.len(),
        "Database migrations completed successfully"
    );

    Ok(())
}
