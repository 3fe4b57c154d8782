use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the `jobs` table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id                SERIAL PRIMARY KEY,
            title             TEXT NOT NULL,
            company           TEXT NOT NULL,
            description       TEXT,
            link              TEXT,
            status            TEXT NOT NULL DEFAULT 'Yeni',
            score             BIGINT,
            motivation_letter TEXT,
            summary_tr        TEXT,
            language_reqs     TEXT,
            location          TEXT,
            created_at        TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS jobs_created_at_idx ON jobs (created_at DESC)")
        .execute(pool)
        .await?;

    info!("Schema ready");
    Ok(())
}
