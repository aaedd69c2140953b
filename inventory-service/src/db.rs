use anyhow::Result;
use diesel::{Connection, PgConnection};
use diesel_async::{
    pooled_connection::{bb8::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection, RunQueryDsl,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use shared::{retry_with_backoff, ConnectionError};
use tracing::info;

use crate::config::Config;
use crate::store::pool_error;

pub type DbPool = Pool<AsyncPgConnection>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds the connection pool, retrying with backoff until the database
/// answers `SELECT 1` or the attempts run out.
pub async fn connect(config: &Config) -> Result<DbPool, ConnectionError> {
    let url = config.database_url();
    let pool_size = config.db_pool_size.max(1);

    retry_with_backoff(config.retry_policy(), |attempt| {
        let url = url.clone();
        async move {
            info!("Connecting to database (attempt {})", attempt);

            let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
            let pool = Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .await
                .map_err(|e| e.to_string())?;

            {
                let mut conn = pool.get().await.map_err(|e| pool_error(e).to_string())?;
                diesel::sql_query("SELECT 1")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| e.to_string())?;
            }

            Ok::<_, String>(pool)
        }
    })
    .await
}

pub async fn run_migrations(database_url: String) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = PgConnection::establish(&database_url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
        info!("Applied {} pending migrations", applied.len());
        Ok(())
    })
    .await?
}
