//! Relational schema migrations.

use sqlx::PgPool;
use tracing::info;

use annograph_core::error::{AppError, ErrorKind};

/// Run all pending relational migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running relational migrations");

    // The graph schema may share this database and its migration table.
    let mut migrator = sqlx::migrate!("../../migrations");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Relational migrations completed");
    Ok(())
}
