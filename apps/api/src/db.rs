use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;

/// Postgres `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";
/// Postgres `invalid_schema_name`.
const INVALID_SCHEMA_NAME: &str = "3F000";
/// Postgres `undefined_function` (e.g. the random prompt function is missing).
const UNDEFINED_FUNCTION: &str = "42883";

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

/// True when a Postgres error code means the schema has not been set up.
pub fn is_missing_schema_code(code: &str) -> bool {
    matches!(code, UNDEFINED_TABLE | INVALID_SCHEMA_NAME | UNDEFINED_FUNCTION)
}

/// Sorts a store failure into "the store is not there" vs. everything else.
/// `otherwise` builds the error for the second case.
pub fn classify_store_error(e: sqlx::Error, otherwise: fn(String) -> AppError) -> AppError {
    match &e {
        sqlx::Error::Database(db_err)
            if db_err.code().is_some_and(|code| is_missing_schema_code(&code)) =>
        {
            AppError::StorageUnavailable(db_err.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::StorageUnavailable(e.to_string())
        }
        _ => otherwise(e.to_string()),
    }
}
