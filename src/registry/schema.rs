//! Registry table definitions.
//!
//! Creation is idempotent; running it against an existing database leaves
//! stored records untouched.

use sqlx::SqlitePool;
use tracing::{debug, instrument};

use crate::error::RegistryError;

const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS host (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        connection TEXT NOT NULL,
        endpoint_url TEXT,
        address TEXT,
        ssh_user TEXT,
        ssh_key_path TEXT,
        ssh_port INTEGER NOT NULL DEFAULT 22,
        sudo_user TEXT,
        sudo_password TEXT
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS stack (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        compose_file TEXT NOT NULL,
        host_id INTEGER NOT NULL REFERENCES host(id)
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_stack_host_id ON stack(host_id)",
];

/// Create any missing registry tables.
///
/// # Errors
///
/// Returns `RegistryError::Storage` if a statement fails.
#[instrument(skip(pool))]
pub async fn create(pool: &SqlitePool) -> Result<(), RegistryError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RegistryError::Storage {
                message: format!("schema creation failed: {e}"),
            })?;
    }
    debug!(tables = 2, "registry schema ready");
    Ok(())
}
