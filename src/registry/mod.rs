//! Persistent registry of Docker hosts and Compose stacks.
//!
//! Records live in `SQLite` through an `sqlx` pool. A [`Registry`] is cheap to
//! clone and safe to share between request handlers; every operation is a
//! single statement or a short transaction, so readers always see a
//! consistent snapshot.
//!
//! Deleting a host that still owns stacks is refused with
//! [`RegistryError::HostInUse`]; stacks are never removed implicitly.

mod schema;
mod types;

use std::str::FromStr;

use camino::Utf8Path;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{info, instrument};

use crate::error::{RecordKind, RegistryError};

pub use types::{ConnectionKind, DEFAULT_SSH_PORT, Host, HostSpec, Stack, StackSpec};

const HOST_COLUMNS: &str = "id, name, connection, endpoint_url, address, ssh_user, \
                            ssh_key_path, ssh_port, sudo_user, sudo_password";

const STACK_COLUMNS: &str = "id, name, compose_file, host_id";

/// Handle to the host and stack tables.
#[derive(Debug, Clone)]
pub struct Registry {
    pool: SqlitePool,
}

impl Registry {
    /// Open (creating if necessary) the database file at `path` and ensure
    /// the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Storage` if the parent directory cannot be
    /// created, the database cannot be opened, or schema creation fails.
    #[instrument]
    pub async fn open(path: &str) -> Result<Self, RegistryError> {
        info!(path, "opening registry");

        if let Some(parent) = Utf8Path::new(path)
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RegistryError::Storage {
                    message: format!("failed to create directory {parent}: {e}"),
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Open a private in-memory database, mainly for tests.
    ///
    /// The pool holds exactly one connection that never expires; `SQLite`
    /// in-memory databases vanish with their last connection.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Storage` if the connection or schema creation
    /// fails.
    pub async fn open_in_memory() -> Result<Self, RegistryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, RegistryError> {
        schema::create(&pool).await?;
        Ok(Self { pool })
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Store a new host and return it with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidRecord` for a blank name or zero port,
    /// and `RegistryError::Storage` if the insert fails.
    #[instrument(skip(self, spec), fields(name = %spec.name, connection = %spec.connection))]
    pub async fn register_host(&self, spec: &HostSpec) -> Result<Host, RegistryError> {
        spec.validate()?;

        let result = sqlx::query(
            r"
            INSERT INTO host (name, connection, endpoint_url, address, ssh_user,
                              ssh_key_path, ssh_port, sudo_user, sudo_password)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&spec.name)
        .bind(spec.connection.as_str())
        .bind(&spec.endpoint_url)
        .bind(&spec.address)
        .bind(&spec.ssh_user)
        .bind(&spec.ssh_key_path)
        .bind(i64::from(spec.ssh_port))
        .bind(&spec.sudo_user)
        .bind(&spec.sudo_password)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(host_id = id, "host registered");
        Ok(Host {
            id,
            spec: spec.clone(),
        })
    }

    /// All hosts in identifier order.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Storage` if the query or row decoding fails.
    #[instrument(skip(self))]
    pub async fn list_hosts(&self) -> Result<Vec<Host>, RegistryError> {
        let rows = sqlx::query(&format!("SELECT {HOST_COLUMNS} FROM host ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(host_from_row).collect()
    }

    /// Fetch a single host.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if no host has this identifier.
    #[instrument(skip(self))]
    pub async fn get_host(&self, id: i64) -> Result<Host, RegistryError> {
        let row = sqlx::query(&format!("SELECT {HOST_COLUMNS} FROM host WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RegistryError::NotFound {
                kind: RecordKind::Host,
                id,
            })?;

        host_from_row(&row)
    }

    /// Delete a host that owns no stacks.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::HostInUse` if stacks still reference the host,
    /// and `RegistryError::NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn delete_host(&self, id: i64) -> Result<(), RegistryError> {
        let mut tx = self.pool.begin().await?;

        let stacks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stack WHERE host_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if stacks > 0 {
            return Err(RegistryError::HostInUse { id, stacks });
        }

        let result = sqlx::query("DELETE FROM host WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound {
                kind: RecordKind::Host,
                id,
            });
        }

        tx.commit().await?;
        info!(host_id = id, "host deleted");
        Ok(())
    }

    /// Bind a new stack to an existing host.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidRecord` for a blank name or a Compose
    /// path that is not absolute, and `RegistryError::NotFound` if the host
    /// does not exist.
    #[instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn register_stack(
        &self,
        host_id: i64,
        spec: &StackSpec,
    ) -> Result<Stack, RegistryError> {
        spec.validate()?;

        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM host WHERE id = ?")
            .bind(host_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RegistryError::NotFound {
                kind: RecordKind::Host,
                id: host_id,
            });
        }

        let result =
            sqlx::query("INSERT INTO stack (name, compose_file, host_id) VALUES (?, ?, ?)")
                .bind(&spec.name)
                .bind(&spec.compose_file)
                .bind(host_id)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;

        let id = result.last_insert_rowid();
        info!(stack_id = id, host_id, "stack registered");
        Ok(Stack {
            id,
            host_id,
            spec: spec.clone(),
        })
    }

    /// Stacks bound to `host_id`, in identifier order.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the host does not exist.
    #[instrument(skip(self))]
    pub async fn list_stacks(&self, host_id: i64) -> Result<Vec<Stack>, RegistryError> {
        self.get_host(host_id).await?;

        let rows = sqlx::query(&format!(
            "SELECT {STACK_COLUMNS} FROM stack WHERE host_id = ? ORDER BY id"
        ))
        .bind(host_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stack_from_row).collect()
    }

    /// Fetch a single stack.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if no stack has this identifier.
    #[instrument(skip(self))]
    pub async fn get_stack(&self, id: i64) -> Result<Stack, RegistryError> {
        let row = sqlx::query(&format!("SELECT {STACK_COLUMNS} FROM stack WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RegistryError::NotFound {
                kind: RecordKind::Stack,
                id,
            })?;

        stack_from_row(&row)
    }

    /// Delete a stack record. Nothing is done on the remote host.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the stack does not exist.
    #[instrument(skip(self))]
    pub async fn delete_stack(&self, id: i64) -> Result<(), RegistryError> {
        let result = sqlx::query("DELETE FROM stack WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound {
                kind: RecordKind::Stack,
                id,
            });
        }
        info!(stack_id = id, "stack deleted");
        Ok(())
    }
}

fn host_from_row(row: &SqliteRow) -> Result<Host, RegistryError> {
    let connection: String = row.try_get("connection")?;
    let stored_port: i64 = row.try_get("ssh_port")?;
    let ssh_port = u16::try_from(stored_port).map_err(|_| RegistryError::Storage {
        message: format!("stored ssh_port {stored_port} is out of range"),
    })?;

    Ok(Host {
        id: row.try_get("id")?,
        spec: HostSpec {
            name: row.try_get("name")?,
            connection: ConnectionKind::from_column(&connection)?,
            endpoint_url: row.try_get("endpoint_url")?,
            address: row.try_get("address")?,
            ssh_user: row.try_get("ssh_user")?,
            ssh_key_path: row.try_get("ssh_key_path")?,
            ssh_port,
            sudo_user: row.try_get("sudo_user")?,
            sudo_password: row.try_get("sudo_password")?,
        },
    })
}

fn stack_from_row(row: &SqliteRow) -> Result<Stack, RegistryError> {
    Ok(Stack {
        id: row.try_get("id")?,
        host_id: row.try_get("host_id")?,
        spec: StackSpec {
            name: row.try_get("name")?,
            compose_file: row.try_get("compose_file")?,
        },
    })
}
