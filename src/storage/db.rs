use anyhow::{Context, Result};
use log::{debug, info};
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityName, EntityTrait, Schema};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::DatabaseConfig;
use crate::entities::{
    list, list_exclude_repository, list_exclude_tag, list_include_repository, list_include_tag, repository,
    repository_instance, repository_tag, tag,
};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Local storage backed by a SeaORM connection pool.
///
/// The connection is cheap to clone; every store operation borrows it or
/// opens its own transaction on it. Clones share one write gate: SQLite
/// allows a single writer, so mutating transactions queue on the gate instead
/// of racing for the database lock.
#[derive(Clone)]
pub struct LocalStorage {
    pub conn: DatabaseConnection,
    write_gate: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Open the database described by `config` and make sure the schema exists.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        ensure_parent_dir(&config.url)?;

        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false)
            // WAL lets readers proceed while a writer holds the lock
            .map_sqlx_sqlite_opts(|opts| {
                opts.journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
                    .foreign_keys(true)
                    .busy_timeout(BUSY_TIMEOUT)
            });

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", config.url))?;

        let storage = Self::from_connection(conn);
        storage.init_schema().await?;
        info!("Storage: Opened database {}", config.url);
        Ok(storage)
    }

    /// Private in-memory database, used by tests and previews.
    ///
    /// A single pooled connection keeps every query on the same in-memory
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false)
            .map_sqlx_sqlite_opts(|opts| opts.foreign_keys(true).busy_timeout(BUSY_TIMEOUT));

        let conn = Database::connect(options).await.context("Failed to open in-memory database")?;
        let storage = Self::from_connection(conn);
        storage.init_schema().await?;
        Ok(storage)
    }

    fn from_connection(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Wait for exclusive write access. Hold the guard until the mutating
    /// transaction has committed or been dropped.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Create tables and indexes that do not exist yet.
    ///
    /// Parents are created before the join tables that reference them.
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        self.create_table(&schema, tag::Entity).await?;
        self.create_table(&schema, repository::Entity).await?;
        self.create_table(&schema, repository_instance::Entity).await?;
        self.create_table(&schema, repository_tag::Entity).await?;
        self.create_table(&schema, list::Entity).await?;
        self.create_table(&schema, list_include_tag::Entity).await?;
        self.create_table(&schema, list_exclude_tag::Entity).await?;
        self.create_table(&schema, list_include_repository::Entity).await?;
        self.create_table(&schema, list_exclude_repository::Entity).await?;

        for index in unique_indexes() {
            self.conn.execute(backend.build(&index)).await?;
        }

        debug!("Storage: Schema ready");
        Ok(())
    }

    async fn create_table<E>(&self, schema: &Schema, entity: E) -> Result<()>
    where
        E: EntityTrait,
    {
        let backend = self.conn.get_database_backend();
        let table = entity.table_name().to_string();
        let mut statement = schema.create_table_from_entity(entity);
        statement.if_not_exists();
        self.conn
            .execute(backend.build(&statement))
            .await
            .with_context(|| format!("Failed to create table {}", table))?;
        Ok(())
    }

    /// Check if the database has any tracked repositories
    pub async fn has_data(&self) -> Result<bool> {
        use sea_orm::PaginatorTrait;
        Ok(repository_instance::Entity::find().count(&self.conn).await? > 0)
    }
}

/// Composite uniqueness the entity derives cannot express.
fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_tags_user_title")
            .table(tag::Entity)
            .col(tag::Column::UserId)
            .col(tag::Column::Title)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_repositories_provider_full_name")
            .table(repository::Entity)
            .col(repository::Column::Provider)
            .col(repository::Column::FullName)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_repository_instances_user_repository")
            .table(repository_instance::Entity)
            .col(repository_instance::Column::UserId)
            .col(repository_instance::Column::RepositoryId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_lists_user")
            .table(list::Entity)
            .col(list::Column::UserId)
            .if_not_exists()
            .to_owned(),
    ]
}

/// Create the directory holding a file-backed SQLite database.
fn ensure_parent_dir(url: &str) -> Result<()> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }
    }
    Ok(())
}
