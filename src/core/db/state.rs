use anyhow::Context;
use sqlx::{
    Sqlite,
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};

use std::path::{Path, PathBuf};

use super::schema::Schema;

/// One short-lived read-only session on a taxonomy database file.
pub(super) struct SessionState {
    db_file: PathBuf,
    pool: SqlitePool,
    schema: Schema,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("db_file", &self.db_file)
            .field("tables", &self.schema.table_names())
            .finish()
    }
}

impl SessionState {
    pub(super) async fn open<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        let db_file = db_file.as_ref().to_path_buf();
        if !db_file.is_file() {
            anyhow::bail!("Database file does not exist: {:?}", db_file);
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(&db_file)
            .read_only(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_opts)
            .await
            .with_context(|| format!("Failed to open database {:?}", db_file))?;

        let schema = Schema::reflect(&pool)
            .await
            .with_context(|| format!("Failed to read schema of {:?}", db_file))?;
        schema
            .require_taxonomy()
            .with_context(|| format!("{:?} is not a taxonomy database", db_file))?;

        Ok(Self {
            db_file,
            pool,
            schema,
        })
    }

    pub(super) async fn conn(&self) -> anyhow::Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    pub(super) fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(super) async fn close(self) {
        self.pool.close().await;
    }
}
