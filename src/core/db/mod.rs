mod schema;
mod state;
mod taxa;

use std::path::Path;

use log::debug;
use state::SessionState;

pub use schema::Schema;
pub use taxa::{GenusSummary, TaxaRepository, TaxonPhotoCount};

/// Read-only session on a taxonomy database (`photos`, `taxa`, `ranks`, `photos_taxa`).
#[derive(Debug)]
pub struct TaxonomyDb {
    state: SessionState,
}

impl TaxonomyDb {
    pub async fn open<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        let state = SessionState::open(db_file).await?;
        debug!("Opened {:?}", state);
        Ok(Self { state })
    }

    pub fn schema(&self) -> &Schema {
        self.state.schema()
    }

    /// Release the connection pool. Dropping also releases it, without waiting.
    pub async fn close(self) {
        self.state.close().await;
    }
}

impl TaxaRepository for TaxonomyDb {
    async fn photo_count(&self) -> anyhow::Result<i64> {
        let mut conn = self.state.conn().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM photos")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    async fn taxa_photo_count(&self) -> anyhow::Result<Vec<TaxonPhotoCount>> {
        let mut conn = self.state.conn().await?;
        let sql = taxa::taxa_photo_count_sql();
        let rows = sqlx::query_as::<_, TaxonPhotoCount>(&sql)
            .bind("genus")
            .bind("section")
            .bind("species")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    async fn species_count(&self) -> anyhow::Result<usize> {
        Ok(self.taxa_photo_count().await?.len())
    }

    async fn taxa_photo_count_summary(&self) -> anyhow::Result<Vec<GenusSummary>> {
        let mut conn = self.state.conn().await?;
        let sql = taxa::taxa_photo_count_summary_sql();
        let rows = sqlx::query_as::<_, GenusSummary>(&sql)
            .bind("genus")
            .bind("section")
            .bind("species")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }
}
