mod common;

use common::*;

#[tokio::test]
async fn test_simple() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = create_taxonomy_db(&dir).await;
    let db: TaxonomyDb = TaxonomyDb::open(&path).await?;

    assert_eq!(db.photo_count().await?, 10);
    assert!(db.schema().has_column("taxa", "parent_id"));

    db.close().await;
    Ok(())
}
