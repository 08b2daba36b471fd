use std::future::Future;

/// Photo count of one species, with the genus and (if any) section it belongs to
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaxonPhotoCount {
    pub genus: String,
    pub section: Option<String>,
    pub species: String,
    pub photos: i64,
}

/// Distinct section and species counts plus total photos of one genus
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GenusSummary {
    pub genus: String,
    pub sections: i64,
    pub species: i64,
    pub photos: i64,
}

pub trait TaxaRepository {
    fn photo_count(&self) -> impl Future<Output = anyhow::Result<i64>>;
    fn taxa_photo_count(&self) -> impl Future<Output = anyhow::Result<Vec<TaxonPhotoCount>>>;
    fn species_count(&self) -> impl Future<Output = anyhow::Result<usize>>;
    fn taxa_photo_count_summary(&self) -> impl Future<Output = anyhow::Result<Vec<GenusSummary>>>;
}

/// Photo id paired with the name of its taxon at one rank
pub(super) const RANKED_PHOTOS: &str = r#"
    SELECT pt.photo_id AS id, t.name AS name
    FROM photos_taxa pt
    JOIN taxa t ON t.id = pt.taxon_id
    JOIN ranks r ON r.id = t.rank_id
    WHERE r.name = ?
"#;

pub(super) fn taxa_photo_count_sql() -> String {
    format!(
        r#"
        WITH genus AS ({ranked}), section AS ({ranked}), species AS ({ranked})
        SELECT g.name AS genus, s.name AS section, sp.name AS species, COUNT(p.id) AS photos
        FROM photos p
        JOIN genus g ON g.id = p.id
        LEFT JOIN section s ON s.id = p.id
        JOIN species sp ON sp.id = p.id
        GROUP BY g.name, s.name, sp.name
        ORDER BY g.name, s.name, sp.name
        "#,
        ranked = RANKED_PHOTOS
    )
}

pub(super) fn taxa_photo_count_summary_sql() -> String {
    format!(
        r#"
        WITH genus AS ({ranked}), section AS ({ranked}), species AS ({ranked})
        SELECT g.name AS genus,
               COUNT(DISTINCT s.name) AS sections,
               COUNT(DISTINCT sp.name) AS species,
               COUNT(p.id) AS photos
        FROM photos p
        JOIN genus g ON g.id = p.id
        LEFT JOIN section s ON s.id = p.id
        JOIN species sp ON sp.id = p.id
        GROUP BY g.name
        ORDER BY photos ASC, g.name ASC
        "#,
        ranked = RANKED_PHOTOS
    )
}
