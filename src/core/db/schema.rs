use std::collections::BTreeMap;

use sqlx::SqlitePool;

/// Tables and columns a taxonomy database must provide
const REQUIRED: &[(&str, &[&str])] = &[
    ("photos", &["id"]),
    ("ranks", &["id", "name"]),
    ("taxa", &["id", "rank_id", "name"]),
    ("photos_taxa", &["photo_id", "taxon_id"]),
];

/// Tables and their column names as found in the database file
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: BTreeMap<String, Vec<String>>,
}

impl Schema {
    pub async fn reflect(pool: &SqlitePool) -> anyhow::Result<Self> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') ORDER BY name",
        )
        .fetch_all(pool)
        .await?;

        let mut tables = BTreeMap::new();
        for name in names {
            let columns = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?)")
                .bind(name.as_str())
                .fetch_all(pool)
                .await?;
            tables.insert(name, columns);
        }
        Ok(Self { tables })
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|cols| cols.iter().any(|c| c == column))
    }

    pub fn require_taxonomy(&self) -> anyhow::Result<()> {
        for (table, columns) in REQUIRED {
            if !self.tables.contains_key(*table) {
                anyhow::bail!("missing table `{}`", table);
            }
            for column in *columns {
                if !self.has_column(table, column) {
                    anyhow::bail!("table `{}` has no column `{}`", table, column);
                }
            }
        }
        Ok(())
    }
}
