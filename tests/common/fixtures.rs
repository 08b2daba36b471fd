use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub const SPECIMEN_COLOR: Rgb<u8> = Rgb([180, 60, 140]);
pub const BACKDROP_COLOR: Rgb<u8> = Rgb([235, 235, 225]);

/// Creates a `width` x `height` backdrop with a uniformly coloured rectangular specimen.
pub fn specimen_image(width: u32, height: u32, specimen: (u32, u32, u32, u32)) -> RgbImage {
    let (x0, y0, w, h) = specimen;
    RgbImage::from_fn(width, height, |x, y| {
        if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
            SPECIMEN_COLOR
        } else {
            BACKDROP_COLOR
        }
    })
}

/// Binary mask that is 255 exactly on the pixels of `color`.
pub fn mask_of(image: &RgbImage, color: Rgb<u8>) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([if *image.get_pixel(x, y) == color { 255 } else { 0 }])
    })
}

const TAXONOMY_SCHEMA: &str = r#"
CREATE TABLE ranks (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
CREATE TABLE taxa (
    id INTEGER PRIMARY KEY,
    rank_id INTEGER NOT NULL REFERENCES ranks(id),
    parent_id INTEGER REFERENCES taxa(id),
    name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE photos (id INTEGER PRIMARY KEY, md5sum TEXT NOT NULL, path TEXT NOT NULL);
CREATE TABLE photos_taxa (
    photo_id INTEGER NOT NULL REFERENCES photos(id),
    taxon_id INTEGER NOT NULL REFERENCES taxa(id),
    PRIMARY KEY (photo_id, taxon_id)
);
INSERT INTO ranks (id, name) VALUES (1, 'genus'), (2, 'section'), (3, 'species');
INSERT INTO taxa (id, rank_id, parent_id, name) VALUES
    (1, 1, NULL, 'Cypripedium'),
    (2, 1, NULL, 'Paphiopedilum'),
    (3, 2, 1, 'Arietinum'),
    (4, 2, 1, 'Obtusipetala'),
    (5, 3, 3, 'plectrochilum'),
    (6, 3, 4, 'flavum'),
    (7, 3, 4, 'reginae'),
    (8, 3, 2, 'armeniacum');
"#;

async fn writable_pool(path: &Path) -> SqlitePool {
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .expect("Failed to create fixture database")
}

async fn add_photo(pool: &SqlitePool, id: i64, taxa: &[i64]) {
    sqlx::query("INSERT INTO photos (id, md5sum, path) VALUES (?, ?, ?)")
        .bind(id)
        .bind(format!("{:032x}", id))
        .bind(format!("photos/{}.jpg", id))
        .execute(pool)
        .await
        .expect("Failed to insert photo");
    for taxon in taxa {
        sqlx::query("INSERT INTO photos_taxa (photo_id, taxon_id) VALUES (?, ?)")
            .bind(id)
            .bind(*taxon)
            .execute(pool)
            .await
            .expect("Failed to link photo to taxon");
    }
}

/// Creates a taxonomy database in `dir` with ten photos:
///
/// | genus         | section      | species       | photos |
/// |---------------|--------------|---------------|--------|
/// | Cypripedium   | Arietinum    | plectrochilum | 2      |
/// | Cypripedium   | Obtusipetala | flavum        | 3      |
/// | Cypripedium   | Obtusipetala | reginae       | 1      |
/// | Paphiopedilum | -            | armeniacum    | 4      |
pub async fn create_taxonomy_db(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("meta.db");
    let pool = writable_pool(&path).await;
    sqlx::raw_sql(TAXONOMY_SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create fixture schema");

    // photo count and linked taxa (genus, section, species) per group
    let groups: [(usize, &[i64]); 4] = [
        (2, &[1, 3, 5]),
        (3, &[1, 4, 6]),
        (1, &[1, 4, 7]),
        (4, &[2, 8]),
    ];
    let mut id = 0;
    for (count, taxa) in groups {
        for _ in 0..count {
            id += 1;
            add_photo(&pool, id, taxa).await;
        }
    }

    pool.close().await;
    path
}

/// Creates a database file that has no taxonomy tables.
pub async fn create_unrelated_db(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("unrelated.db");
    let pool = writable_pool(&path).await;
    sqlx::raw_sql("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")
        .execute(&pool)
        .await
        .expect("Failed to create unrelated schema");
    pool.close().await;
    path
}
