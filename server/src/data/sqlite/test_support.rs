//! Fixture database shared by store and pipeline tests

use tempfile::TempDir;

use super::SqliteStore;

const FIXTURE: &str = r#"
CREATE VIRTUAL TABLE dogs USING fts5(id, name, age);
INSERT INTO dogs (id, name, age) VALUES ('0001', 'Rex', '5');
INSERT INTO dogs (id, name, age) VALUES ('0002', 'Luna', '3');
INSERT INTO dogs (id, name, age) VALUES ('0003', 'Toby', NULL);
INSERT INTO dogs (id, name, age) VALUES ('0010', 'Rocky', '2005');

CREATE TABLE cat (id TEXT, name TEXT, age TEXT);
INSERT INTO cat (id, name, age) VALUES ('1', 'Tom', '4');

CREATE TABLE owners (id TEXT, name TEXT);
"#;

/// Create a database with an FTS5 `dogs` dataset, a plain `cat` dataset and
/// an `owners` table whose name does not mark it as a dataset.
///
/// The returned directory must outlive the store.
pub(crate) async fn dogs_store() -> (TempDir, SqliteStore) {
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::{ConnectOptions, Connection};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.db");

    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    sqlx::raw_sql(FIXTURE).execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();

    (dir, SqliteStore::open(path))
}
