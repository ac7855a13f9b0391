use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Database file name inside the persist directory.
const DB_FILE: &str = "tutor.sqlite";

/// Open the collection database.
///
/// With a persist directory, a WAL-mode SQLite file is created under
/// it. Without one the database lives in memory, on a
/// single-connection pool: each SQLite `:memory:` connection is its
/// own database.
pub async fn connect(persist_dir: Option<&Path>) -> Result<SqlitePool> {
    match persist_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;

            let db_path = dir.join(DB_FILE);
            let options =
                SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
                    .create_if_missing(true)
                    .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?;

            Ok(pool)
        }
        None => {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?;

            Ok(pool)
        }
    }
}
