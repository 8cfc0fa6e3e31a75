//! Database helpers: migrations and path handling.

use sqlx::SqlitePool;
use std::{fs, io, path::Path};
use tracing::debug;

/// Run SQLite migrations to create tables if absent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id BLOB PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS smtp_configs (
            id BLOB PRIMARY KEY,
            user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            host TEXT NOT NULL,
            port INTEGER NOT NULL CHECK (port BETWEEN 1 AND 65535),
            username TEXT NOT NULL,
            password TEXT NOT NULL,
            from_email TEXT NOT NULL,
            from_name TEXT NULL,
            use_tls INTEGER NOT NULL DEFAULT 1,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS send_history (
            id BLOB PRIMARY KEY,
            user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            smtp_config_id BLOB NULL REFERENCES smtp_configs(id) ON DELETE SET NULL,
            to_recipients TEXT NOT NULL,
            cc_recipients TEXT NULL,
            bcc_recipients TEXT NULL,
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            is_html INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL CHECK (status IN ('sent', 'failed')),
            error_message TEXT NULL,
            sent_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_smtp_configs_user ON smtp_configs(user_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_send_history_user ON send_history(user_id, sent_at)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Filesystem path named by a `sqlite:` URL. In-memory and non-SQLite URLs
/// have none.
fn sqlite_file_path(db_url: &str) -> Option<&Path> {
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = rest.split_once('?').map_or(rest, |(p, _)| p);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

/// Create the database file and its parent directories so the pool can
/// open a file-backed URL on first start.
///
/// # Errors
///
/// Returns the I/O error when the directory or file cannot be created.
pub fn ensure_sqlite_path(db_url: &str) -> io::Result<String> {
    if let Some(path) = sqlite_file_path(db_url) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), "sqlite database file ready");
    }
    Ok(db_url.to_string())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect memory sqlite");
    run_migrations(&pool).await.expect("migrate");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_are_left_alone() {
        assert_eq!(sqlite_file_path("sqlite://:memory:"), None);
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
        assert_eq!(
            ensure_sqlite_path("sqlite://:memory:").unwrap(),
            "sqlite://:memory:"
        );
    }

    #[test]
    fn file_urls_name_their_path() {
        assert_eq!(
            sqlite_file_path("sqlite://data/mail.db?mode=rwc"),
            Some(Path::new("data/mail.db"))
        );
        assert_eq!(sqlite_file_path("sqlite:mail.db"), Some(Path::new("mail.db")));
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let dir = std::env::temp_dir().join(format!("mailroom-db-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        // A regular file where a parent directory is expected.
        let blocker = dir.join("blocker");
        fs::write(&blocker, b"").unwrap();
        let url = format!("sqlite://{}/mail.db", blocker.display());
        assert!(ensure_sqlite_path(&url).is_err());

        let url = format!("sqlite://{}/nested/mail.db", dir.display());
        assert_eq!(ensure_sqlite_path(&url).unwrap(), url);
        assert!(dir.join("nested/mail.db").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();
        let (n,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'sessions', 'smtp_configs', 'send_history')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(n, 4);
    }
}
