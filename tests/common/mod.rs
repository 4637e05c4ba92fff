use std::sync::Arc;

use tempfile::TempDir;

use foliosync::db::{self, DbPool};

/// A file-backed SQLite database with migrations applied, living in a
/// temporary directory that is removed when the value drops.
pub struct TestDb {
    pub pool: Arc<DbPool>,
    _dir: TempDir,
}

pub fn setup_test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = dir
        .path()
        .join("foliosync.db")
        .to_string_lossy()
        .to_string();

    db::init(&db_path).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");

    TestDb { pool, _dir: dir }
}
