#![allow(dead_code)]

use tempfile::TempDir;

use tributa_crm::db::{DbPool, establish_connection_pool, run_migrations};
use tributa_crm::domain::rut::Rut;

/// Builds a valid RUT from a numeric body, recomputing the verification
/// character independently of the crate under test.
pub fn rut_for(body: u32) -> Rut {
    let digits = body.to_string();
    let mut sum = 0;
    let mut weight = 2;
    for d in digits.chars().rev() {
        sum += d.to_digit(10).unwrap() * weight;
        weight = if weight == 7 { 2 } else { weight + 1 };
    }
    let check = match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        d => char::from_digit(d, 10).unwrap(),
    };
    Rut::new(format!("{digits}-{check}")).unwrap()
}

/// Disposable SQLite database for integration tests. The backing file lives
/// in a temp directory that is removed when the fixture drops.
pub struct TestDb {
    pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(file_name: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(file_name);
        let pool = establish_connection_pool(path.to_str().expect("non-utf8 temp path"))
            .expect("failed to build connection pool");
        run_migrations(&pool).expect("failed to run migrations");
        Self { pool, _dir: dir }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
