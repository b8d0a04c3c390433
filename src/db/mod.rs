//! Database layer for SQLite storage.
//!
//! This module handles all database operations including:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - Exclusive transaction scopes for mutating operations
//! - Query helpers per table (`teams`, `users`, `pull_requests`)

pub mod pool;
pub mod pull_requests;
pub mod teams;
pub mod users;

use sqlx::{Sqlite, Transaction};
use std::path::Path;
use thiserror::Error;

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
///
/// # Returns
/// A connection pool configured with WAL mode
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DbError::Migration(format!("Failed to create database directory: {}", e))
        })?;
    }

    let pool = pool::create_pool(db_path).await?;

    run_migrations(&pool).await?;

    log::info!("[db] Database ready at {}", db_path.display());
    Ok(pool)
}

/// Open an exclusive transaction.
///
/// `BEGIN IMMEDIATE` takes the SQLite write lock up front, so the whole
/// read-modify-write sequence of the caller is serialized against every other
/// writer. Contending callers block until the lock is released (bounded by
/// the pool's busy timeout). Dropping the transaction without committing
/// rolls it back.
pub async fn begin_exclusive(
    pool: &pool::DbPool,
) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}


/// Embedded schema migrations, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Apply every migration not yet recorded in `_migrations`.
///
/// Each migration and its bookkeeping row commit together, so an
/// interrupted startup never leaves a half-built schema marked as applied.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    for &(name, sql) in MIGRATIONS {
        let mut tx = begin_exclusive(pool).await?;

        let applied: Option<i64> =
            sqlx::query_scalar("SELECT id FROM _migrations WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;
        if applied.is_some() {
            continue;
        }

        for statement in split_statements(sql) {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!("[db] Applied migration {}", name);
    }

    Ok(())
}

/// Split a migration script into individual statements.
///
/// Statements end at a `;` outside single-quoted literals. `--` comments run
/// to the end of the line and are dropped unless they sit inside a literal.
/// Runs of whitespace collapse to a single space.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                // A doubled quote inside a literal toggles twice and stays inside.
                in_literal = !in_literal;
                current.push(ch);
            }
            '-' if !in_literal && chars.peek() == Some(&'-') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            ';' if !in_literal => push_statement(&mut statements, &mut current),
            _ => current.push(ch),
        }
    }
    push_statement(&mut statements, &mut current);

    statements
}

/// Normalize whitespace and keep the statement if anything is left.
fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let stmt = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !stmt.is_empty() {
        statements.push(stmt);
    }
    current.clear();
}
