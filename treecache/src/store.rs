//! A read-only seed store. The core persists nothing of its own; this module
//! only loads the database of record's categories, posts, and attachments
//! once at startup so the coordinator can be seeded per §6 of the design.

use std::collections::HashMap;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use treecache_core::model::Category;
use treecache_core::Coordinator;

pub async fn init_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    tracing::info!(database_url, "connecting to seed database");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Creates the handful of tables this seed store reads from if they don't
/// already exist. Not a migration system — the database of record owns its
/// own schema; this is only here so the demonstration binary runs standalone
/// against an empty file.
async fn ensure_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id INTEGER,
            description TEXT NOT NULL DEFAULT '',
            created INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            created INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS attachments (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            file_size INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn load_categories(pool: &SqlitePool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query("SELECT id, name, parent_id, description, created FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Category {
            id: row.get("id"),
            name: row.get("name"),
            parent_id: row.get("parent_id"),
            depth: 0,
            created: row.get("created"),
            description: row.get("description"),
        })
        .collect())
}

async fn load_post_counts(pool: &SqlitePool) -> anyhow::Result<HashMap<i64, i64>> {
    let rows = sqlx::query("SELECT category_id, COUNT(*) as cnt FROM posts GROUP BY category_id")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.get::<i64, _>("category_id"), row.get::<i64, _>("cnt")))
        .collect())
}

async fn load_post_timestamps_by_category(pool: &SqlitePool) -> anyhow::Result<HashMap<i64, Vec<i64>>> {
    let rows = sqlx::query("SELECT category_id, created FROM posts ORDER BY category_id")
        .fetch_all(pool)
        .await?;
    let mut out: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        out.entry(row.get("category_id")).or_default().push(row.get("created"));
    }
    Ok(out)
}

async fn load_attachment_sizes_by_category(pool: &SqlitePool) -> anyhow::Result<HashMap<i64, Vec<i64>>> {
    let rows = sqlx::query("SELECT category_id, file_size FROM attachments ORDER BY category_id")
        .fetch_all(pool)
        .await?;
    let mut out: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        out.entry(row.get("category_id")).or_default().push(row.get("file_size"));
    }
    Ok(out)
}

/// Seeds the coordinator in the order §6 specifies: hierarchy and post
/// counts first, then per-category activity/file-stats refresh, then a
/// single bottom-up repair of the materialized recursive views.
pub async fn seed_coordinator(pool: &SqlitePool, coordinator: &Coordinator) -> anyhow::Result<()> {
    let categories = load_categories(pool).await?;
    let post_counts = load_post_counts(pool).await?;
    coordinator.seed(categories.clone(), post_counts);

    let posts_by_category = load_post_timestamps_by_category(pool).await?;
    let attachments_by_category = load_attachment_sizes_by_category(pool).await?;

    for category in &categories {
        let timestamps = posts_by_category.get(&category.id).cloned().unwrap_or_default();
        coordinator.activity().refresh(category.id, &timestamps);

        let sizes = attachments_by_category.get(&category.id).cloned().unwrap_or_default();
        coordinator.file_stats().refresh(category.id, &sizes);
    }

    coordinator.repair_recursive_aggregates();
    tracing::info!(categories = categories.len(), "coordinator seeded from store");
    Ok(())
}
