//! Local item cache backed by SQLite.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::models::{self, decode_blocks, Item, ItemStatus, TranslationString};

pub const SCHEMA_VERSION: i64 = 1;
const LAST_UPDATE_KEY: &str = "last_update";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
      id TEXT PRIMARY KEY,
      category TEXT NOT NULL,
      name TEXT NOT NULL,
      color TEXT NOT NULL,
      status TEXT NOT NULL,
      icon_path TEXT,
      info_blocks TEXT NOT NULL
    ) WITHOUT ROWID;
    CREATE INDEX IF NOT EXISTS items_category ON items (category);
    CREATE TABLE IF NOT EXISTS meta (
      k TEXT PRIMARY KEY,
      v TEXT NOT NULL
    ) WITHOUT ROWID;
";

const INSERT_ITEM: &str = "INSERT OR REPLACE INTO items
      (id, category, name, color, status, icon_path, info_blocks)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const SELECT_ITEM: &str =
    "SELECT id, category, name, color, status, icon_path, info_blocks FROM items";

/// Raw row, decoded outside the rusqlite closure so decode errors keep their type.
struct ItemRow {
    id: String,
    category: String,
    name: String,
    color: String,
    status: String,
    icon_path: Option<String>,
    info_blocks: String,
}

impl ItemRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            category: row.get(1)?,
            name: row.get(2)?,
            color: row.get(3)?,
            status: row.get(4)?,
            icon_path: row.get(5)?,
            info_blocks: row.get(6)?,
        })
    }

    fn decode(self) -> Result<Item> {
        let context = |field: &str| format!("cached item {} ({field})", self.id);
        let name: TranslationString =
            models::from_str(&self.name).map_err(|e| CatalogError::decode(context("name"), e))?;
        let status: ItemStatus =
            models::from_str(&self.status).map_err(|e| CatalogError::decode(context("status"), e))?;
        let raw_blocks: Vec<Value> = models::from_str(&self.info_blocks)
            .map_err(|e| CatalogError::decode(context("info_blocks"), e))?;
        let info_blocks =
            decode_blocks(raw_blocks).map_err(|e| CatalogError::decode(context("info_blocks"), e))?;

        Ok(Item {
            id: self.id,
            category: self.category,
            name,
            color: self.color,
            status,
            info_blocks,
            icon_path: self.icon_path,
        })
    }
}

fn encode(item: &Item) -> Result<(String, String, String)> {
    let ctx = |field: &str| format!("item {} ({field})", item.id);
    let name =
        serde_json::to_string(&item.name).map_err(|e| CatalogError::encode(ctx("name"), e))?;
    let status =
        serde_json::to_string(&item.status).map_err(|e| CatalogError::encode(ctx("status"), e))?;
    let blocks = serde_json::to_string(&item.info_blocks)
        .map_err(|e| CatalogError::encode(ctx("info_blocks"), e))?;
    Ok((name, status, blocks))
}

fn insert_with(conn: &Connection, item: &Item) -> Result<()> {
    let (name, status, blocks) = encode(item)?;
    conn.prepare_cached(INSERT_ITEM)?.execute(params![
        item.id,
        item.category,
        name,
        item.color,
        status,
        item.icon_path,
        blocks
    ])?;
    Ok(())
}

/// The item cache: one `items` table plus a `meta` key/value table.
pub struct ItemStore {
    conn: Connection,
}

impl ItemStore {
    /// Open (or create) the cache file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened item cache");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(&format!("PRAGMA user_version={SCHEMA_VERSION};"))?;
        Ok(Self { conn })
    }

    /// Insert or replace a single item.
    pub fn insert(&self, item: &Item) -> Result<()> {
        insert_with(&self.conn, item)
    }

    /// Insert or replace many items in one transaction.
    pub fn insert_all(&mut self, items: &[Item]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for item in items {
            insert_with(&tx, item)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM items", [])?;
        Ok(())
    }

    /// Replace the whole catalog and record the remote timestamp it came from.
    ///
    /// Either everything is applied or nothing is.
    pub fn replace_all(&mut self, items: &[Item], updated_at: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM items", [])?;
        for item in items {
            insert_with(&tx, item)?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO meta (k, v) VALUES (?1, ?2)",
            params![LAST_UPDATE_KEY, updated_at],
        )?;
        tx.commit()?;
        tracing::info!(items = items.len(), updated_at, "catalog replaced");
        Ok(())
    }

    /// All cached items, ordered by category then id.
    pub fn all_items(&self) -> Result<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_ITEM} ORDER BY category, id"))?;
        let rows = stmt
            .query_map([], ItemRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ItemRow::decode).collect()
    }

    pub fn item_by_id(&self, id: &str) -> Result<Option<Item>> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_ITEM} WHERE id = ?1"),
                params![id],
                ItemRow::from_row,
            )
            .optional()?;
        row.map(ItemRow::decode).transpose()
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Remote `updated_at` of the last applied refresh.
    pub fn last_update(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT v FROM meta WHERE k = ?1",
                params![LAST_UPDATE_KEY],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_last_update(&self, updated_at: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (k, v) VALUES (?1, ?2)",
            params![LAST_UPDATE_KEY, updated_at],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_failures_are_not_reported_as_decode() {
        let source = serde_json::from_str::<i32>("x").unwrap_err();
        let err = CatalogError::encode("item a1 (name)", source);

        assert!(matches!(err, CatalogError::Encode { .. }));
        assert!(err.to_string().starts_with("Failed to encode item a1 (name)"), "{err}");
    }
}
