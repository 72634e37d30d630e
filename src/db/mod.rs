mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;

/// Which designs a query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignFilter {
    Owner(Uuid),
    Public,
}

impl DesignFilter {
    fn clause(&self) -> (&'static str, String) {
        match self {
            Self::Owner(owner) => ("owner_id = ?1", owner.to_string()),
            Self::Public => ("is_public = ?1", "1".to_string()),
        }
    }
}

/// Document store for designs.
///
/// Designs are stored whole; the store enforces no schema beyond what the
/// design graph validated before handing them over.
pub trait DesignStore: Send + Sync {
    fn find(&self, id: Uuid) -> Result<Option<Design>>;

    fn find_many(
        &self,
        filter: DesignFilter,
        sort: SortField,
        direction: SortDirection,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<Design>>;

    fn count(&self, filter: DesignFilter) -> Result<u64>;

    fn insert(&self, design: &Design) -> Result<()>;

    /// Replace the stored document if its version is still
    /// `expected_version`. Returns `false` when nothing was replaced.
    fn update(&self, design: &Design, expected_version: u32) -> Result<bool>;

    fn delete(&self, id: Uuid) -> Result<bool>;
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "rocket-forge")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("designs.db"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }
}

impl DesignStore for Database {
    fn find(&self, id: Uuid) -> Result<Option<Design>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.query_row(
            "SELECT document FROM designs WHERE id = ?",
            [id.to_string()],
            parse_document,
        )
        .optional()?
        .transpose()
    }

    fn find_many(
        &self,
        filter: DesignFilter,
        sort: SortField,
        direction: SortDirection,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<Design>> {
        let (clause, param) = filter.clause();
        // Sort column and direction come from closed enums, never from input.
        let sql = format!(
            "SELECT document FROM designs WHERE {} ORDER BY {} {}, id LIMIT ?2 OFFSET ?3",
            clause,
            sort.column(),
            direction.as_sql()
        );
        tracing::debug!(?filter, %sql, skip, limit, "Listing designs");

        let offset = i64::try_from(skip).context("Page offset out of range")?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&sql)?;
        let designs = stmt
            .query_map((param, limit, offset), parse_document)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        Ok(designs)
    }

    fn count(&self, filter: DesignFilter) -> Result<u64> {
        let (clause, param) = filter.clause();
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM designs WHERE {}", clause),
            [param],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn insert(&self, design: &Design) -> Result<()> {
        let document = serde_json::to_string(design)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO designs (id, owner_id, name, is_public, version, document, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                design.id.to_string(),
                design.owner_id.to_string(),
                &design.name,
                if design.is_public { 1 } else { 0 },
                design.version,
                &document,
                design.created_at.to_rfc3339(),
                design.updated_at.to_rfc3339(),
            ),
        )
        .with_context(|| format!("Failed to insert design {}", design.id))?;
        Ok(())
    }

    fn update(&self, design: &Design, expected_version: u32) -> Result<bool> {
        let document = serde_json::to_string(design)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE designs SET name = ?, is_public = ?, version = ?, document = ?, updated_at = ?
             WHERE id = ? AND version = ?",
            (
                &design.name,
                if design.is_public { 1 } else { 0 },
                design.version,
                &document,
                design.updated_at.to_rfc3339(),
                design.id.to_string(),
                expected_version,
            ),
        )?;
        Ok(rows > 0)
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM designs WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Decode the document column. JSON errors are kept apart from SQLite
/// errors so a corrupt row fails loudly instead of being skipped.
fn parse_document(row: &Row) -> rusqlite::Result<Result<Design>> {
    let json: String = row.get(0)?;
    Ok(serde_json::from_str(&json).context("Stored design document is corrupt"))
}
