use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{ImportRunRecord, ProgramInfo};
use crate::model::{Address, Bookmark, Symbol, SymbolKind, SymbolSource};
use crate::target::{TargetError, TargetProgram, TargetResult};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for program database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// The file has a schema but no program was ever initialized in it.
    #[error("No program has been initialized in this database")]
    MissingProgram,

    #[error("Invalid {column} value '{value}' in program database")]
    InvalidValue { column: &'static str, value: String },

    #[error("Failed to encode import summary: {0}")]
    Summary(#[from] serde_json::Error),
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed program database.
///
/// Holds one program's identity plus its annotation state (end-of-line
/// comments, bookmarks, one symbol per address) and a history of imports.
/// Addresses are stored as the bit pattern of the `u64` in an INTEGER column.
#[derive(Debug)]
pub struct ProgramDb {
    conn: Connection,
    info: ProgramInfo,
}

/// SQLite integers are signed; addresses are stored bit-cast, so SQL ordering
/// on this column is not address ordering.
fn to_sql(address: Address) -> i64 {
    address.value() as i64
}

fn from_sql(raw: i64) -> Address {
    Address(raw as u64)
}

impl ProgramDb {
    /// Create (or re-initialize) a program database at `path`.
    ///
    /// Re-initializing replaces the identity row but keeps existing annotations.
    pub fn create(path: &Path, info: &ProgramInfo) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        conn.execute(
            r#"
            INSERT INTO program (id, name, image_base, pointer_size)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                image_base = excluded.image_base,
                pointer_size = excluded.pointer_size
            "#,
            params![info.name, to_sql(info.image_base), info.pointer_size],
        )?;
        Ok(Self { conn, info: info.clone() })
    }

    /// Open an existing program database and ensure the schema is current.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        let info = conn
            .query_row(
                "SELECT name, image_base, pointer_size FROM program WHERE id = 1",
                [],
                |row| {
                    Ok(ProgramInfo {
                        name: row.get(0)?,
                        image_base: from_sql(row.get(1)?),
                        pointer_size: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(DbError::MissingProgram)?;
        Ok(Self { conn, info })
    }

    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    /// Expose a reference to the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// All end-of-line comments, ordered by address.
    pub fn list_comments(&self) -> DbResult<Vec<(Address, String)>> {
        let mut stmt = self.conn.prepare("SELECT address, text FROM comments")?;
        let rows = stmt.query_map([], |row| Ok((from_sql(row.get(0)?), row.get(1)?)))?;

        let mut out: Vec<(Address, String)> = Vec::new();
        for row in rows {
            out.push(row?);
        }
        out.sort_by_key(|(address, _)| *address);
        Ok(out)
    }

    /// All bookmarks, ordered by address then creation.
    pub fn list_bookmarks(&self) -> DbResult<Vec<Bookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT address, category, description FROM bookmarks ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Bookmark {
                address: from_sql(row.get(0)?),
                category: row.get(1)?,
                description: row.get(2)?,
            })
        })?;

        let mut out: Vec<Bookmark> = Vec::new();
        for row in rows {
            out.push(row?);
        }
        // Stable, so creation order survives within one address.
        out.sort_by_key(|bookmark| bookmark.address);
        Ok(out)
    }

    /// All symbols, ordered by address.
    pub fn list_symbols(&self) -> DbResult<Vec<Symbol>> {
        let mut stmt =
            self.conn.prepare("SELECT address, name, kind, source, is_global FROM symbols")?;
        let rows = stmt.query_map([], map_symbol_row)?;

        let mut out: Vec<Symbol> = Vec::new();
        for row in rows {
            out.push(decode_symbol(row?)?);
        }
        out.sort_by_key(|symbol| symbol.address);
        Ok(out)
    }

    /// Seed or overwrite a symbol directly (used when preparing a program).
    pub fn upsert_symbol(&self, symbol: &Symbol) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO symbols (address, name, kind, source, is_global)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(address) DO UPDATE SET
                name = excluded.name,
                kind = excluded.kind,
                source = excluded.source,
                is_global = excluded.is_global
            "#,
            params![
                to_sql(symbol.address),
                symbol.name,
                symbol.kind.as_str(),
                symbol.source.as_str(),
                symbol.global,
            ],
        )?;
        Ok(())
    }

    /// Insert an import run record and return its row id.
    pub fn insert_import_run(&self, record: &ImportRunRecord) -> DbResult<i64> {
        let summary = serde_json::to_string(&record.summary)?;
        self.conn.execute(
            r#"
            INSERT INTO import_runs (source_path, source_hash, started_at, finished_at, summary)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.source_path,
                record.source_hash,
                record.started_at,
                record.finished_at,
                summary
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List all import runs (ordered by id).
    pub fn list_import_runs(&self) -> DbResult<Vec<ImportRunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT source_path, source_hash, started_at, finished_at, summary
            FROM import_runs
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (source_path, source_hash, started_at, finished_at, summary) = row?;
            out.push(ImportRunRecord {
                source_path,
                source_hash,
                started_at,
                finished_at,
                summary: serde_json::from_str(&summary)?,
            });
        }
        Ok(out)
    }
}

type SymbolRow = (i64, String, String, String, bool);

fn map_symbol_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymbolRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode_symbol((address, name, kind, source, global): SymbolRow) -> DbResult<Symbol> {
    let kind = SymbolKind::parse(&kind)
        .ok_or_else(|| DbError::InvalidValue { column: "kind", value: kind.clone() })?;
    let source = SymbolSource::parse(&source)
        .ok_or_else(|| DbError::InvalidValue { column: "source", value: source.clone() })?;
    Ok(Symbol { address: from_sql(address), name, kind, source, global })
}

impl TargetProgram for ProgramDb {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn image_base(&self) -> Address {
        self.info.image_base
    }

    fn address_limit(&self) -> u64 {
        self.info.address_limit()
    }

    fn eol_comment(&self, address: Address) -> TargetResult<Option<String>> {
        let text = self
            .conn
            .query_row(
                "SELECT text FROM comments WHERE address = ?1",
                params![to_sql(address)],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)?;
        Ok(text)
    }

    fn set_eol_comment(&mut self, address: Address, text: &str) -> TargetResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO comments (address, text) VALUES (?1, ?2)
                ON CONFLICT(address) DO UPDATE SET text = excluded.text
                "#,
                params![to_sql(address), text],
            )
            .map_err(DbError::from)?;
        Ok(())
    }

    fn bookmarks(&self, address: Address) -> TargetResult<Vec<Bookmark>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, description FROM bookmarks WHERE address = ?1 ORDER BY id")
            .map_err(DbError::from)?;
        let rows = stmt
            .query_map(params![to_sql(address)], |row| {
                Ok(Bookmark { address, category: row.get(0)?, description: row.get(1)? })
            })
            .map_err(DbError::from)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(DbError::from)?);
        }
        Ok(out)
    }

    fn create_bookmark(
        &mut self,
        address: Address,
        category: &str,
        description: &str,
    ) -> TargetResult<()> {
        self.conn
            .execute(
                "INSERT INTO bookmarks (address, category, description) VALUES (?1, ?2, ?3)",
                params![to_sql(address), category, description],
            )
            .map_err(DbError::from)?;
        Ok(())
    }

    fn symbol(&self, address: Address) -> TargetResult<Option<Symbol>> {
        let row = self
            .conn
            .query_row(
                "SELECT address, name, kind, source, is_global FROM symbols WHERE address = ?1",
                params![to_sql(address)],
                map_symbol_row,
            )
            .optional()
            .map_err(DbError::from)?;
        Ok(row.map(decode_symbol).transpose()?)
    }

    fn rename_symbol(
        &mut self,
        address: Address,
        name: &str,
        source: SymbolSource,
    ) -> TargetResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE symbols SET name = ?2, source = ?3 WHERE address = ?1",
                params![to_sql(address), name, source.as_str()],
            )
            .map_err(DbError::from)?;
        if changed == 0 {
            return Err(TargetError::Rejected {
                address,
                reason: "no symbol to rename".into(),
            });
        }
        Ok(())
    }

    fn create_label(
        &mut self,
        address: Address,
        name: &str,
        source: SymbolSource,
        global: bool,
    ) -> TargetResult<()> {
        let symbol =
            Symbol { address, name: name.to_string(), kind: SymbolKind::Label, source, global };
        self.upsert_symbol(&symbol)?;
        Ok(())
    }

    fn create_function(&mut self, address: Address, name: &str) -> TargetResult<()> {
        let symbol = Symbol::new(address, name, SymbolKind::Function)
            .with_source(SymbolSource::Imported);
        self.upsert_symbol(&symbol)?;
        Ok(())
    }
}

/// Apply schema migrations to bring the DB up to `CURRENT_SCHEMA_VERSION`.
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        // Initial schema.
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS program (
                id           INTEGER PRIMARY KEY CHECK (id = 1),
                name         TEXT NOT NULL,
                image_base   INTEGER NOT NULL,
                pointer_size INTEGER NOT NULL DEFAULT 8
            );

            CREATE TABLE IF NOT EXISTS comments (
                address INTEGER PRIMARY KEY,
                text    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bookmarks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                address     INTEGER NOT NULL,
                category    TEXT NOT NULL,
                description TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS bookmarks_address ON bookmarks (address);

            CREATE TABLE IF NOT EXISTS symbols (
                address   INTEGER PRIMARY KEY,
                name      TEXT NOT NULL,
                kind      TEXT NOT NULL,
                source    TEXT NOT NULL,
                is_global INTEGER NOT NULL DEFAULT 1
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS import_runs (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                source_path TEXT NOT NULL,
                source_hash TEXT,
                started_at  TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                summary     TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
