//! Capability probe for the destination SQLite build.
//!
//! Called once per run, right after the destination connection opens.

use rusqlite::Connection;

/// What the destination SQLite build supports.
#[derive(Debug, Clone)]
pub struct SqliteCapabilities {
    /// JSON1 functions are available.
    pub json1_available: bool,

    /// STRICT tables are available (SQLite ≥ 3.37).
    pub strict_tables_available: bool,

    /// Library version string, e.g. `3.45.1`.
    pub version: String,
}

/// Probe the connection's compile-time options and version.
pub fn probe(conn: &Connection) -> rusqlite::Result<SqliteCapabilities> {
    let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;

    let mut json1_available = {
        let mut stmt = conn.prepare("PRAGMA compile_options")?;
        let options = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut found = false;
        for option in options {
            if option?.contains("ENABLE_JSON1") {
                found = true;
                break;
            }
        }
        found
    };

    // JSON1 is built in (and no longer a listed compile option) since 3.38;
    // probing an actual JSON call settles it either way.
    if !json1_available {
        json1_available = conn
            .query_row("SELECT json_valid('{}')", [], |row| row.get::<_, i64>(0))
            .is_ok();
    }

    let strict_tables_available = version_at_least(&version, 3, 37);

    Ok(SqliteCapabilities {
        json1_available,
        strict_tables_available,
        version,
    })
}

fn version_at_least(version: &str, major: u32, minor: u32) -> bool {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let have_major = parts.next().unwrap_or(0);
    let have_minor = parts.next().unwrap_or(0);
    (have_major, have_minor) >= (major, minor)
}
